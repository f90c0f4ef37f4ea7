//! Automaton structures for each pipeline stage.
//!
//! States live in arenas (`Vec`s) and refer to each other by id or index, so
//! the cyclic graphs produced by `*` and `+` never need shared ownership.

use std::fmt::{Display, Formatter};

mod dfa;
mod minimize;
mod nfa;

pub use dfa::{subset_label, Dfa, DfaState};
pub use minimize::{minimize, MinimizedDfa};
pub use nfa::{Fragment, Nfa, NfaBuilder, NfaState};

/// Identifier of an NFA state, rendered as `S<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub usize);

impl Display for StateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Label of an ε-edge in exported tables. Patterns may not use it as a
/// literal, so exported keys never collide.
pub const EPSILON: char = 'ε';

/// An edge label of the NFA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "{EPSILON}"),
            Symbol::Char(c) => write!(f, "{c}"),
        }
    }
}

/// Name given to the state at `index` of a deterministic automaton.
pub(crate) fn dfa_state_name(index: usize) -> String {
    format!("S{}", index + 1)
}
