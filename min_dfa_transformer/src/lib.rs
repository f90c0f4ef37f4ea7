//! Compiles patterns into minimal DFAs.
//!
//! A pattern is rewritten into postfix form ([`regex`]), turned into a
//! Thompson NFA, determinised by subset construction and minimized by
//! partition refinement ([`automata`]). Each stage can be exported as a
//! [`StateTable`] for JSON or Graphviz output.

use crate::automata::{minimize, Dfa, MinimizedDfa, Nfa, NfaBuilder};
use derive_getters::Getters;

pub mod automata;
mod codegen;
pub mod compare;
pub mod error;
pub mod regex;
pub mod table;

pub use crate::regex::{infix_to_postfix, to_regex_syntax};
pub use compare::structurally_equivalent;
pub use error::{Malformation, PatternError, RecordError, Result};
pub use table::{StateMachine, StateTable};

pub fn to_nfa(pattern: &str) -> Result<Nfa> {
    NfaBuilder::new().build(pattern)
}

pub fn to_dfa(pattern: &str) -> Result<Dfa> {
    Ok(Dfa::from_nfa(&to_nfa(pattern)?))
}

pub fn to_minimized_dfa(pattern: &str) -> Result<MinimizedDfa> {
    Ok(minimize(&to_dfa(pattern)?))
}

/// Every stage's output for one pattern.
#[derive(Debug, Clone, Getters)]
pub struct Pipeline {
    nfa: Nfa,
    dfa: Dfa,
    minimized: MinimizedDfa,
}

impl Pipeline {
    pub fn run(pattern: &str) -> Result<Self> {
        let nfa = to_nfa(pattern)?;
        let dfa = Dfa::from_nfa(&nfa);
        let minimized = minimize(&dfa);
        Ok(Self { nfa, dfa, minimized })
    }
}
