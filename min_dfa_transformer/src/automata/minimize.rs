//! Partition refinement over DFA states.

use crate::automata::{dfa_state_name, Dfa, DfaState};
use derive_getters::Getters;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, trace};
use std::collections::BTreeSet;

/// A DFA with no two indistinguishable states, together with the states of
/// the source DFA that each of its states absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MinimizedDfa {
    dfa: Dfa,
    /// Source DFA state indices per minimized state, indexed like `dfa`.
    blocks: Vec<BTreeSet<usize>>,
}

impl MinimizedDfa {
    pub fn len(&self) -> usize {
        self.dfa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dfa.is_empty()
    }

    pub fn accepts(&self, input: &str) -> bool {
        self.dfa.accepts(input)
    }

    /// Index of the minimized state that absorbed source state `state`.
    pub fn block_of(&self, state: usize) -> Option<usize> {
        self.blocks.iter().position(|block| block.contains(&state))
    }
}

/// Minimizes `dfa` by Moore-style refinement.
///
/// The partition starts as {accepting, non-accepting} and is split until two
/// states share a block only if, for every symbol used inside that block,
/// their successors lie in the same block (or both are missing). Unreachable
/// states are kept and partitioned like any other.
///
/// Blocks are numbered by their smallest member, so the block holding the
/// source start state `0` is always `S1`. A DFA with no states becomes a
/// single non-accepting state with no transitions.
pub fn minimize(dfa: &Dfa) -> MinimizedDfa {
    if dfa.is_empty() {
        let state = DfaState::new(dfa_state_name(0), BTreeSet::new(), false);
        return MinimizedDfa { dfa: Dfa::from_states(vec![state], 0), blocks: vec![BTreeSet::new()] };
    }

    let (accepting, rejecting): (BTreeSet<usize>, BTreeSet<usize>) =
        (0..dfa.len()).partition(|&i| *dfa.states()[i].accepting());
    let mut partition = [accepting, rejecting].into_iter().filter(|b| !b.is_empty()).collect_vec();

    let mut rounds = 0;
    loop {
        rounds += 1;
        let refined = refine(dfa, &partition);
        if refined == partition {
            break;
        }
        partition = refined;
    }
    partition.sort_by_key(|block| block.first().copied());

    let block_of = block_index(&partition, dfa.len());
    let states = partition
        .iter()
        .enumerate()
        .map(|(i, block)| {
            let subset = block.iter().flat_map(|&s| dfa.states()[s].subset().iter().copied()).collect();
            let accepting = block.iter().any(|&s| *dfa.states()[s].accepting());
            let mut state = DfaState::new(dfa_state_name(i), subset, accepting);
            if let Some(&representative) = block.first() {
                for (&c, &target) in dfa.states()[representative].transitions() {
                    state.set_transition(c, block_of[target]);
                }
            }
            state
        })
        .collect_vec();

    debug!("minimized {} DFA states to {} in {rounds} refinement rounds", dfa.len(), states.len());

    MinimizedDfa { dfa: Dfa::from_states(states, block_of[*dfa.start()]), blocks: partition }
}

/// Block index of every state under `partition`.
fn block_index(partition: &[BTreeSet<usize>], len: usize) -> Vec<usize> {
    let mut block_of = vec![0; len];
    for (i, block) in partition.iter().enumerate() {
        for &state in block {
            block_of[state] = i;
        }
    }
    block_of
}

/// One refinement round: splits every block by transition signature.
fn refine(dfa: &Dfa, partition: &[BTreeSet<usize>]) -> Vec<BTreeSet<usize>> {
    let block_of = block_index(partition, dfa.len());
    let mut refined = Vec::with_capacity(partition.len());

    for block in partition {
        let symbols: BTreeSet<char> =
            block.iter().flat_map(|&s| dfa.states()[s].transitions().keys().copied()).collect();

        let mut groups: IndexMap<Vec<Option<usize>>, BTreeSet<usize>> = IndexMap::new();
        for &state in block {
            let signature = symbols.iter().map(|&c| dfa.transition(state, c).map(|t| block_of[t])).collect();
            groups.entry(signature).or_default().insert(state);
        }

        if groups.len() > 1 {
            trace!("split block {:?} into {:?}", block, groups.values().collect_vec());
        }
        refined.extend(groups.into_values());
    }

    refined
}
