//! Subset construction.

use crate::automata::{dfa_state_name, Nfa, StateId, Symbol};
use derive_getters::Getters;
use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Canonical name of a set of NFA states: member labels in id order joined by
/// `_`, e.g. `S0_S2_S5`.
pub fn subset_label(subset: &BTreeSet<StateId>) -> String {
    subset.iter().join("_")
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct DfaState {
    name: String,
    /// NFA states this state stands for. Empty for hand-built automata.
    subset: BTreeSet<StateId>,
    accepting: bool,
    /// Successor state index per symbol. Missing symbols reject.
    transitions: BTreeMap<char, usize>,
}

impl DfaState {
    pub(crate) fn new(name: String, subset: BTreeSet<StateId>, accepting: bool) -> Self {
        Self { name, subset, accepting, transitions: BTreeMap::new() }
    }

    pub(crate) fn set_transition(&mut self, symbol: char, target: usize) {
        self.transitions.insert(symbol, target);
    }
}

/// A deterministic automaton. States are addressed by index into `states`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct Dfa {
    states: Vec<DfaState>,
    start: usize,
}

impl Dfa {
    pub(crate) fn from_states(states: Vec<DfaState>, start: usize) -> Self {
        Self { states, start }
    }

    /// Converts an NFA by subset construction.
    ///
    /// States are discovered breadth-first from the ε-closure of the NFA start
    /// state and named `S1`, `S2`, ... in discovery order.
    pub fn from_nfa(nfa: &Nfa) -> Self {
        let mut dfa = SubsetConstruction::new(nfa).run();
        dfa.rename_states();
        debug!("subset construction produced {} DFA states from {} NFA states", dfa.len(), nfa.len());
        dfa
    }

    /// Builds an automaton from named edges. States are indexed in order of
    /// first mention, starting with `start`. A repeated `(state, symbol)`
    /// pair keeps the last target.
    pub fn from_table(start: &str, accepting: &[&str], edges: &[(&str, char, &str)]) -> Self {
        let mut indices: IndexMap<&str, usize> = IndexMap::new();
        let names = std::iter::once(start)
            .chain(edges.iter().flat_map(|&(from, _, to)| [from, to]))
            .chain(accepting.iter().copied());
        for name in names {
            let next = indices.len();
            indices.entry(name).or_insert(next);
        }

        let mut states = indices
            .keys()
            .map(|name| DfaState::new(name.to_string(), BTreeSet::new(), accepting.contains(name)))
            .collect_vec();
        for &(from, symbol, to) in edges {
            states[indices[from]].set_transition(symbol, indices[to]);
        }

        Dfa { states, start: 0 }
    }

    /// Replaces subset labels by `S1`, `S2`, ... in index order.
    fn rename_states(&mut self) {
        for (index, state) in self.states.iter_mut().enumerate() {
            state.name = dfa_state_name(index);
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<&DfaState> {
        self.states.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }

    pub fn start_state(&self) -> Option<&DfaState> {
        self.states.get(self.start)
    }

    pub fn accepting_states(&self) -> BTreeSet<&str> {
        self.states.iter().filter(|s| s.accepting).map(|s| s.name.as_str()).collect()
    }

    pub fn alphabet(&self) -> BTreeSet<char> {
        self.states.iter().flat_map(|s| s.transitions.keys().copied()).collect()
    }

    pub fn transition(&self, state: usize, symbol: char) -> Option<usize> {
        self.states.get(state)?.transitions.get(&symbol).copied()
    }

    /// Walks the automaton over `input`; a missing transition rejects.
    pub fn accepts(&self, input: &str) -> bool {
        let Some(mut state) = self.start_state().map(|_| self.start) else {
            return false;
        };
        for c in input.chars() {
            match self.transition(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.states[state].accepting
    }
}

/// Worklist state of one subset construction run.
struct SubsetConstruction<'a> {
    nfa: &'a Nfa,
    states: Vec<DfaState>,
    indices: HashMap<BTreeSet<StateId>, usize>,
    queue: VecDeque<usize>,
}

impl<'a> SubsetConstruction<'a> {
    fn new(nfa: &'a Nfa) -> Self {
        Self { nfa, states: Vec::new(), indices: HashMap::new(), queue: VecDeque::new() }
    }

    /// Index of the DFA state for `subset`, creating and enqueueing it the
    /// first time the subset is seen.
    fn discover(&mut self, subset: BTreeSet<StateId>) -> usize {
        if let Some(&index) = self.indices.get(&subset) {
            return index;
        }
        let index = self.states.len();
        let accepting = subset.contains(self.nfa.terminal());
        trace!("discovered DFA state {index} = {{{}}}, accepting: {accepting}", subset_label(&subset));
        self.indices.insert(subset.clone(), index);
        self.states.push(DfaState::new(subset_label(&subset), subset, accepting));
        self.queue.push_back(index);
        index
    }

    /// Union of non-ε successors of every member of state `index`, per symbol.
    fn moves(&self, index: usize) -> BTreeMap<char, BTreeSet<StateId>> {
        let mut moves: BTreeMap<char, BTreeSet<StateId>> = BTreeMap::new();
        for state in self.states[index].subset.iter().filter_map(|&id| self.nfa.state(id)) {
            for (symbol, targets) in state.transitions() {
                if let Symbol::Char(c) = symbol {
                    moves.entry(*c).or_default().extend(targets.iter().copied());
                }
            }
        }
        moves
    }

    fn run(mut self) -> Dfa {
        let start = self.discover(self.nfa.epsilon_closure([*self.nfa.start()]));

        while let Some(index) = self.queue.pop_front() {
            for (c, targets) in self.moves(index) {
                let target = self.discover(self.nfa.epsilon_closure(targets));
                self.states[index].set_transition(c, target);
            }
        }

        Dfa { states: self.states, start }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::NfaBuilder;

    fn dfa_for(pattern: &str) -> Dfa {
        Dfa::from_nfa(&NfaBuilder::new().build(pattern).unwrap())
    }

    #[test]
    fn single_literal_has_two_states() {
        let dfa = dfa_for("a");
        assert_eq!(dfa.len(), 2);
        assert_eq!(dfa.start_state().unwrap().name(), "S1");
        assert_eq!(dfa.transition(0, 'a'), Some(1));
        assert_eq!(dfa.accepting_states(), BTreeSet::from(["S2"]));
    }

    #[test]
    fn alternation_branches_stay_separate_subsets() {
        // {S1,S5} and {S3,S5} differ, so each branch gets its own accepting
        // state until minimization merges them.
        let dfa = dfa_for("a|b");
        assert_eq!(dfa.len(), 3);
        assert_eq!(dfa.transition(0, 'a'), Some(1));
        assert_eq!(dfa.transition(0, 'b'), Some(2));
        assert!(!*dfa.state(0).unwrap().accepting());
        assert_eq!(dfa.accepting_states(), BTreeSet::from(["S2", "S3"]));
    }

    #[test]
    fn star_start_is_accepting_with_self_loop() {
        let dfa = dfa_for("a*");
        let start = dfa.start_state().unwrap();
        assert!(*start.accepting());
        let next = dfa.transition(*dfa.start(), 'a').unwrap();
        assert_eq!(dfa.transition(next, 'a'), Some(next));
        assert!(dfa.accepts(""));
        assert!(dfa.accepts("aaaa"));
        assert!(!dfa.accepts("ab"));
    }

    #[test]
    fn textbook_subset_construction() {
        let dfa = dfa_for("(a|b)*abb");
        assert_eq!(dfa.len(), 5);
        assert_eq!(dfa.accepting_states().len(), 1);
        assert!(dfa.accepts("abb"));
        assert!(dfa.accepts("aababb"));
        assert!(!dfa.accepts("abba"));
    }

    #[test]
    fn subsets_are_distinct_and_labelled_canonically() {
        let nfa = NfaBuilder::new().build("a?(a+b)*b").unwrap();
        let dfa = Dfa::from_nfa(&nfa);
        let subsets: BTreeSet<_> = dfa.states().iter().map(|s| s.subset().clone()).collect();
        assert_eq!(subsets.len(), dfa.len());
        assert!(dfa.states().iter().all(|s| !s.subset().is_empty()));

        let start = dfa.start_state().unwrap();
        assert_eq!(start.subset(), &nfa.epsilon_closure([*nfa.start()]));
        assert_eq!(subset_label(&BTreeSet::from([StateId(10), StateId(2)])), "S2_S10");
    }

    #[test]
    fn construction_is_reproducible() {
        assert_eq!(dfa_for("[a-c]+x|y*"), dfa_for("[a-c]+x|y*"));
    }

    #[test]
    fn from_table_indexes_by_first_mention() {
        let dfa = Dfa::from_table("p", &["r"], &[("p", 'a', "q"), ("q", 'b', "r"), ("x", 'a', "r")]);
        assert_eq!(dfa.len(), 4);
        assert_eq!(dfa.index_of("x"), Some(3));
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("a"));
    }

    #[test]
    fn empty_automaton_rejects_everything() {
        let dfa = Dfa::default();
        assert!(dfa.is_empty());
        assert!(!dfa.accepts(""));
    }
}
