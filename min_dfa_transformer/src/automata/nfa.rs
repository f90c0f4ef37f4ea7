use crate::automata::{StateId, Symbol};
use crate::error::Result;
use crate::regex::{evaluate_postfix, infix_to_postfix, PostfixCompiler, PostfixToken, Variable};
use derive_getters::Getters;
use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};

#[derive(Clone, Getters)]
pub struct NfaState {
    id: StateId,
    /// Successors per symbol, in the order the edges were added.
    transitions: IndexMap<Symbol, Vec<StateId>>,
}

impl NfaState {
    fn new(id: StateId) -> Self {
        Self { id, transitions: IndexMap::new() }
    }

    fn add_transition(&mut self, symbol: Symbol, target: StateId) {
        self.transitions.entry(symbol).or_default().push(target)
    }

    pub fn targets(&self, symbol: Symbol) -> &[StateId] {
        self.transitions.get(&symbol).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Debug for NfaState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (symbol, targets) in &self.transitions {
            for target in targets {
                writeln!(f, "    {symbol} -> {target}")?;
            }
        }

        Ok(())
    }
}

/// A partial automaton with one entry and one exit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct Fragment {
    start: StateId,
    end: StateId,
}

/// A Thompson NFA: the arena of every state created during one build plus the
/// start and terminal states of the final fragment.
#[derive(Clone, Getters)]
pub struct Nfa {
    states: Vec<NfaState>,
    /// Id of `states[0]`; ids are dense from here.
    first_id: usize,
    start: StateId,
    terminal: StateId,
}

impl Debug for Nfa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "start: {}, terminal: {}", self.start, self.terminal)?;
        for state in &self.states {
            writeln!(f, "{}:", state.id)?;
            write!(f, "{state:?}")?;
        }

        Ok(())
    }
}

impl Nfa {
    pub fn state(&self, id: StateId) -> Option<&NfaState> {
        id.0.checked_sub(self.first_id).and_then(|i| self.states.get(i))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn fragment(&self) -> Fragment {
        Fragment { start: self.start, end: self.terminal }
    }

    /// Every non-ε symbol used on some edge.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.states
            .iter()
            .flat_map(|s| s.transitions.keys())
            .filter_map(|symbol| match symbol {
                Symbol::Char(c) => Some(*c),
                Symbol::Epsilon => None,
            })
            .collect()
    }

    /// States reachable from `states` through ε-edges only, `states` included.
    pub fn epsilon_closure(&self, states: impl IntoIterator<Item = StateId>) -> BTreeSet<StateId> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<StateId> = states.into_iter().collect();

        while let Some(id) = stack.pop() {
            if !closure.insert(id) {
                continue;
            }
            if let Some(state) = self.state(id) {
                stack.extend(state.targets(Symbol::Epsilon).iter().filter(|t| !closure.contains(*t)));
            }
        }

        closure
    }

    /// ε-closure of the states reached from `states` on `c`.
    pub fn step(&self, states: &BTreeSet<StateId>, c: char) -> BTreeSet<StateId> {
        let reached = states
            .iter()
            .filter_map(|&id| self.state(id))
            .flat_map(|state| state.targets(Symbol::Char(c)).iter().copied());
        self.epsilon_closure(reached)
    }

    /// Simulates the automaton on `input`.
    pub fn accepts(&self, input: &str) -> bool {
        let mut current = self.epsilon_closure([self.start]);
        for c in input.chars() {
            if current.is_empty() {
                return false;
            }
            current = self.step(&current, c);
        }
        current.contains(&self.terminal)
    }
}

/// Thompson construction over a postfix pattern.
///
/// Each builder owns its id counter, so independent builds never share ids
/// unless they are given overlapping offsets.
pub struct NfaBuilder {
    first_id: usize,
    states: Vec<NfaState>,
}

impl Default for NfaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NfaBuilder {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Starts numbering states at `offset` instead of 0.
    pub fn with_offset(offset: usize) -> Self {
        Self { first_id: offset, states: Vec::new() }
    }

    pub fn build(self, pattern: &str) -> Result<Nfa> {
        let postfix = infix_to_postfix(pattern)?;
        self.build_postfix(pattern, &postfix)
    }

    pub fn build_postfix(mut self, pattern: &str, postfix: &[PostfixToken]) -> Result<Nfa> {
        let fragment = evaluate_postfix(&mut self, pattern, postfix)?;
        debug!("built NFA for {pattern:?} with {} states", self.states.len());

        Ok(Nfa {
            states: self.states,
            first_id: self.first_id,
            start: fragment.start,
            terminal: fragment.end,
        })
    }

    fn create_state(&mut self) -> StateId {
        let id = StateId(self.first_id + self.states.len());
        self.states.push(NfaState::new(id));
        id
    }

    fn connect(&mut self, from: StateId, symbol: Symbol, to: StateId) {
        self.states[from.0 - self.first_id].add_transition(symbol, to);
    }

    /// `S0 --c--> Se`
    fn compile_char(&mut self, c: char) -> Fragment {
        let start = self.create_state();
        let end = self.create_state();
        self.connect(start, Symbol::Char(c), end);
        Fragment { start, end }
    }
}

impl PostfixCompiler for NfaBuilder {
    type Fragment = Fragment;

    /// Ranges become an alternation chain over their characters, folded left.
    fn compile_variable(&mut self, variable: Variable) -> Fragment {
        let chars = variable.chars();
        let mut fragment = self.compile_char(*chars.start());
        for c in chars.skip(1) {
            let next = self.compile_char(c);
            fragment = self.compile_alternation(fragment, next);
        }
        fragment
    }

    fn compile_zero_or_more(&mut self, inner: Fragment) -> Fragment {
        let start = self.create_state();
        let end = self.create_state();
        self.connect(start, Symbol::Epsilon, inner.start);
        self.connect(start, Symbol::Epsilon, end);
        self.connect(inner.end, Symbol::Epsilon, start);
        self.connect(inner.end, Symbol::Epsilon, end);
        Fragment { start, end }
    }

    fn compile_one_or_more(&mut self, inner: Fragment) -> Fragment {
        let start = self.create_state();
        let end = self.create_state();
        self.connect(start, Symbol::Epsilon, inner.start);
        self.connect(inner.end, Symbol::Epsilon, start);
        self.connect(inner.end, Symbol::Epsilon, end);
        Fragment { start, end }
    }

    fn compile_zero_or_one(&mut self, inner: Fragment) -> Fragment {
        let start = self.create_state();
        let end = self.create_state();
        self.connect(start, Symbol::Epsilon, inner.start);
        self.connect(start, Symbol::Epsilon, end);
        self.connect(inner.end, Symbol::Epsilon, end);
        Fragment { start, end }
    }

    /// The left end stays in the graph but stops being a terminal.
    fn compile_concat(&mut self, left: Fragment, right: Fragment) -> Fragment {
        self.connect(left.end, Symbol::Epsilon, right.start);
        Fragment { start: left.start, end: right.end }
    }

    fn compile_alternation(&mut self, left: Fragment, right: Fragment) -> Fragment {
        let start = self.create_state();
        let end = self.create_state();
        self.connect(start, Symbol::Epsilon, left.start);
        self.connect(start, Symbol::Epsilon, right.start);
        self.connect(left.end, Symbol::Epsilon, end);
        self.connect(right.end, Symbol::Epsilon, end);
        Fragment { start, end }
    }
}
