//! Flat, name-keyed view of an automaton, shared by the JSON record, the DOT
//! renderer and the structural comparator.

use crate::automata::{Dfa, MinimizedDfa, Nfa, StateId};
use crate::error::RecordError;
use derive_getters::Getters;
use either::Either;
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt::{Display, Formatter};

const STARTING_STATE: &str = "startingState";
const IS_TERMINATING_STATE: &str = "isTerminatingState";

/// One target (`Left`) or an ordered list of targets (`Right`).
pub type Targets = Either<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct StateTable {
    start: String,
    accepting: BTreeSet<String>,
    /// Outgoing transitions per state, in listing order.
    states: IndexMap<String, IndexMap<String, Targets>>,
}

/// Anything that can be exported as a [`StateTable`].
pub trait StateMachine {
    fn state_table(&self) -> StateTable;
}

impl StateTable {
    pub fn new(start: impl Into<String>) -> Self {
        Self { start: start.into(), accepting: BTreeSet::new(), states: IndexMap::new() }
    }

    /// Adds `name` (or updates its acceptance) and returns its transitions.
    pub fn insert_state(&mut self, name: impl Into<String>, accepting: bool) -> &mut IndexMap<String, Targets> {
        let name = name.into();
        if accepting {
            self.accepting.insert(name.clone());
        } else {
            self.accepting.remove(&name);
        }
        self.states.entry(name).or_default()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Unknown states are not accepting.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accepting.contains(state)
    }

    /// Outgoing symbols of `state`, sorted. Empty for unknown states.
    pub fn symbols(&self, state: &str) -> BTreeSet<&str> {
        self.states.get(state).map(|t| t.keys().map(String::as_str).collect()).unwrap_or_default()
    }

    /// Targets of `state` on `symbol` in listing order.
    pub fn targets(&self, state: &str, symbol: &str) -> Vec<&str> {
        match self.states.get(state).and_then(|t| t.get(symbol)) {
            Some(Either::Left(target)) => vec![target.as_str()],
            Some(Either::Right(targets)) => targets.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Reads a record. A missing `isTerminatingState` means not accepting.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let Value::Object(record) = value else {
            return Err(RecordError::NotAnObject);
        };
        let Some(Value::String(start)) = record.get(STARTING_STATE) else {
            return Err(RecordError::MissingStart);
        };

        let mut table = StateTable::new(start.clone());
        for (name, entry) in record.iter().filter(|(key, _)| key.as_str() != STARTING_STATE) {
            let invalid_state = || RecordError::InvalidState { state: name.clone() };
            let Value::Object(entry) = entry else {
                return Err(invalid_state());
            };
            let accepting = match entry.get(IS_TERMINATING_STATE) {
                None => false,
                Some(Value::Bool(accepting)) => *accepting,
                Some(_) => return Err(invalid_state()),
            };

            let transitions = table.insert_state(name.clone(), accepting);
            for (symbol, target) in entry.iter().filter(|(key, _)| key.as_str() != IS_TERMINATING_STATE) {
                let targets = parse_targets(target)
                    .ok_or_else(|| RecordError::InvalidTarget { state: name.clone(), symbol: symbol.clone() })?;
                transitions.insert(symbol.clone(), targets);
            }
        }

        Ok(table)
    }

    /// Graphviz rendering: left to right, accepting states double-circled,
    /// and an unlabeled entry node pointing at the start state.
    pub fn to_dot(&self) -> String {
        Dot(self).to_string()
    }
}

fn parse_targets(value: &Value) -> Option<Targets> {
    match value {
        Value::String(target) => Some(Either::Left(target.clone())),
        Value::Array(targets) => targets
            .iter()
            .map(|t| t.as_str().map(str::to_owned))
            .collect::<Option<Vec<_>>>()
            .map(Either::Right),
        _ => None,
    }
}

impl Serialize for StateTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.states.len() + 1))?;
        map.serialize_entry(STARTING_STATE, &self.start)?;
        for (name, transitions) in &self.states {
            map.serialize_entry(name, &StateRecord { accepting: self.is_accepting(name), transitions })?;
        }
        map.end()
    }
}

struct StateRecord<'a> {
    accepting: bool,
    transitions: &'a IndexMap<String, Targets>,
}

impl Serialize for StateRecord<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.transitions.len() + 1))?;
        map.serialize_entry(IS_TERMINATING_STATE, &self.accepting)?;
        for (symbol, targets) in self.transitions {
            match targets {
                Either::Left(target) => map.serialize_entry(symbol, target)?,
                Either::Right(targets) => map.serialize_entry(symbol, targets)?,
            }
        }
        map.end()
    }
}

struct Dot<'a>(&'a StateTable);

/// Quotes a DOT identifier.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Display for Dot<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let table = self.0;
        writeln!(f, "digraph {{")?;
        writeln!(f, "    rankdir=LR;")?;
        writeln!(f, "    __start [shape=none, label=\"\"];")?;
        for name in table.states.keys() {
            let shape = if table.is_accepting(name) { "doublecircle" } else { "circle" };
            writeln!(f, "    {} [shape={shape}];", quoted(name))?;
        }
        writeln!(f, "    __start -> {};", quoted(&table.start))?;
        for (name, transitions) in &table.states {
            for symbol in transitions.keys() {
                for target in table.targets(name, symbol) {
                    writeln!(f, "    {} -> {} [label={}];", quoted(name), quoted(target), quoted(symbol))?;
                }
            }
        }
        writeln!(f, "}}")
    }
}

impl StateMachine for Nfa {
    /// States are listed breadth-first from the start state; states the start
    /// cannot reach are left out.
    fn state_table(&self) -> StateTable {
        let mut table = StateTable::new(self.start().to_string());
        let mut seen = HashSet::from([*self.start()]);
        let mut queue = VecDeque::from([*self.start()]);

        while let Some(id) = queue.pop_front() {
            let Some(state) = self.state(id) else {
                continue;
            };
            let transitions = table.insert_state(id.to_string(), id == *self.terminal());
            for (symbol, targets) in state.transitions() {
                transitions.insert(symbol.to_string(), Either::Right(targets.iter().map(StateId::to_string).collect()));
                queue.extend(targets.iter().filter(|&&t| seen.insert(t)));
            }
        }

        table
    }
}

impl StateMachine for Dfa {
    fn state_table(&self) -> StateTable {
        let start = self.start_state().map(|s| s.name().clone()).unwrap_or_default();
        let mut table = StateTable::new(start);

        for state in self.states() {
            let transitions = table.insert_state(state.name().clone(), *state.accepting());
            for (symbol, &target) in state.transitions() {
                transitions.insert(symbol.to_string(), Either::Left(self.states()[target].name().clone()));
            }
        }

        table
    }
}

impl StateMachine for MinimizedDfa {
    fn state_table(&self) -> StateTable {
        self.dfa().state_table()
    }
}
