use thiserror::Error;

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors raised while turning a pattern into an automaton.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("malformed pattern {pattern:?}: {kind}")]
    Malformed { pattern: String, kind: Malformation },
    #[error("invalid range `{start}-{end}` at index {position} of pattern {pattern:?}: start is after end")]
    InvalidRange {
        pattern: String,
        position: usize,
        start: char,
        end: char,
    },
}

impl PatternError {
    pub(crate) fn malformed(pattern: &str, kind: Malformation) -> Self {
        PatternError::Malformed { pattern: pattern.to_owned(), kind }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, PatternError::Malformed { .. })
    }

    pub fn pattern(&self) -> &str {
        match self {
            PatternError::Malformed { pattern, .. } => pattern,
            PatternError::InvalidRange { pattern, .. } => pattern,
        }
    }
}

/// What made a pattern malformed. Positions are character indices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformation {
    #[error("unmatched `{delimiter}` at index {position}")]
    UnmatchedClose { delimiter: char, position: usize },
    #[error("`{delimiter}` at index {position} is never closed")]
    UnclosedGroup { delimiter: char, position: usize },
    #[error("`{open}` at index {open_position} is closed by `{close}` at index {position}")]
    MismatchedDelimiter {
        open: char,
        open_position: usize,
        close: char,
        position: usize,
    },
    #[error("empty group `{open}{close}` at index {position}")]
    EmptyGroup { open: char, close: char, position: usize },
    #[error("operator `{operator}` is missing an operand")]
    MissingOperand { operator: char },
    #[error("{count} fragments left after evaluation, expected one")]
    DanglingOperands { count: usize },
    #[error("pattern is empty")]
    EmptyPattern,
    #[error("`{symbol}` at index {position} is reserved for ε-edges")]
    ReservedSymbol { symbol: char, position: usize },
    #[error("unexpected input at index {position}")]
    UnexpectedInput { position: usize },
}

/// Errors raised while reading an automaton record back from JSON.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no string `startingState`")]
    MissingStart,
    #[error("state {state:?} is not an object with a boolean `isTerminatingState`")]
    InvalidState { state: String },
    #[error("transition of state {state:?} on {symbol:?} is neither a state name nor a list of names")]
    InvalidTarget { state: String, symbol: String },
}
