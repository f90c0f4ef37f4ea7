//! Pattern parser: tokenizes a pattern and rewrites it into postfix order.
//!
//! The accepted syntax is literal characters, concatenation, `|`, the postfix
//! operators `*`, `+` and `?`, grouping with `()` and bracket classes `[...]`.
//! `_` is an explicit concatenation operator and `.` is an ordinary literal.
//! `x-y` between two literals is a range that stands for every character from
//! `x` to `y` inclusive.

use crate::automata::EPSILON;
use crate::error::{Malformation, PatternError, Result};
use derive_getters::Getters;
use itertools::Itertools;
use log::{debug, trace};
use nom::branch::alt;
use nom::character::complete::char as cchar;
use nom::character::complete::{anychar, none_of};
use nom::combinator::{map, map_opt};
use nom::sequence::separated_pair;
use nom::IResult;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

type NResult<'a, T> = IResult<&'a str, T>;

/// Characters that may not be either end of a range.
const NOT_RANGE_ENDPOINT: &str = "()[]*+?_|-";

/// A literal operand: a single character or an inclusive character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Char(char),
    Range(char, char),
}

impl Variable {
    /// Every character this operand stands for, in ascending order.
    pub fn chars(&self) -> RangeInclusive<char> {
        match *self {
            Variable::Char(c) => c..=c,
            Variable::Range(start, end) => start..=end,
        }
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Char(c) => write!(f, "{c}"),
            Variable::Range(start, end) => write!(f, "{start}-{end}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    OpenGroup,
    CloseGroup,
    OpenClass,
    CloseClass,
    Star,
    Plus,
    Optional,
    Concat,
    Alternate,
}

impl Operator {
    pub const fn symbol(self) -> char {
        match self {
            Operator::OpenGroup => '(',
            Operator::CloseGroup => ')',
            Operator::OpenClass => '[',
            Operator::CloseClass => ']',
            Operator::Star => '*',
            Operator::Plus => '+',
            Operator::Optional => '?',
            Operator::Concat => '_',
            Operator::Alternate => '|',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        Some(match c {
            '(' => Operator::OpenGroup,
            ')' => Operator::CloseGroup,
            '[' => Operator::OpenClass,
            ']' => Operator::CloseClass,
            '*' => Operator::Star,
            '+' => Operator::Plus,
            '?' => Operator::Optional,
            '_' => Operator::Concat,
            '|' => Operator::Alternate,
            _ => return None,
        })
    }

    /// Binding strength; lower binds looser. Openers are barriers that no
    /// other operator outranks.
    const fn precedence(self) -> i32 {
        match self {
            Operator::Star => -1,
            Operator::Plus => -2,
            Operator::Optional => -3,
            Operator::Concat => -4,
            Operator::Alternate => -5,
            Operator::OpenGroup | Operator::OpenClass => -100,
            Operator::CloseGroup | Operator::CloseClass => -100,
        }
    }

    const fn is_opener(self) -> bool {
        matches!(self, Operator::OpenGroup | Operator::OpenClass)
    }

    const fn is_closer(self) -> bool {
        matches!(self, Operator::CloseGroup | Operator::CloseClass)
    }

    const fn closer(self) -> Option<Operator> {
        match self {
            Operator::OpenGroup => Some(Operator::CloseGroup),
            Operator::OpenClass => Some(Operator::CloseClass),
            _ => None,
        }
    }

    fn as_postfix(self) -> Option<PostfixToken> {
        Some(match self {
            Operator::Star => PostfixToken::Star,
            Operator::Plus => PostfixToken::Plus,
            Operator::Optional => PostfixToken::Optional,
            Operator::Concat => PostfixToken::Concat,
            Operator::Alternate => PostfixToken::Alternate,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Variable(Variable),
    Operator(Operator),
}

/// One infix token together with the character index it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct Token {
    kind: TokenKind,
    position: usize,
}

impl Token {
    fn operator(operator: Operator, position: usize) -> Self {
        Token { kind: TokenKind::Operator(operator), position }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, TokenKind::Variable(_))
    }

    fn is_operator(&self, operator: Operator) -> bool {
        self.kind == TokenKind::Operator(operator)
    }

    /// True for tokens after which an operand has just ended.
    fn ends_operand(&self) -> bool {
        match self.kind {
            TokenKind::Variable(_) => true,
            TokenKind::Operator(op) => matches!(
                op,
                Operator::CloseGroup | Operator::CloseClass | Operator::Star | Operator::Plus | Operator::Optional
            ),
        }
    }

    /// True for tokens that start a new operand.
    fn begins_operand(&self) -> bool {
        match self.kind {
            TokenKind::Variable(_) => true,
            TokenKind::Operator(op) => op.is_opener(),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Variable(v) => write!(f, "{v}"),
            TokenKind::Operator(op) => write!(f, "{}", op.symbol()),
        }
    }
}

/// A token of the postfix form. Grouping never survives into postfix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixToken {
    Literal(Variable),
    Star,
    Plus,
    Optional,
    Concat,
    Alternate,
}

impl PostfixToken {
    /// The operator character, `None` for literals.
    pub fn symbol(&self) -> Option<char> {
        match self {
            PostfixToken::Literal(_) => None,
            PostfixToken::Star => Some('*'),
            PostfixToken::Plus => Some('+'),
            PostfixToken::Optional => Some('?'),
            PostfixToken::Concat => Some('_'),
            PostfixToken::Alternate => Some('|'),
        }
    }
}

impl Display for PostfixToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self, self.symbol()) {
            (PostfixToken::Literal(v), _) => write!(f, "{v}"),
            (_, Some(c)) => write!(f, "{c}"),
            (_, None) => Ok(()),
        }
    }
}

fn parse_range(input: &str) -> NResult<Variable> {
    map(
        separated_pair(none_of(NOT_RANGE_ENDPOINT), cchar('-'), none_of(NOT_RANGE_ENDPOINT)),
        |(start, end)| Variable::Range(start, end),
    )(input)
}

fn parse_operator(input: &str) -> NResult<Operator> {
    map_opt(anychar, Operator::from_symbol)(input)
}

fn parse_token_kind(input: &str) -> NResult<TokenKind> {
    alt((
        map(parse_range, TokenKind::Variable),
        map(parse_operator, TokenKind::Operator),
        map(anychar, |c| TokenKind::Variable(Variable::Char(c))),
    ))(input)
}

/// Splits a pattern into infix tokens. Ranges are recognised here but not
/// expanded. Operands that include `ε` are rejected.
pub fn tokenize(pattern: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = pattern;
    let mut position = 0;

    while !rest.is_empty() {
        let (r, kind) = parse_token_kind(rest).map_err(|_| {
            PatternError::malformed(pattern, Malformation::UnexpectedInput { position })
        })?;

        if let TokenKind::Variable(Variable::Range(start, end)) = kind {
            if start > end {
                return Err(PatternError::InvalidRange {
                    pattern: pattern.to_owned(),
                    position,
                    start,
                    end,
                });
            }
        }

        if let TokenKind::Variable(v) = kind {
            if v.chars().contains(&EPSILON) {
                return Err(PatternError::malformed(
                    pattern,
                    Malformation::ReservedSymbol { symbol: EPSILON, position },
                ));
            }
        }

        tokens.push(Token { kind, position });
        position += rest[..rest.len() - r.len()].chars().count();
        rest = r;
    }

    Ok(tokens)
}

/// Inserts `|` between adjacent literals inside bracket classes, so `[abc]`
/// reads as `[a|b|c]`.
pub fn expand_classes(tokens: Vec<Token>) -> Vec<Token> {
    let mut expanded = Vec::with_capacity(tokens.len() * 2);
    let mut inside_class = false;
    let mut previous_was_variable = false;

    for token in tokens {
        if token.is_operator(Operator::OpenClass) {
            inside_class = true;
        }
        else if token.is_operator(Operator::CloseClass) {
            inside_class = false;
        }
        else if inside_class && previous_was_variable && token.is_variable() {
            expanded.push(Token::operator(Operator::Alternate, token.position));
        }

        previous_was_variable = token.is_variable();
        expanded.push(token);
    }

    expanded
}

/// Makes concatenation explicit by inserting `_` wherever one operand ends and
/// the next begins.
pub fn insert_concatenation(tokens: Vec<Token>) -> Vec<Token> {
    let mut joined = Vec::with_capacity(tokens.len() * 2);

    for (current, next) in tokens.iter().copied().tuple_windows() {
        joined.push(current);
        if current.ends_operand() && next.begins_operand() {
            joined.push(Token::operator(Operator::Concat, next.position));
        }
    }
    joined.extend(tokens.last().copied());

    joined
}

/// Shunting-yard over tokens that already carry explicit concatenation.
fn shunting_yard(pattern: &str, tokens: &[Token]) -> Result<Vec<PostfixToken>> {
    let mut postfix = Vec::with_capacity(tokens.len());
    let mut stack: Vec<(Operator, usize)> = Vec::new();
    let mut previous: Option<Token> = None;

    for &token in tokens {
        match token.kind {
            TokenKind::Variable(v) => postfix.push(PostfixToken::Literal(v)),
            TokenKind::Operator(op) if op.is_opener() => stack.push((op, token.position)),
            TokenKind::Operator(close) if close.is_closer() => loop {
                let Some((top, open_position)) = stack.pop() else {
                    return Err(PatternError::malformed(
                        pattern,
                        Malformation::UnmatchedClose { delimiter: close.symbol(), position: token.position },
                    ));
                };

                if !top.is_opener() {
                    postfix.extend(top.as_postfix());
                    continue;
                }
                if top.closer() != Some(close) {
                    return Err(PatternError::malformed(
                        pattern,
                        Malformation::MismatchedDelimiter {
                            open: top.symbol(),
                            open_position,
                            close: close.symbol(),
                            position: token.position,
                        },
                    ));
                }
                if previous.is_some_and(|p| p.is_operator(top)) {
                    return Err(PatternError::malformed(
                        pattern,
                        Malformation::EmptyGroup { open: top.symbol(), close: close.symbol(), position: open_position },
                    ));
                }
                break;
            },
            TokenKind::Operator(op) => {
                while let Some(&(top, _)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    postfix.extend(top.as_postfix());
                    stack.pop();
                }
                stack.push((op, token.position));
            }
        }
        previous = Some(token);
    }

    while let Some((top, position)) = stack.pop() {
        if top.is_opener() {
            return Err(PatternError::malformed(
                pattern,
                Malformation::UnclosedGroup { delimiter: top.symbol(), position },
            ));
        }
        postfix.extend(top.as_postfix());
    }

    Ok(postfix)
}

/// Converts an infix pattern to postfix order.
///
/// Fails when grouping delimiters are unbalanced, mismatched or empty, or when
/// a range runs backwards.
pub fn infix_to_postfix(pattern: &str) -> Result<Vec<PostfixToken>> {
    let tokens = insert_concatenation(expand_classes(tokenize(pattern)?));
    trace!("infix tokens for {pattern:?}: {}", tokens.iter().join(" "));

    let postfix = shunting_yard(pattern, &tokens)?;
    debug!("parsed {pattern:?} into {} postfix tokens: {}", postfix.len(), postfix.iter().join(" "));
    Ok(postfix)
}

/// One construction step per postfix operator, applied by [`evaluate_postfix`].
pub trait PostfixCompiler {
    type Fragment;

    fn compile_variable(&mut self, variable: Variable) -> Self::Fragment;
    fn compile_zero_or_more(&mut self, inner: Self::Fragment) -> Self::Fragment;
    fn compile_one_or_more(&mut self, inner: Self::Fragment) -> Self::Fragment;
    fn compile_zero_or_one(&mut self, inner: Self::Fragment) -> Self::Fragment;
    fn compile_concat(&mut self, left: Self::Fragment, right: Self::Fragment) -> Self::Fragment;
    fn compile_alternation(&mut self, left: Self::Fragment, right: Self::Fragment) -> Self::Fragment;
}

/// Folds a postfix sequence with an operand stack, leaving exactly one
/// fragment.
///
/// Ranges running backwards are rejected before they reach the compiler, so
/// [`PostfixCompiler::compile_variable`] always sees a non-empty range.
pub fn evaluate_postfix<C: PostfixCompiler>(
    compiler: &mut C,
    pattern: &str,
    postfix: &[PostfixToken],
) -> Result<C::Fragment> {
    let mut operands: Vec<C::Fragment> = Vec::new();

    for &token in postfix {
        let missing = || {
            PatternError::malformed(
                pattern,
                Malformation::MissingOperand { operator: token.symbol().unwrap_or('?') },
            )
        };

        let fragment = match token {
            PostfixToken::Literal(Variable::Range(start, end)) if start > end => {
                return Err(PatternError::InvalidRange {
                    pattern: pattern.to_owned(),
                    position: char_index_of(pattern, &format!("{start}-{end}")),
                    start,
                    end,
                });
            }
            PostfixToken::Literal(v) => compiler.compile_variable(v),
            PostfixToken::Star | PostfixToken::Plus | PostfixToken::Optional => {
                let inner = operands.pop().ok_or_else(missing)?;
                match token {
                    PostfixToken::Star => compiler.compile_zero_or_more(inner),
                    PostfixToken::Plus => compiler.compile_one_or_more(inner),
                    _ => compiler.compile_zero_or_one(inner),
                }
            }
            PostfixToken::Concat | PostfixToken::Alternate => {
                let right = operands.pop().ok_or_else(missing)?;
                let left = operands.pop().ok_or_else(missing)?;
                match token {
                    PostfixToken::Concat => compiler.compile_concat(left, right),
                    _ => compiler.compile_alternation(left, right),
                }
            }
        };
        operands.push(fragment);
    }

    let count = operands.len();
    match operands.pop() {
        Some(fragment) if count == 1 => Ok(fragment),
        Some(_) => Err(PatternError::malformed(pattern, Malformation::DanglingOperands { count })),
        None => Err(PatternError::malformed(pattern, Malformation::EmptyPattern)),
    }
}

fn char_index_of(pattern: &str, needle: &str) -> usize {
    pattern
        .find(needle)
        .map(|byte| pattern[..byte].chars().count())
        .unwrap_or(0)
}

fn escape_into(c: char, out: &mut String) {
    if r"\.+*?()|[]{}^$#&-~".contains(c) {
        out.push('\\');
    }
    out.push(c);
}

struct RegexSyntax;

impl PostfixCompiler for RegexSyntax {
    type Fragment = String;

    fn compile_variable(&mut self, variable: Variable) -> String {
        let mut out = String::new();
        match variable {
            Variable::Char(c) => escape_into(c, &mut out),
            Variable::Range(start, end) => {
                out.push('[');
                escape_into(start, &mut out);
                out.push('-');
                escape_into(end, &mut out);
                out.push(']');
            }
        }
        out
    }

    fn compile_zero_or_more(&mut self, inner: String) -> String {
        format!("(?:{inner})*")
    }

    fn compile_one_or_more(&mut self, inner: String) -> String {
        format!("(?:{inner})+")
    }

    fn compile_zero_or_one(&mut self, inner: String) -> String {
        format!("(?:{inner})?")
    }

    fn compile_concat(&mut self, left: String, right: String) -> String {
        left + &right
    }

    fn compile_alternation(&mut self, left: String, right: String) -> String {
        format!("(?:{left}|{right})")
    }
}

/// Rewrites a pattern into conventional regex syntax, fully parenthesised.
///
/// Used to cross-check automata against the `regex` crate.
pub fn to_regex_syntax(pattern: &str) -> Result<String> {
    let postfix = infix_to_postfix(pattern)?;
    evaluate_postfix(&mut RegexSyntax, pattern, &postfix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postfix_strings(pattern: &str) -> Vec<String> {
        infix_to_postfix(pattern)
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect_vec()
    }

    #[test]
    fn postfix_follows_precedence() {
        let cases: [(&str, &[&str]); 6] = [
            ("ab", &["a", "b", "_"]),
            ("a|b", &["a", "b", "|"]),
            ("(a|b)*", &["a", "b", "|", "*"]),
            ("a.b", &["a", ".", "_", "b", "_"]),
            ("[a-z]?e", &["a-z", "?", "e", "_"]),
            ("a(b|c)*", &["a", "b", "c", "|", "*", "_"]),
        ];

        for (infix, expected) in cases {
            assert_eq!(postfix_strings(infix), expected, "pattern {infix:?}");
        }
    }

    #[test]
    fn bracket_class_becomes_alternation() {
        assert_eq!(postfix_strings("[abc]"), ["a", "b", "|", "c", "|"]);
        assert_eq!(postfix_strings("x[ab]"), ["x", "a", "b", "|", "_"]);
    }

    #[test]
    fn postfix_operators_bind_tighter_than_concatenation() {
        assert_eq!(postfix_strings("ab*"), ["a", "b", "*", "_"]);
        assert_eq!(postfix_strings("ab|c"), ["a", "b", "_", "c", "|"]);
        assert_eq!(postfix_strings("a+?"), ["a", "+", "?"]);
    }

    #[test]
    fn explicit_concatenation_operator_is_accepted() {
        assert_eq!(postfix_strings("a_b"), postfix_strings("ab"));
    }

    #[test]
    fn tokenizer_merges_ranges() {
        let tokens = tokenize("[a-zA-Z]").unwrap();
        let kinds = tokens.iter().map(|t| *t.kind()).collect_vec();
        assert_eq!(
            kinds,
            [
                TokenKind::Operator(Operator::OpenClass),
                TokenKind::Variable(Variable::Range('a', 'z')),
                TokenKind::Variable(Variable::Range('A', 'Z')),
                TokenKind::Operator(Operator::CloseClass),
            ]
        );
        let positions = tokens.iter().map(|t| *t.position()).collect_vec();
        assert_eq!(positions, [0, 1, 4, 7]);
    }

    #[test]
    fn dash_outside_a_range_is_a_literal() {
        let tokens = tokenize("-a-").unwrap();
        let kinds = tokens.iter().map(|t| *t.kind()).collect_vec();
        assert_eq!(
            kinds,
            [
                TokenKind::Variable(Variable::Char('-')),
                TokenKind::Variable(Variable::Char('a')),
                TokenKind::Variable(Variable::Char('-')),
            ]
        );
    }

    #[test]
    fn backwards_range_is_rejected() {
        let err = infix_to_postfix("x[z-a]").unwrap_err();
        assert_eq!(
            err,
            PatternError::InvalidRange { pattern: "x[z-a]".to_owned(), position: 2, start: 'z', end: 'a' }
        );
        assert!(!err.is_malformed());
    }

    #[test]
    fn epsilon_literal_is_reserved() {
        let err = infix_to_postfix("aε*").unwrap_err();
        assert_eq!(
            err,
            PatternError::malformed("aε*", Malformation::ReservedSymbol { symbol: 'ε', position: 1 })
        );

        // a range spanning ε is rejected too
        let err = infix_to_postfix("[α-ω]").unwrap_err();
        assert!(matches!(err, PatternError::Malformed { kind: Malformation::ReservedSymbol { position: 1, .. }, .. }));
        assert!(infix_to_postfix("[α-δ]").is_ok());
    }

    #[test]
    fn unbalanced_groups_are_malformed() {
        let err = infix_to_postfix("(a|b").unwrap_err();
        assert_eq!(
            err,
            PatternError::malformed("(a|b", Malformation::UnclosedGroup { delimiter: '(', position: 0 })
        );

        let err = infix_to_postfix("ab)").unwrap_err();
        assert_eq!(
            err,
            PatternError::malformed("ab)", Malformation::UnmatchedClose { delimiter: ')', position: 2 })
        );
    }

    #[test]
    fn mismatched_and_empty_groups_are_malformed() {
        let err = infix_to_postfix("(a]").unwrap_err();
        assert!(matches!(
            err,
            PatternError::Malformed { kind: Malformation::MismatchedDelimiter { open: '(', close: ']', .. }, .. }
        ));

        let err = infix_to_postfix("a[]").unwrap_err();
        assert!(matches!(
            err,
            PatternError::Malformed { kind: Malformation::EmptyGroup { open: '[', position: 1, .. }, .. }
        ));
        assert!(infix_to_postfix("()").is_err());
    }

    #[test]
    fn error_message_names_pattern_and_index() {
        let message = infix_to_postfix("a(b").unwrap_err().to_string();
        assert!(message.contains("\"a(b\""), "{message}");
        assert!(message.contains("index 1"), "{message}");
    }

    #[test]
    fn regex_syntax_is_fully_grouped() {
        assert_eq!(to_regex_syntax("a|b").unwrap(), "(?:a|b)");
        assert_eq!(to_regex_syntax("(a|b)*abb").unwrap(), "(?:(?:a|b))*abb");
        assert_eq!(to_regex_syntax("[a-z]+.").unwrap(), "(?:[a-z])+\\.");
    }

    #[test]
    fn hand_built_backwards_range_is_rejected() {
        let postfix = [PostfixToken::Literal(Variable::Range('z', 'a'))];
        let err = evaluate_postfix(&mut RegexSyntax, "z-a", &postfix).unwrap_err();
        assert_eq!(
            err,
            PatternError::InvalidRange { pattern: "z-a".to_owned(), position: 0, start: 'z', end: 'a' }
        );
    }

    #[test]
    fn leftover_operands_are_reported() {
        let postfix = [PostfixToken::Literal(Variable::Char('a')), PostfixToken::Literal(Variable::Char('b'))];
        let err = evaluate_postfix(&mut RegexSyntax, "ab", &postfix).unwrap_err();
        assert_eq!(err, PatternError::malformed("ab", Malformation::DanglingOperands { count: 2 }));
        let err = evaluate_postfix(&mut RegexSyntax, "", &[]).unwrap_err();
        assert_eq!(err, PatternError::malformed("", Malformation::EmptyPattern));
    }

    #[test]
    fn regex_syntax_reports_dangling_operators() {
        let err = to_regex_syntax("a|").unwrap_err();
        assert_eq!(err, PatternError::malformed("a|", Malformation::MissingOperand { operator: '|' }));
    }
}
