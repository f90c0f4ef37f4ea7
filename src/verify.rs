use anyhow::{Context, Result};
use min_dfa_transformer::automata::Dfa;
use min_dfa_transformer::to_regex_syntax;
use regex::Regex;
use std::collections::{BTreeSet, VecDeque};

/// Upper bound on the strings checked per pattern.
const SAMPLE_LIMIT: usize = 4096;

/// Inputs to test an automaton on: every string over its alphabet (plus one
/// foreign symbol) in length order up to [`SAMPLE_LIMIT`], followed by the
/// shortest path to each state and its one-symbol extensions.
pub fn sample_inputs(dfa: &Dfa) -> BTreeSet<String> {
    let mut alphabet: Vec<char> = dfa.alphabet().into_iter().collect();
    let foreign = ('!'..='~').chain(['ß']).find(|c| !alphabet.contains(c));
    alphabet.extend(foreign);

    let mut samples = BTreeSet::new();
    let mut layer = vec![String::new()];
    'outer: while !layer.is_empty() {
        let mut next = Vec::new();
        for prefix in layer {
            for &c in &alphabet {
                next.push(format!("{prefix}{c}"));
            }
            samples.insert(prefix);
            if samples.len() >= SAMPLE_LIMIT {
                break 'outer;
            }
        }
        layer = next;
    }

    for path in shortest_paths(dfa) {
        for &c in &alphabet {
            samples.insert(format!("{path}{c}"));
        }
        samples.insert(path);
    }
    samples
}

/// Shortest input reaching each reachable state.
fn shortest_paths(dfa: &Dfa) -> Vec<String> {
    let mut paths: Vec<Option<String>> = vec![None; dfa.len()];
    let mut queue = VecDeque::new();
    if !dfa.is_empty() {
        paths[*dfa.start()] = Some(String::new());
        queue.push_back(*dfa.start());
    }

    while let Some(index) = queue.pop_front() {
        let Some(state) = dfa.state(index) else {
            continue;
        };
        let prefix = paths[index].clone().unwrap_or_default();
        for (&c, &target) in state.transitions() {
            if paths[target].is_none() {
                paths[target] = Some(format!("{prefix}{c}"));
                queue.push_back(target);
            }
        }
    }

    paths.into_iter().flatten().collect()
}

/// Inputs on which `dfa` and the `regex` crate disagree about `pattern`.
pub fn disagreements(pattern: &str, dfa: &Dfa) -> Result<Vec<String>> {
    let syntax = to_regex_syntax(pattern)?;
    let oracle = Regex::new(&format!("^(?:{syntax})$"))
        .with_context(|| format!("regex crate rejected {syntax:?} (from {pattern:?})"))?;

    Ok(sample_inputs(dfa)
        .into_iter()
        .filter(|input| dfa.accepts(input) != oracle.is_match(input))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use min_dfa_transformer::to_minimized_dfa;

    #[test]
    fn samples_reach_accepting_states() {
        let min = to_minimized_dfa("TheBoysWishesUEidMubarak").unwrap();
        let samples = sample_inputs(min.dfa());
        assert!(samples.contains("TheBoysWishesUEidMubarak"));
        assert!(samples.contains(""));
        assert!(samples.len() <= SAMPLE_LIMIT + 25 * 20);
    }

    #[test]
    fn samples_include_foreign_symbol() {
        let min = to_minimized_dfa("ab").unwrap();
        assert!(sample_inputs(min.dfa()).contains("!"));
    }

    #[test]
    fn reference_patterns_agree_with_oracle() {
        for pattern in crate::config::DEFAULT_WORKLIST {
            let min = to_minimized_dfa(pattern).unwrap();
            assert_eq!(disagreements(pattern, min.dfa()).unwrap(), Vec::<String>::new(), "{pattern}");
        }
    }

    #[test]
    fn wrong_automaton_is_caught() {
        let min = to_minimized_dfa("ab").unwrap();
        assert_eq!(disagreements("a|b", min.dfa()).unwrap(), ["a", "ab", "b"]);
    }
}
