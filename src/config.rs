use anyhow::{bail, Context, Result};
use proc_min_dfa::dfa;
use std::fs;
use std::path::PathBuf;

/// Patterns processed when none are given on the command line.
pub const DEFAULT_WORKLIST: [&str; 16] = [
    "(a|b)*abb",
    "(N|[oO]h?)[a-z]*(g[.]?r[.]?e[.]?a[.]?t)[a-z]*",
    "[a-zA-Z]+[0-9]?",
    "[a-zA-Z0-9]+",
    "[a-zA-Z0-9]+2[a-zA-Z]+.[a-zA-Z]+",
    "[Gg]et[Rr]ick[Rr]olled",
    "[Oo]sama+",
    "a",
    "a*",
    "a?(a+b)*b",
    "a|b",
    "ab",
    "ab|cd",
    "ab|cd|ef",
    "S[kK][iI][bB][iI][dD][iI]",
    "TheBoysWishesUEidMubarak",
];

pub const USAGE: &str = "usage: min_dfa [--out DIR] [--expected DIR] [--worklist FILE] [--verify] [PATTERN...]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Root of the per-pattern output folders.
    pub out: PathBuf,
    /// Root of previously generated folders to compare against.
    pub expected: Option<PathBuf>,
    /// Cross-check every minimized DFA against the `regex` crate.
    pub verify: bool,
    pub patterns: Vec<String>,
}

impl DriverConfig {
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut out = PathBuf::from("output");
        let mut expected = None;
        let mut verify = false;
        let mut worklist = None;
        let mut patterns = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| args.next().with_context(|| format!("`{flag}` needs a value\n{USAGE}"));
            match arg.as_str() {
                "--out" => out = PathBuf::from(value("--out")?),
                "--expected" => expected = Some(PathBuf::from(value("--expected")?)),
                "--worklist" => worklist = Some(PathBuf::from(value("--worklist")?)),
                "--verify" => verify = true,
                flag if is_option(flag) => bail!("unknown option `{flag}`\n{USAGE}"),
                pattern => patterns.push(pattern.to_owned()),
            }
        }

        if let Some(path) = worklist {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read worklist '{}'", path.display()))?;
            patterns.extend(parse_worklist(&text));
        }
        if patterns.is_empty() {
            patterns = DEFAULT_WORKLIST.iter().map(|p| p.to_string()).collect();
        }

        Ok(Self { out, expected, verify, patterns })
    }
}

/// Whether `arg` is spelled like a long option.
const fn is_option(arg: &str) -> bool {
    dfa!("--[a-zA-Z0-9]*").test(arg)
}

/// One pattern per line. Blank lines and lines starting with `#` are skipped.
pub fn parse_worklist(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// Output folder of a pattern: the pattern with `*`, `|` and `?` replaced by `_`.
pub fn folder_name(pattern: &str) -> String {
    pattern.replace(['*', '|', '?'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let config = DriverConfig::from_args(args(&[])).unwrap();
        assert_eq!(config.out, PathBuf::from("output"));
        assert_eq!(config.expected, None);
        assert!(!config.verify);
        assert_eq!(config.patterns.len(), 16);
        assert_eq!(config.patterns[0], "(a|b)*abb");
    }

    #[test]
    fn flags_and_patterns() {
        let config = DriverConfig::from_args(args(&["--out", "o", "a|b", "--verify", "--expected", "e", "ab"])).unwrap();
        assert_eq!(config.out, PathBuf::from("o"));
        assert_eq!(config.expected, Some(PathBuf::from("e")));
        assert!(config.verify);
        assert_eq!(config.patterns, ["a|b", "ab"]);
    }

    #[test]
    fn bad_arguments() {
        assert!(DriverConfig::from_args(args(&["--out"])).is_err());
        assert!(DriverConfig::from_args(args(&["--bogus"])).is_err());
        assert!(DriverConfig::from_args(args(&["--worklist", "/nonexistent/worklist.txt"])).is_err());
    }

    #[test]
    fn option_spelling() {
        assert!(is_option("--bogus"));
        assert!(is_option("--"));
        assert!(!is_option("-x"));
        assert!(!is_option("--a|b"));
        assert!(!is_option("a--"));
    }

    #[test]
    fn worklist_skips_comments_and_blanks() {
        let text = "# reference patterns\na*\n\n  ab|cd  \n#x\n";
        assert_eq!(parse_worklist(text), ["a*", "ab|cd"]);
    }

    #[test]
    fn folder_names() {
        assert_eq!(folder_name("(a|b)*abb"), "(a_b)_abb");
        assert_eq!(folder_name("a?(a+b)*b"), "a_(a+b)_b");
        assert_eq!(folder_name("[a-zA-Z]+[0-9]?"), "[a-zA-Z]+[0-9]_");
    }
}
