use crate::config::{folder_name, DriverConfig};
use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use min_dfa_transformer::{structurally_equivalent, PatternError, Pipeline, StateMachine, StateTable};
use std::fs;
use std::path::Path;

mod config;
mod verify;

#[derive(Debug)]
struct Report {
    pattern: String,
    nfa_states: usize,
    dfa_states: usize,
    minimized_states: usize,
    passed: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DriverConfig::from_args(std::env::args().skip(1))?;
    fs::create_dir_all(&config.out)
        .with_context(|| format!("failed to create output directory '{}'", config.out.display()))?;

    let mut reports = Vec::new();
    let mut errors = 0;
    for pattern in &config.patterns {
        match process(&config, pattern) {
            Ok(report) => reports.push(report),
            Err(e) => {
                error!("{}", failure_message(pattern, &e));
                errors += 1;
            }
        }
    }

    println!("{:<48} {:>6} {:>6} {:>6}", "pattern", "NFA", "DFA", "min");
    for report in &reports {
        println!(
            "{:<48} {:>6} {:>6} {:>6}{}",
            report.pattern,
            report.nfa_states,
            report.dfa_states,
            report.minimized_states,
            if report.passed { "" } else { "  FAILED" }
        );
    }

    let failed = errors + reports.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        bail!("{failed} of {} patterns failed", config.patterns.len());
    }
    Ok(())
}

fn process(config: &DriverConfig, pattern: &str) -> Result<Report> {
    let pipeline = Pipeline::run(pattern)?;
    let folder = folder_name(pattern);
    let dir = config.out.join(&folder);
    fs::create_dir_all(&dir).with_context(|| format!("failed to create '{}'", dir.display()))?;

    let nfa = pipeline.nfa().state_table();
    let dfa = pipeline.dfa().state_table();
    let minimized = pipeline.minimized().state_table();
    for (name, table) in [("nfa", &nfa), ("dfa", &dfa), ("minimized_dfa", &minimized)] {
        write_table(&dir, name, table)?;
    }
    info!(
        "{pattern:?}: {} NFA, {} DFA, {} minimized states -> {}",
        nfa.len(),
        dfa.len(),
        minimized.len(),
        dir.display()
    );

    let mut passed = true;
    if let Some(expected) = &config.expected {
        let expected = expected.join(&folder);
        for (label, name, table) in [("NFA", "nfa", &nfa), ("DFA", "minimized_dfa", &minimized)] {
            passed &= check_against(&expected, label, name, table, pattern)?;
        }
    }

    if config.verify {
        let mismatches = verify::disagreements(pattern, pipeline.minimized().dfa())?;
        if mismatches.is_empty() {
            println!("[ORACLE][PASS] {pattern}");
        } else {
            println!("[ORACLE][FAIL] {pattern}");
            warn!("{pattern:?} disagrees with the regex crate on {mismatches:?}");
            passed = false;
        }
    }

    Ok(Report {
        pattern: pattern.to_owned(),
        nfa_states: nfa.len(),
        dfa_states: dfa.len(),
        minimized_states: minimized.len(),
        passed,
    })
}

fn failure_message(pattern: &str, e: &anyhow::Error) -> String {
    match e.downcast_ref::<PatternError>() {
        Some(err) => format!("rejected pattern {:?}: {err}", err.pattern()),
        None => format!("{pattern:?}: {e:#}"),
    }
}

fn write_table(dir: &Path, name: &str, table: &StateTable) -> Result<()> {
    let json_path = dir.join(format!("{name}.json"));
    let json = table.to_json()?;
    fs::write(&json_path, json).with_context(|| format!("failed to write '{}'", json_path.display()))?;

    let dot_path = dir.join(format!("{name}.dot"));
    fs::write(&dot_path, table.to_dot()).with_context(|| format!("failed to write '{}'", dot_path.display()))?;
    Ok(())
}

/// Compares `table` with `<expected>/<name>.json`. A missing reference is
/// skipped and counts as passing.
fn check_against(expected: &Path, label: &str, name: &str, table: &StateTable, pattern: &str) -> Result<bool> {
    let path = expected.join(format!("{name}.json"));
    if !path.exists() {
        warn!("no reference '{}', skipping {label} check", path.display());
        return Ok(true);
    }

    let json = fs::read_to_string(&path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let reference = StateTable::from_json(&json).with_context(|| format!("invalid record '{}'", path.display()))?;
    let passed = structurally_equivalent(table, &reference);
    println!("[{label}][{}] {pattern}", if passed { "PASS" } else { "FAIL" });
    Ok(passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("min_dfa-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn config(out: PathBuf, expected: Option<PathBuf>, patterns: &[&str]) -> DriverConfig {
        DriverConfig {
            out,
            expected,
            verify: true,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn writes_every_stage() {
        let out = scratch_dir("stages");
        let config = config(out.clone(), None, &["(a|b)*abb"]);
        let report = process(&config, "(a|b)*abb").unwrap();
        assert!(report.passed);
        assert_eq!((report.dfa_states, report.minimized_states), (5, 4));

        let dir = out.join("(a_b)_abb");
        for file in ["nfa.json", "nfa.dot", "dfa.json", "dfa.dot", "minimized_dfa.json", "minimized_dfa.dot"] {
            assert!(dir.join(file).is_file(), "{file}");
        }
        let json = fs::read_to_string(dir.join("minimized_dfa.json")).unwrap();
        assert_eq!(StateTable::from_json(&json).unwrap().len(), 4);
        fs::remove_dir_all(&out).unwrap();
    }

    #[test]
    fn regression_against_previous_output() {
        let reference = scratch_dir("reference");
        process(&config(reference.clone(), None, &[]), "ab|cd").unwrap();

        let out = scratch_dir("rerun");
        let rerun = config(out.clone(), Some(reference.clone()), &[]);
        assert!(process(&rerun, "ab|cd").unwrap().passed);
        // no reference for this one: skipped, not failed
        assert!(process(&rerun, "a*").unwrap().passed);

        fs::create_dir_all(reference.join("ab")).unwrap();
        fs::copy(reference.join("ab_cd/nfa.json"), reference.join("ab/nfa.json")).unwrap();
        assert!(!process(&rerun, "ab").unwrap().passed);

        fs::remove_dir_all(&reference).unwrap();
        fs::remove_dir_all(&out).unwrap();
    }

    #[test]
    fn malformed_pattern_is_an_error() {
        let out = scratch_dir("malformed");
        let err = process(&config(out.clone(), None, &[]), "(ab").unwrap_err();
        assert_eq!(
            failure_message("(ab", &err),
            "rejected pattern \"(ab\": malformed pattern \"(ab\": `(` at index 0 is never closed"
        );
        let _ = fs::remove_dir_all(&out);
    }

    #[test]
    fn io_failures_keep_their_context() {
        let err = anyhow::anyhow!("disk full").context("failed to write 'x'");
        assert_eq!(failure_message("a", &err), "\"a\": failed to write 'x': disk full");
    }
}
