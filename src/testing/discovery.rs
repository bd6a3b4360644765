//! Scenario discovery and batch runs
//!
//! Shared by the `test-scenarios` binary and the unit test that runs every
//! scenario file under `cargo test`.

use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::parser::parse_test_file;
use super::runner::{TestResult, run_test};

/// One scenario file and how it went
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub path: PathBuf,
    /// Directory below the scenarios root ("control", "possession", ...)
    pub category: String,
    /// File stem
    pub name: String,
    pub result: TestResult,
}

/// Pass/fail/error counts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl Summary {
    pub fn of(outcomes: &[ScenarioOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.result {
                TestResult::Pass { .. } => summary.passed += 1,
                TestResult::Fail { .. } => summary.failed += 1,
                TestResult::Error { .. } => summary.errors += 1,
            }
        }
        summary
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }
}

/// Every `.toml` file below `base` whose path relative to `base` contains
/// `filter`, sorted
pub fn discover_scenarios(base: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut dirs = vec![base.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                dirs.push(path);
                continue;
            }
            if path.extension().is_none_or(|e| e != "toml") {
                continue;
            }
            let keep = filter.is_none_or(|f| {
                let rel = path.strip_prefix(base).unwrap_or(&path);
                rel.to_string_lossy().contains(f)
            });
            if keep {
                found.push(path);
            }
        }
    }

    found.sort();
    found
}

/// Parse and run one scenario file
pub fn run_file(path: &Path) -> TestResult {
    match parse_test_file(path) {
        Ok(def) => run_test(&def),
        Err(message) => TestResult::Error { message },
    }
}

/// Run the matching scenarios below `base`, optionally across all cores.
/// Outcomes come back in discovery order either way.
pub fn run_scenarios(base: &Path, filter: Option<&str>, parallel: bool) -> Vec<ScenarioOutcome> {
    let paths = discover_scenarios(base, filter);
    let results: Vec<TestResult> = if parallel {
        paths.par_iter().map(|p| run_file(p)).collect()
    } else {
        paths.iter().map(|p| run_file(p)).collect()
    };

    paths
        .into_iter()
        .zip(results)
        .map(|(path, result)| {
            let rel = path.strip_prefix(base).unwrap_or(&path);
            let category = rel
                .parent()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default();
            let name = rel
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            ScenarioOutcome {
                path,
                category,
                name,
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SCENARIOS_DIR;

    fn scenarios_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(SCENARIOS_DIR)
    }

    #[test]
    fn test_discovery_filters_by_relative_path() {
        let root = scenarios_root();
        let all = discover_scenarios(&root, None);
        let control = discover_scenarios(&root, Some("control/"));
        assert!(!control.is_empty());
        assert!(control.len() < all.len());
        assert!(control.iter().all(|p| p.to_string_lossy().contains("control")));

        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
    }

    #[test]
    fn test_missing_directory_finds_nothing() {
        assert!(discover_scenarios(Path::new("no/such/dir"), None).is_empty());
    }
}
