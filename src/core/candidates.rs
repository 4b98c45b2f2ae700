use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{ExtractorError, Result};

use super::discovery::java_source_files;
use super::edges::ModifiedSet;

/// Cheap textual pre-filter over the whole repository.
///
/// A file can only contain a call to `foo` if it contains the literal text
/// `foo(`, so one alternation regex over the declared method names yields a
/// superset of the true caller files. False positives are weeded out later
/// by resolution; false negatives cannot occur for syntactically valid
/// calls.
pub struct CandidateFilter {
    config: SearchConfig,
}

impl CandidateFilter {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Every source file outside `exclude` whose text contains one of the
    /// names immediately followed by `(`. Each file appears at most once;
    /// output is sorted.
    pub fn find_candidates(
        &self,
        repository: &Path,
        names: &HashSet<String>,
        exclude: &ModifiedSet,
    ) -> Result<Vec<PathBuf>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let matcher = build_call_pattern(names)?;

        let mut candidates = Vec::new();
        for file in java_source_files(repository, &self.config)? {
            let content = match std::fs::read_to_string(&file) {
                Ok(content) => content,
                Err(e) => {
                    debug!("Skipping unreadable file {}: {}", file.display(), e);
                    continue;
                }
            };

            if matcher.is_match(&content) && !exclude.contains(&file) {
                candidates.push(file);
            }
        }

        candidates.sort();
        Ok(candidates)
    }
}

/// `(?:name1|name2|...)\(` over the escaped names, sorted so the pattern is
/// identical across runs
fn build_call_pattern(names: &HashSet<String>) -> Result<Regex> {
    let mut sorted: Vec<&String> = names.iter().collect();
    sorted.sort();

    let alternation = sorted
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&format!(r"(?:{})\(", alternation))
        .map_err(|e| ExtractorError::Search(e.to_string()))
}
