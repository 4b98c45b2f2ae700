use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{ExtractorError, Result};

use super::discovery::java_source_files;

/// Line pattern of a top-level Java package declaration
const PACKAGE_PATTERN: &str = r"^\s*package\s+([A-Za-z_][\w.]*)\s*;";

/// Infers the set of source-root directories a resolution context must be
/// built from.
///
/// Every file declaring `package a.b.c` is assumed to live `a/b/c` below
/// its source root, so stripping one directory segment per package segment
/// recovers the root. Files without a package declaration contribute
/// nothing; repositories violating the package-to-directory convention get
/// wrong or missing roots for the affected files.
pub struct PackageRootLocator {
    config: SearchConfig,
}

impl PackageRootLocator {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Scan every source file under `repository` and return the deduplicated
    /// set of inferred package roots.
    pub fn locate(&self, repository: &Path) -> Result<HashSet<PathBuf>> {
        let package_re = Regex::new(PACKAGE_PATTERN)
            .map_err(|e| ExtractorError::Search(e.to_string()))?;

        let mut roots = HashSet::new();
        for file in java_source_files(repository, &self.config)? {
            let content = match std::fs::read_to_string(&file) {
                Ok(content) => content,
                Err(e) => {
                    debug!("Skipping unreadable file {}: {}", file.display(), e);
                    continue;
                }
            };

            let Some(package) = first_package_declaration(&package_re, &content) else {
                continue;
            };

            if let Some(root) = infer_root(&file, &package, repository) {
                roots.insert(root);
            }
        }

        Ok(roots)
    }
}

/// First package declaration in the file, if any
fn first_package_declaration(package_re: &Regex, content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| package_re.captures(line).map(|caps| caps[1].to_string()))
}

/// Undo the package-to-directory mapping: strip one trailing directory
/// segment per package segment from the file's directory. A package deeper
/// than the file's path inside the repository violates the mapping
/// convention and yields no root.
fn infer_root(file: &Path, package: &str, repository: &Path) -> Option<PathBuf> {
    let segments = package.split('.').count();
    let mut root = file.parent()?.to_path_buf();

    for _ in 0..segments {
        if !root.pop() {
            return None;
        }
    }

    if !root.starts_with(repository) {
        return None;
    }

    Some(root)
}
