use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::Result;

use super::format::escape_call_text;
use super::parser::{SourceRange, SourceUnit};
use super::resolver::{resolve, Resolution, ResolutionContext};

/// Which callee simple names a pass is interested in
#[derive(Debug, Clone, Copy)]
pub enum NameFilter<'a> {
    /// Every call expression (callee pass)
    Any,

    /// Only calls to one of the given names (caller pass)
    Named(&'a HashSet<String>),
}

impl NameFilter<'_> {
    fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::Any => true,
            NameFilter::Named(names) => names.contains(name),
        }
    }
}

/// The modified files of one run, held in canonical form so membership
/// checks are robust against symlinks and relative-path spellings.
#[derive(Debug, Clone)]
pub struct ModifiedSet {
    files: Vec<PathBuf>,
}

impl ModifiedSet {
    /// Canonicalize all given paths. An unreadable modified file is a fatal
    /// error for the run.
    pub fn new(files: &[PathBuf]) -> Result<Self> {
        let mut canonical = Vec::with_capacity(files.len());
        for file in files {
            canonical.push(std::fs::canonicalize(file)?);
        }
        Ok(Self { files: canonical })
    }

    /// Canonical-path membership check; paths that cannot be canonicalized
    /// are never members.
    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        match std::fs::canonicalize(path.as_ref()) {
            Ok(canonical) => self.files.contains(&canonical),
            Err(_) => false,
        }
    }

    /// The canonicalized modified files
    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }
}

/// A resolved, located caller-to-callee relationship; one output record
#[derive(Debug, Clone, Serialize)]
pub struct CallGraphEdge {
    /// File containing the call site, relative to the repository root
    pub caller_file: PathBuf,

    /// Range of the call expression
    pub call_range: SourceRange,

    /// First line of the call expression, delimiter-escaped
    pub call_text: String,

    /// Signature of the invoked method, e.g. `run(int)`
    pub callee_signature: String,

    /// Signature qualified by the declaring type
    pub callee_qualified_signature: String,

    /// File declaring the callee, relative to the repository root
    pub callee_file: PathBuf,

    /// Range of the callee's declaration
    pub callee_range: SourceRange,
}

/// Extract every call-graph edge from one parsed file.
///
/// Calls failing the name filter are not resolved at all; calls resolving
/// to external or unknown declarations are skipped silently. When
/// `modified` is given (caller pass), only edges landing on a modified
/// file's declaration survive.
pub fn extract_edges(
    unit: &SourceUnit,
    context: &ResolutionContext,
    filter: NameFilter,
    modified: Option<&ModifiedSet>,
    repository: &Path,
) -> Vec<CallGraphEdge> {
    let mut edges = Vec::new();

    for call in &unit.calls {
        if !filter.matches(&call.name) {
            continue;
        }

        let declaration = match resolve(call, unit, context) {
            Resolution::Resolved(declaration) => declaration,
            Resolution::External | Resolution::Unresolved => {
                debug!(
                    "No edge for call `{}` at {}:{}",
                    call.name,
                    unit.path.display(),
                    call.range.begin_line
                );
                continue;
            }
        };

        if let Some(modified) = modified {
            if !modified.contains(&declaration.file) {
                continue;
            }
        }

        edges.push(CallGraphEdge {
            caller_file: relative_to(&unit.path, repository),
            call_range: call.range,
            call_text: escape_call_text(&call.call_text),
            callee_signature: declaration.signature,
            callee_qualified_signature: declaration.qualified_signature,
            callee_file: relative_to(&declaration.file, repository),
            callee_range: declaration.range,
        });
    }

    edges
}

/// Express `path` relative to the repository root, canonicalizing first so
/// walk-produced and argument-produced spellings agree. Falls back to the
/// path as given.
fn relative_to(path: &Path, repository: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .ok()
        .and_then(|canonical| {
            canonical
                .strip_prefix(repository)
                .map(Path::to_path_buf)
                .ok()
        })
        .unwrap_or_else(|| path.to_path_buf())
}
