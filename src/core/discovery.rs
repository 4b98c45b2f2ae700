use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::config::SearchConfig;
use crate::error::{ExtractorError, Result};

/// Collect every Java source file under `root`, honoring the configured
/// gitignore/hidden-file behavior. Output is sorted so repeated runs over
/// an unchanged tree traverse files in the same order.
pub fn java_source_files(root: &Path, config: &SearchConfig) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(root)
        .hidden(!config.include_hidden)
        .git_ignore(config.respect_gitignore)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ExtractorError::FileSystem(e.to_string()))?;
        let path = entry.path();

        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("java") {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
