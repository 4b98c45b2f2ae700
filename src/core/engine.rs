use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;

use super::candidates::CandidateFilter;
use super::edges::{extract_edges, CallGraphEdge, ModifiedSet, NameFilter};
use super::package_roots::PackageRootLocator;
use super::parser::{JavaParser, SourceUnit};
use super::resolver::ResolutionContext;

/// Coarse per-pass progress, logged only when the rounded percentage
/// changes. Observational only; never affects results.
struct Progress {
    total: usize,
    last: Option<usize>,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self { total, last: None }
    }

    fn tick(&mut self, completed: usize) {
        if self.total == 0 {
            return;
        }
        let percentage = completed * 100 / self.total;
        if self.last != Some(percentage) {
            info!("Progress: {}%", percentage);
            self.last = Some(percentage);
        }
    }
}

/// Main orchestration engine: composes the callee pass over the modified
/// files and the caller pass over the candidate files.
pub struct Engine {
    config: Config,
    parser: JavaParser,
}

impl Engine {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;

        debug!("Loaded configuration: {:?}", config);

        let parser = JavaParser::new(&config.parsing)?;

        Ok(Self { config, parser })
    }

    /// Run the full extraction over one repository. The returned list is
    /// the callee-pass edges followed by the caller-pass edges.
    pub fn run(&mut self, repository: &Path, modified_files: &[PathBuf]) -> Result<Vec<CallGraphEdge>> {
        let repository = std::fs::canonicalize(repository)
            .with_context(|| format!("Cannot read repository {}", repository.display()))?;

        let resolved: Vec<PathBuf> = modified_files
            .iter()
            .map(|file| repository.join(file))
            .collect();
        let modified = ModifiedSet::new(&resolved).context("Cannot read modified file")?;

        // Step 1: method names declared in the modified files
        let mut units = Vec::new();
        for path in modified.paths() {
            match self.parser.parse_file(path) {
                Ok(unit) => units.push(unit),
                Err(e) => warn!("Skipping modified file {}: {}", path.display(), e),
            }
        }
        let names: HashSet<String> = units
            .iter()
            .flat_map(SourceUnit::method_names)
            .map(str::to_string)
            .collect();
        debug!("Modified files declare {} distinct method names", names.len());

        // Step 2: candidate caller files
        info!("Extracting possible caller classes");
        let filter = CandidateFilter::new(&self.config.search);
        let candidates = filter.find_candidates(&repository, &names, &modified)?;
        debug!("Found {} candidate caller files", candidates.len());

        // Step 3: package roots
        info!("Extracting package roots");
        let locator = PackageRootLocator::new(&self.config.search);
        let roots = locator.locate(&repository)?;
        debug!("Found {} package roots", roots.len());

        // Step 4: the resolution context, complete before the first
        // resolve call and read-only afterwards
        let context = ResolutionContext::build(&roots, &mut self.parser)?;
        debug!("Indexed {} types", context.type_count());

        // Step 5: callee pass over the modified files
        info!("Extracting callees from {} classes", units.len());
        let mut edges = Vec::new();
        let mut progress = Progress::new(units.len());
        for (done, unit) in units.iter().enumerate() {
            progress.tick(done);
            edges.extend(extract_edges(unit, &context, NameFilter::Any, None, &repository));
        }
        info!("Found {} callees", edges.len());

        // Step 6: caller pass over the candidate files
        info!("Extracting callers from {} classes", candidates.len());
        let mut caller_edges = Vec::new();
        let mut progress = Progress::new(candidates.len());
        for (done, path) in candidates.iter().enumerate() {
            progress.tick(done);
            match self.parser.parse_file(path) {
                Ok(unit) => caller_edges.extend(extract_edges(
                    &unit,
                    &context,
                    NameFilter::Named(&names),
                    Some(&modified),
                    &repository,
                )),
                Err(e) => warn!("Skipping candidate file {}: {}", path.display(), e),
            }
        }
        info!("Found {} callers", caller_edges.len());

        edges.extend(caller_edges);
        Ok(edges)
    }
}
