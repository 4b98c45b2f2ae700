use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::core::{format_edge, Engine};

#[derive(Parser)]
#[command(name = "mcextract")]
#[command(about = "Change-impact method-call extractor for Java repositories")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the repository to analyze
    pub repository: PathBuf,

    /// Modified files, resolved relative to the repository root
    #[arg(required = true)]
    pub modified_files: Vec<PathBuf>,
}

impl Cli {
    /// Run the extraction and print one record per edge on stdout.
    /// Diagnostics stay on stderr; stdout carries nothing but records.
    pub fn execute(self, mut engine: Engine) -> Result<()> {
        let edges = engine.run(&self.repository, &self.modified_files)?;

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for edge in &edges {
            writeln!(out, "{}", format_edge(edge))?;
        }

        Ok(())
    }
}
