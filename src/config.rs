use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ExtractorError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source code parsing configuration
    pub parsing: ParsingConfig,

    /// Repository search configuration
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Maximum file size to parse (in bytes)
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether repository walks honor .gitignore files
    pub respect_gitignore: bool,

    /// Whether repository walks descend into hidden directories
    pub include_hidden: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parsing: ParsingConfig {
                max_file_size: 1024 * 1024, // 1MB
            },
            search: SearchConfig {
                respect_gitignore: true,
                include_hidden: false,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ExtractorError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = ["mcextract.toml", ".mcextract.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}
