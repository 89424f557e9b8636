//! YAML configuration for the convert command.
//!
//! Every key is optional; command-line flags take precedence.
//!
//! ```yaml
//! input: sakila-dump.sql
//! output: sakila-converted-to-postgres.sql
//! reset_sequences: true
//! schema: public
//! single_transaction: false
//! strict: false
//! header: true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertYamlConfig {
    /// Input dump
    pub input: Option<PathBuf>,
    /// Output SQL file
    pub output: Option<PathBuf>,
    /// Emit sequence resets for SERIAL keys
    pub reset_sequences: Option<bool>,
    /// Schema used to qualify sequence resets
    pub schema: Option<String>,
    /// Drop the dump's own COMMIT
    pub single_transaction: Option<bool>,
    /// Fail if any warning is raised
    pub strict: Option<bool>,
    /// Prepend a comment header
    pub header: Option<bool>,
}

impl ConvertYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Resolve relative paths against the directory holding the config file.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.input = self.input.map(resolve);
        self.output = self.output.map(resolve);
        self
    }
}
