use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::LinkArgs;

pub const DEFAULT_RESULT_TEMPLATE: &str = "{citing_table}_cite_{cited_table}";

/// Named inputs of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory holding `<table>.parquet` files
    pub data_dir: PathBuf,
    pub citing_tables: Vec<String>,
    pub cited_tables: Vec<String>,
    /// Result table name, with `{citing_table}` and `{cited_table}` placeholders
    pub result_table_template: String,
    /// Also dump each matcher's linkages as JSONL into this directory
    pub keep_intermediates: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            citing_tables: Vec::new(),
            cited_tables: Vec::new(),
            result_table_template: DEFAULT_RESULT_TEMPLATE.to_string(),
            keep_intermediates: None,
        }
    }
}

impl BatchConfig {
    /// Load a TOML batch file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Config file (if any) overridden by whatever was given on the command line
    pub fn from_args(args: &LinkArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(Path::new(path))?,
            None => Self::default(),
        };

        if let Some(dir) = &args.data_dir {
            config.data_dir = PathBuf::from(dir);
        }
        if !args.citing.is_empty() {
            config.citing_tables = args.citing.clone();
        }
        if !args.cited.is_empty() {
            config.cited_tables = args.cited.clone();
        }
        if let Some(template) = &args.result_template {
            config.result_table_template = template.clone();
        }
        if let Some(dir) = &args.keep_intermediates {
            config.keep_intermediates = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.citing_tables.is_empty() {
            anyhow::bail!("No citing tables given");
        }
        if self.cited_tables.is_empty() {
            anyhow::bail!("No cited tables given");
        }
        if self.result_table_template.trim().is_empty() {
            anyhow::bail!("Result table template is empty");
        }

        let pairs = self.citing_tables.len() * self.cited_tables.len();
        if pairs > 1
            && !(self.result_table_template.contains("{citing_table}")
                && self.result_table_template.contains("{cited_table}"))
        {
            warn!(
                "Result table template {:?} does not name both tables; {} pairs may overwrite each other",
                self.result_table_template, pairs
            );
        }
        Ok(())
    }

    /// Result table name for one pair
    pub fn result_table_name(&self, citing_table: &str, cited_table: &str) -> String {
        self.result_table_template
            .replace("{citing_table}", citing_table)
            .replace("{cited_table}", cited_table)
    }

    /// (citing, cited) pairs in processing order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.citing_tables.iter().flat_map(move |citing| {
            self.cited_tables
                .iter()
                .map(move |cited| (citing.as_str(), cited.as_str()))
        })
    }
}
