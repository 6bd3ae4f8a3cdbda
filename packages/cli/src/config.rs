use redline_engine::PatchOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "redline.config.json";

/// Redline configuration file format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Author attributed on every tracked change
    #[serde(default = "default_author")]
    pub author: String,

    /// Identity of the first tracked change
    #[serde(default = "default_first_change_id")]
    pub first_change_id: u64,

    /// Render apostrophes in inserted text as U+2019
    #[serde(default = "default_typographic_apostrophes")]
    pub typographic_apostrophes: bool,
}

fn default_author() -> String {
    PatchOptions::default().author
}

fn default_first_change_id() -> u64 {
    PatchOptions::default().first_identity
}

fn default_typographic_apostrophes() -> bool {
    PatchOptions::default().typographic_apostrophes
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.patch_options(None).validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Patch options for a run, with an optional author override
    pub fn patch_options(&self, author: Option<&str>) -> PatchOptions {
        PatchOptions {
            author: author.unwrap_or(&self.author).to_string(),
            first_identity: self.first_change_id,
            timestamp: None,
            typographic_apostrophes: self.typographic_apostrophes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            author: default_author(),
            first_change_id: default_first_change_id(),
            typographic_apostrophes: default_typographic_apostrophes(),
        }
    }
}
