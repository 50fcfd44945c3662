/// Config file loading and creation for the batchrank CLI.
///
/// Config lives at ~/.config/batchrank/config.toml.
/// All fields are optional. CLI args override config values.
use anyhow::{bail, Context, Result};
use batchrank_core::GroupingStrategy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BatchrankConfig {
    pub group_size: Option<usize>,
    pub max_rounds: Option<usize>,
    pub confidence_threshold: Option<f64>,
    pub strategy: Option<String>,
    pub seed: Option<u64>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# batchrank configuration
# All values here can be overridden by CLI flags.

# Items shown per group (at least 2). First place in a group earns this many points.
# group_size = 5

# Hard cap on rounds.
# max_rounds = 20

# Stop early once average confidence reaches this value, in (0, 1].
# confidence_threshold = 0.9

# Grouping strategy: \"adaptive\" (least settled items first after round one)
# or \"score-only\" (always group by current score).
# strategy = \"adaptive\"

# Fix the shuffle seed for reproducible sessions.
# seed = 42
";

/// Returns the default config path: ~/.config/batchrank/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("batchrank").join("config.toml"))
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> Result<BatchrankConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BatchrankConfig::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read config at {}", path.display())),
    }
}

/// Create the default config file. Errors if it already exists.
pub fn create_default_config() -> Result<PathBuf> {
    let path = config_path()?;

    if path.exists() {
        bail!("Config file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(path)
}

/// Parse a strategy name as accepted by `--strategy` and the config file.
pub fn parse_strategy(name: &str) -> Result<GroupingStrategy> {
    match name {
        "adaptive" => Ok(GroupingStrategy::Adaptive),
        "score-only" => Ok(GroupingStrategy::ScoreOnly),
        other => bail!("Unknown strategy \"{other}\". Use \"adaptive\" or \"score-only\"."),
    }
}
