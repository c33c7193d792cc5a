use anyhow::{Context, Result};
use facematch_engine::{CompareOptions, Metric, DEFAULT_THRESHOLD};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("FACEMATCH_CONFIG_PATH").unwrap_or("/usr/local/etc/facematch/config.toml"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Used when a request carries no threshold of its own
    pub threshold: f32,
    pub metric: Metric,
    /// Scale embeddings to unit length before measuring distance
    pub l2_normalize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            metric: Metric::Cosine,
            l2_normalize: false,
        }
    }
}

impl Config {
    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            metric: self.metric,
            l2_normalize: self.l2_normalize,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data).with_context(|| format!("writing config {}", path.display()))?;
    Ok(())
}
