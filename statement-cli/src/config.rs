use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use statement_extract::Provider;
use statement_ingest::{BatchSize, DEFAULT_BATCH_SIZE};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::ensure_app_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub run: RunSection,
    pub projects: ProjectsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: Provider,
    /// Empty means the provider's default model
    pub model: String,
    /// Empty means the provider's public endpoint
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: String::new(),
            base_url: String::new(),
            temperature: 0.1,
            max_tokens: 8192,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Rows per extraction call
    pub batch_size: usize,
    /// Per-batch time limit in seconds; 0 disables it
    pub batch_timeout_secs: u64,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_timeout_secs: 0,
        }
    }
}

impl RunSection {
    pub fn batch_size(&self) -> Result<BatchSize> {
        BatchSize::new(self.batch_size).context("invalid run.batch_size in config.toml")
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        (self.batch_timeout_secs > 0).then(|| Duration::from_secs(self.batch_timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProjectsSection {
    /// Project list used until the user saves their own
    pub seed: Vec<String>,
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_app_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    println!("# {}", config_path()?.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
