use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.pptx".to_string(),
        "**/*.pdf".to_string(),
        "**/*.md".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_corpus_file")]
    pub corpus_file: String,
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            corpus_file: default_corpus_file(),
            media_dir: default_media_dir(),
        }
    }
}

fn default_corpus_file() -> String {
    "search-index.json".to_string()
}

fn default_media_dir() -> String {
    "media".to_string()
}

/// Loads configuration from a TOML file. A missing file yields the
/// defaults so `cmill` works out of the box without one.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.extraction.include_globs.is_empty() {
        anyhow::bail!("extraction.include_globs must not be empty");
    }
    if config.output.corpus_file.trim().is_empty() {
        anyhow::bail!("output.corpus_file must not be empty");
    }

    Ok(config)
}
