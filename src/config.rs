use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::agents::visualizer::Mode;
use crate::error::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,

    /// Vision-language model used by retriever, planner, stylist and critic
    pub vlm_model: String,

    /// Image generation model used by the visualizer in diagram mode
    pub image_model: String,

    pub api_key_env: Option<String>,

    /// Override the API root (tests, proxies)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Optional: Override max output tokens for text requests
    /// If not specified, uses DEFAULT_MAX_TOKENS
    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_thinking_level")]
    pub thinking_level: String,

    /// Thinking level for plot-code generation
    #[serde(default = "default_plot_thinking_level")]
    pub plot_thinking_level: String,

    #[serde(default = "default_image_size")]
    pub image_size: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_thinking_level() -> String {
    "HIGH".to_string()
}

fn default_plot_thinking_level() -> String {
    "MEDIUM".to_string()
}

fn default_image_size() -> String {
    "1K".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

pub const DEFAULT_MAX_TOKENS: u32 = 8192;

impl LlmConfig {
    pub fn get_max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// "diagram" or "plot"
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Upper bound on visualize/critique rounds
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_num_reference_examples")]
    pub num_reference_examples: usize,

    /// Path to a reference-set JSON file
    #[serde(default)]
    pub reference_set: Option<String>,

    /// Drop references whose image file is missing on disk
    #[serde(default)]
    pub require_reference_images: bool,
}

fn default_mode() -> String {
    "diagram".to_string()
}

pub const DEFAULT_MAX_ITERATIONS: usize = 3;

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_num_reference_examples() -> usize {
    10
}

impl GenerationConfig {
    pub fn get_mode(&self) -> Result<Mode> {
        self.mode.parse()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            max_iterations: default_max_iterations(),
            num_reference_examples: default_num_reference_examples(),
            reference_set: None,
            require_reference_images: false,
        }
    }
}

/// Extra instructions appended to each agent's built-in prompt.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptsConfig {
    /// Replace the built-in aesthetic guidelines with this file's contents
    #[serde(default)]
    pub guidelines_file: Option<String>,

    #[serde(default)]
    pub retriever_custom: Option<String>,
    #[serde(default)]
    pub planner_custom: Option<String>,
    #[serde(default)]
    pub stylist_custom: Option<String>,
    #[serde(default)]
    pub visualizer_custom: Option<String>,
    #[serde(default)]
    pub critic_custom: Option<String>,
}

impl Config {
    /// Load configuration from a specific path, or use default search paths
    pub fn load_with_path(path: Option<String>) -> Result<Self> {
        if let Some(config_path) = path {
            debug!("Loading config from explicit path: {}", config_path);
            return Self::load_from_path(&config_path);
        }

        let mut candidates = vec![PathBuf::from("paperbanana.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("paperbanana").join("config.toml"));
        }
        if let Some(config) = Self::load_first_existing(&candidates) {
            return Ok(config);
        }

        debug!("Using default config");
        Ok(Self::default())
    }

    /// First candidate that exists and parses. A file that exists but fails
    /// to load is reported and skipped.
    fn load_first_existing(candidates: &[PathBuf]) -> Option<Self> {
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_path(path) {
                Ok(config) => {
                    debug!("Loaded config from {}", path.display());
                    return Some(config);
                }
                Err(e) => warn!("Ignoring config {}: {:#}", path.display(), e),
            }
        }
        None
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Get API key from environment variable specified in config
    pub fn get_api_key(&self) -> Result<String> {
        resolve_api_key(&self.llm)
    }
}

pub(crate) fn resolve_api_key(llm: &LlmConfig) -> Result<String> {
    match &llm.api_key_env {
        Some(env_var) => {
            if env_var.eq_ignore_ascii_case("none") {
                return Ok(String::new());
            }
            match env::var(env_var) {
                Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
                _ => Err(PipelineError::MissingApiKey(env_var.clone()).into()),
            }
        }
        None => Ok(String::new()),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: "gemini".to_string(),
                vlm_model: "gemini-3-pro-preview".to_string(),
                image_model: "gemini-3-pro-image-preview".to_string(),
                api_key_env: Some("GEMINI_API_KEY".to_string()),
                base_url: None,
                max_tokens: None,
                thinking_level: default_thinking_level(),
                plot_thinking_level: default_plot_thinking_level(),
                image_size: default_image_size(),
                timeout_secs: default_timeout_secs(),
            },
            generation: GenerationConfig::default(),
            prompts: PromptsConfig::default(),
        }
    }
}
