//! Autonomous brand research agent
//!
//! A language model drives a real Chrome session through a small set of
//! actions (search, click, read, scroll, go back) across search engines and
//! social platforms, then writes a structured sentiment report.

pub mod agent;
mod browser;
pub mod browser_setup;
pub mod engines;
pub mod extraction;
pub mod llm;
pub mod navigation;
pub mod overlay;
pub mod report;
pub mod session;
mod utils;
pub mod web_search;

#[cfg(test)]
mod testing;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "BRAND_RESEARCH_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    /// Directory reports are written to, created on demand
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Ceiling on reasoning calls; absent means run until a final answer
    #[serde(default)]
    pub max_turns: Option<usize>,

    /// File replacing the built-in instruction preamble
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
}

/// Chat-completions provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

/// Browser security and launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Persistent profile holding cookies and logged-in sessions
    #[serde(default = "default_profile_dir")]
    pub profile_dir: PathBuf,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("./reports")
}
fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}
fn default_model() -> String {
    "deepseek-chat".to_string()
}
fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_headless() -> bool {
    // Social platforms challenge headless sessions far more often
    false
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("./nexus_browser_data")
}

fn default_disable_security() -> bool {
    false // SECURE BY DEFAULT
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            browser: BrowserConfig::default(),
            report_dir: default_report_dir(),
            max_turns: None,
            system_prompt_path: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            profile_dir: default_profile_dir(),
            disable_security: default_disable_security(),
            window: WindowConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load config from the file named by `BRAND_RESEARCH_CONFIG`, else from
/// config.yaml in package root, else defaults.
pub fn load_yaml_config() -> Result<Config, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return load_config_from(Path::new(&path));
    }

    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.yaml");
    if config_path.exists() {
        load_config_from(&config_path)
    } else {
        Ok(Config::default())
    }
}

/// Load config from an explicit YAML file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub use agent::{AgentError, Orchestrator, RunSummary};
pub use browser::{
    BrowserError, BrowserResult, BrowserWrapper, ChromePage, Locator, PageDriver,
    download_managed_browser, find_browser_executable, launch_browser, open_session_page,
};
pub use llm::{ChatCompletionsClient, ReasoningProvider};
pub use session::ResearchSession;
