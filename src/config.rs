//! Configuration for the screenshot judge.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{JudgeError, Result};
use crate::llm::Prompts;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "https://api.openai.com")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Vision-capable model name (e.g., "gpt-4-turbo")
    pub model: String,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature; omitted from requests when unset
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Retry settings for scoring requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per pair, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.retry_delay_secs))
    }
}

/// Fixed-delay retry policy used by the score fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// A zero attempt count still makes one attempt.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().policy()
    }
}

/// Prompts sent with every comparison request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// System instruction
    pub system: String,

    /// Rubric-describing user instruction
    pub user: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: Prompts::system().to_string(),
            user: Prompts::rubric().to_string(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM settings
    pub llm: LlmConfig,

    /// Retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Prompt overrides
    #[serde(default)]
    pub prompts: PromptConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    retry: Option<RetryFileSection>,
    prompts: Option<PromptFileSection>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RetryFileSection {
    max_attempts: Option<u32>,
    retry_delay_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PromptFileSection {
    system: Option<String>,
    user: Option<String>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_API_BASE, LLM_API_KEY, LLM_MODEL, JUDGE_MAX_ATTEMPTS, ...)
    /// 2. Config file (~/.config/screenshot-judge/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(api_base) = env::var("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY") {
            self.llm.api_key = api_key;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Ok(max_tokens) = env::var("LLM_MAX_TOKENS") {
            if let Ok(tokens) = max_tokens.parse() {
                self.llm.max_tokens = tokens;
            }
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            if let Ok(temp) = temperature.parse() {
                self.llm.temperature = Some(temp);
            }
        }

        if let Ok(attempts) = env::var("JUDGE_MAX_ATTEMPTS") {
            if let Ok(attempts) = attempts.parse() {
                self.retry.max_attempts = attempts;
            }
        }

        if let Ok(delay) = env::var("JUDGE_RETRY_DELAY_SECS") {
            if let Ok(delay) = delay.parse() {
                self.retry.retry_delay_secs = delay;
            }
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| JudgeError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, filling gaps with defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| JudgeError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(llm) = file_config.llm {
            if let Some(api_base) = llm.api_base {
                config.llm.api_base = api_base;
            }
            if let Some(api_key) = llm.api_key {
                config.llm.api_key = api_key;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            if llm.temperature.is_some() {
                config.llm.temperature = llm.temperature;
            }
            if let Some(timeout) = llm.request_timeout_secs {
                config.llm.request_timeout_secs = timeout;
            }
        }

        if let Some(retry) = file_config.retry {
            if let Some(max_attempts) = retry.max_attempts {
                config.retry.max_attempts = max_attempts;
            }
            if let Some(delay) = retry.retry_delay_secs {
                config.retry.retry_delay_secs = delay;
            }
        }

        if let Some(prompts) = file_config.prompts {
            if let Some(system) = prompts.system {
                config.prompts.system = system;
            }
            if let Some(user) = prompts.user {
                config.prompts.user = user;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "screenshot-judge")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(JudgeError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.api_key.is_empty() {
            return Err(JudgeError::Config(
                "LLM API key is required. Pass --api-key, set LLM_API_KEY or add to config file."
                    .to_string(),
            ));
        }

        if self.llm.model.is_empty() {
            return Err(JudgeError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.prompts.system.trim().is_empty() || self.prompts.user.trim().is_empty() {
            return Err(JudgeError::Config(
                "Both the system and user prompts must be non-empty.".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_llm(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm: LlmConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.api_base, "https://api.openai.com");
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.llm.model, "gpt-4-turbo");
        assert_eq!(config.llm.max_tokens, 300);
        assert_eq!(config.llm.temperature, None);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.retry_delay_secs, 5);
        assert!(config.prompts.user.contains("Layout Consistency"));
    }

    #[test]
    fn test_validate_fails_without_api_key() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_prompt() {
        let mut config = Config::with_llm("https://api.example.com", "key", "gpt-4o");
        assert!(config.validate().is_ok());
        config.prompts.user = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_llm() {
        let config = Config::with_llm("https://api.example.com", "test-key", "gpt-4o");
        assert_eq!(config.llm.api_base, "https://api.example.com");
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_yaml_sections_override_defaults() {
        let yaml = r#"
llm:
  model: gpt-4o
  temperature: 0.2
retry:
  max_attempts: 5
prompts:
  system: "You compare screenshots."
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_base, "https://api.openai.com");
        assert_eq!(config.llm.temperature, Some(0.2));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.retry_delay_secs, 5);
        assert_eq!(config.prompts.system, "You compare screenshots.");
        assert_eq!(config.prompts.user, Prompts::rubric());
    }

    #[test]
    fn test_retry_policy_never_zero_attempts() {
        let policy = RetryConfig {
            max_attempts: 0,
            retry_delay_secs: 2,
        }
        .policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }
}
