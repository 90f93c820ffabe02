//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// LLM provider kind.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Claude,
    Gemini,
}

/// Configuration for the LLM client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider to use (claude or gemini).
    #[serde(default)]
    pub provider: ProviderKind,
    /// Model to use for completions.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Base URL for the API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable name for the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f64 {
    0.7
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Configuration for the knowledge store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the JSON documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eumicus")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Configuration for content fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    /// Cap on stored raw content length, in characters.
    #[serde(default = "default_max_content_len")]
    pub max_content_len: usize,
    /// Content cache time-to-live in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,
    /// Pause between items in batch processing, in seconds.
    #[serde(default = "default_batch_delay_secs")]
    pub batch_delay_secs: u64,
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_max_content_len() -> usize {
    8000
}

fn default_cache_ttl_secs() -> i64 {
    86400
}

fn default_batch_delay_secs() -> u64 {
    2
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            max_content_len: default_max_content_len(),
            cache_ttl_secs: default_cache_ttl_secs(),
            batch_delay_secs: default_batch_delay_secs(),
        }
    }
}

/// Configuration for the web API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether to enable permissive CORS.
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_permissive() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: default_cors_permissive(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EumicusConfig {
    pub llm: LlmConfig,
    pub store: StoreConfig,
    pub fetch: FetchConfig,
    pub server: ServerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, ProviderKind::Claude);
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_llm_config_deserialize_gemini() {
        let toml = r#"
            provider = "gemini"
            model = "gemini-2.0-flash"
            max_tokens = 2048
            base_url = "https://generativelanguage.googleapis.com/v1beta"
            api_key_env = "GEMINI_API_KEY"
        "#;
        let config: LlmConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_tokens, 2048);
    }

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.max_content_len, 8000);
        assert_eq!(config.cache_ttl_secs, 86400);
        assert_eq!(config.batch_delay_secs, 2);
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.cors_permissive);
    }

    #[test]
    fn test_top_level_config_partial_toml() {
        let toml = r#"
            [llm]
            provider = "gemini"

            [server]
            port = 8080
        "#;
        let config: EumicusConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.llm.provider, ProviderKind::Gemini);
        assert_eq!(config.server.port, 8080);
        // Untouched sections keep their defaults.
        assert_eq!(config.fetch.max_content_len, 8000);
    }
}
