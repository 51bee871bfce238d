use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

/// Which backend answers `/generate`, selected once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    #[default]
    Remote,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_url")]
    pub url: String,
    /// Outbound request timeout. None means the call may block for the
    /// full upstream round-trip.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Hugging Face repo id of the checkpoint to load.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Generation length requested per call into the model.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_length")]
    pub default_max_length: usize,
    /// Stop the chunked loop once a chunk produces no new text.
    #[serde(default)]
    pub early_stop: bool,
    #[serde(default)]
    pub sampling: SamplingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_top_k")]
    pub top_k: Option<usize>,
    #[serde(default = "default_top_p")]
    pub top_p: Option<f64>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_no_repeat_ngram")]
    pub no_repeat_ngram: usize,
    /// Fixed RNG seed; derived from the wall clock when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_remote_url(),
            timeout_secs: None,
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            workers: default_workers(),
            batch_size: default_batch_size(),
            default_max_length: default_max_length(),
            early_stop: false,
            sampling: SamplingConfig::default(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            top_p: default_top_p(),
            temperature: default_temperature(),
            no_repeat_ngram: default_no_repeat_ngram(),
            seed: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_remote_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_model() -> String {
    "mistralai/Mistral-7B-v0.1".to_string()
}

fn default_workers() -> usize {
    5
}

fn default_batch_size() -> usize {
    128
}

fn default_max_length() -> usize {
    100
}

fn default_top_k() -> Option<usize> {
    Some(50)
}

fn default_top_p() -> Option<f64> {
    Some(0.95)
}

fn default_temperature() -> f64 {
    0.7
}

fn default_no_repeat_ngram() -> usize {
    2
}
