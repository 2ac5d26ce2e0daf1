//! batchsubmit configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project-local config file name
const LOCAL_CONFIG: &str = "batchsubmit.yml";

/// Main batchsubmit configuration
///
/// Resolved once at startup and then passed by reference; nothing mutates it
/// after the run begins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Concurrency and retry budget
    pub run: RunConfig,

    /// Input and output file paths
    pub files: FilesConfig,

    /// Remote node settings
    pub rpc: RpcConfig,

    /// The Move call each task submits
    pub call: CallConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.run.concurrency == 0 {
            return Err(eyre::eyre!("run.concurrency must be at least 1"));
        }
        if self.files.credentials.as_os_str().is_empty() {
            return Err(eyre::eyre!("files.credentials must be set"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: ./batchsubmit.yml
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/batchsubmit/batchsubmit.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("batchsubmit").join(LOCAL_CONFIG);
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed here; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = [
            config_path.cloned(),
            Some(PathBuf::from(LOCAL_CONFIG)),
            dirs::config_dir().map(|d| d.join("batchsubmit").join(LOCAL_CONFIG)),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(&p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Concurrency and retry budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum tasks executing at once
    pub concurrency: usize,

    /// Retries after the first attempt for non-rate-limit failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Wait after a rate-limit signal, in milliseconds
    #[serde(rename = "cooldown-ms")]
    pub cooldown_ms: u64,

    /// Optional cap on rate-limit retries per task (absent = unbounded)
    #[serde(rename = "rate-limit-ceiling", skip_serializing_if = "Option::is_none")]
    pub rate_limit_ceiling: Option<u32>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 20,
            max_retries: 5,
            cooldown_ms: 2000,
            rate_limit_ceiling: None,
        }
    }
}

impl RunConfig {
    /// Get the cooldown as a Duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Input and output file paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// One credential per line
    pub credentials: PathBuf,

    /// One proxy URI per line; a missing file means direct egress
    pub proxies: PathBuf,

    /// Append-only `address:credential` log of successes
    pub success: PathBuf,

    /// Append-only `address:credential` log of failures
    pub fail: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            credentials: PathBuf::from("priv.txt"),
            proxies: PathBuf::from("proxies.txt"),
            success: PathBuf::from("success.txt"),
            fail: PathBuf::from("fail.txt"),
        }
    }
}

/// Remote node settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint
    pub url: String,

    /// Per-request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Service returning `{"ip": "..."}`, queried once per task through its proxy
    #[serde(rename = "ip-probe-url", skip_serializing_if = "Option::is_none")]
    pub ip_probe_url: Option<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://sui-rpc.publicnode.com".to_string(),
            timeout_ms: 30_000,
            ip_probe_url: Some("https://api.ipify.org?format=json".to_string()),
        }
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The Move call each task submits
///
/// String arguments `{address}` and `{address_last5}` are replaced per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    /// Short description used in progress lines ("mint passport")
    pub label: String,

    pub package: String,

    pub module: String,

    pub function: String,

    #[serde(rename = "type-arguments")]
    pub type_arguments: Vec<String>,

    pub arguments: Vec<serde_json::Value>,

    #[serde(rename = "gas-budget")]
    pub gas_budget: u64,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            label: "mint passport".to_string(),
            package: "0x352919f09a96e8bca46cd2a9015c5651aed4aa3ca270f8c09c96ef670c8ede59".to_string(),
            module: "sui_passport".to_string(),
            function: "mint_passport".to_string(),
            type_arguments: Vec::new(),
            arguments: vec![
                "0xf7bea21283a25287debc250a426a03f68cf9abbf03752094e9072e637058572b".into(),
                "{address_last5}".into(),
                "".into(),
                "".into(),
                "".into(),
                "".into(),
                "".into(),
                "0x4a4317676aa05a8e673dad0b2cc2fbf855b7170b5259340e2b76121bccbe9363".into(),
                "0x0000000000000000000000000000000000000000000000000000000000000006".into(),
            ],
            gas_budget: 10_000_000,
        }
    }
}
