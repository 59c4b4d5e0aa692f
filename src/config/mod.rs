mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:6789";
pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub backend_url: String,
    pub interval_secs: u64,
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    pub interval_secs: u64,
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let backend_url = file.backend_url.unwrap_or_else(|| cli.backend_url.clone());
        let interval_secs = file.interval_secs.unwrap_or(cli.interval_secs);
        let page_size = file.page_size.unwrap_or(cli.page_size);
        let timeout_secs = file.timeout_secs.unwrap_or(cli.timeout_secs);

        if backend_url.trim().is_empty() {
            bail!("backend_url must not be empty");
        }
        if page_size == 0 {
            bail!("page_size must be greater than zero");
        }
        if timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }

        Ok(Self {
            backend_url,
            interval_secs,
            page_size,
            timeout_secs,
        })
    }
}
