use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::http::{Header, TransportOptions, DEFAULT_USER_AGENT};

/// curl transport settings (`[transport]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// TCP connect + TLS handshake timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Abort a request whose throughput stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Hard per-request timeout in seconds (0 = none).
    pub timeout_secs: u64,
    pub max_redirections: u32,
    pub tcp_keepalive: bool,
    /// Explicit proxy URL; when unset curl uses http_proxy/https_proxy/no_proxy.
    pub proxy: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let t = TransportOptions::default();
        Self {
            connect_timeout_secs: t.connect_timeout.as_secs(),
            low_speed_limit: t.low_speed_limit,
            low_speed_time_secs: t.low_speed_time.as_secs(),
            timeout_secs: 0,
            max_redirections: t.max_redirections,
            tcp_keepalive: t.tcp_keepalive,
            proxy: None,
        }
    }
}

/// Extra header entry (`[[headers]]` array in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderConfig {
    pub key: String,
    pub value: String,
}

/// Global configuration loaded from `~/.config/chunkdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkdlConfig {
    /// Chunks in flight at once; unset = 3 x available parallelism clamped to [4, 20].
    pub concurrency: Option<usize>,
    /// Fixed chunk size in bytes; unset = derived from size and concurrency.
    pub chunk_size: Option<u64>,
    pub min_chunk_size: Option<u64>,
    pub max_chunk_size: Option<u64>,
    pub user_agent: String,
    pub headers: Vec<HeaderConfig>,
    pub transport: TransportConfig,
}

impl Default for ChunkdlConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            chunk_size: None,
            min_chunk_size: None,
            max_chunk_size: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
            transport: TransportConfig::default(),
        }
    }
}

impl ChunkdlConfig {
    pub fn transport_options(&self) -> TransportOptions {
        let t = &self.transport;
        TransportOptions {
            connect_timeout: Duration::from_secs(t.connect_timeout_secs),
            low_speed_limit: t.low_speed_limit,
            low_speed_time: Duration::from_secs(t.low_speed_time_secs),
            timeout: (t.timeout_secs > 0).then(|| Duration::from_secs(t.timeout_secs)),
            max_redirections: t.max_redirections,
            tcp_keepalive: t.tcp_keepalive,
            proxy: t.proxy.clone().filter(|p| !p.is_empty()),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn headers(&self) -> Vec<Header> {
        self.headers
            .iter()
            .map(|h| Header::new(h.key.clone(), h.value.clone()))
            .collect()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chunkdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ChunkdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ChunkdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let cfg: ChunkdlConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
