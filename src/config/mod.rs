use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_AUDIO_FORMAT_ID: &str = "140";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ToolsConfig {
    pub ytdlp: String,
    pub ffmpeg: String,
    pub metadata_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ytdlp: "yt-dlp".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            metadata_timeout_secs: 60,
            download_timeout_secs: 900,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadsConfig {
    pub scratch_dir: PathBuf,
    pub max_concurrent_jobs: usize,
    pub default_audio_format_id: String,
    /// Startup sweep only removes scratch files older than this.
    pub stale_after_secs: u64,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("mediarelay"),
            max_concurrent_jobs: 4,
            default_audio_format_id: DEFAULT_AUDIO_FORMAT_ID.to_string(),
            stale_after_secs: 3600,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PassthroughConfig {
    /// Hosts the passthrough endpoints may fetch from. Empty allows any host.
    pub allowed_hosts: Vec<String>,
    pub connect_timeout_secs: u64,
}

impl Default for PassthroughConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            connect_timeout_secs: 15,
        }
    }
}

impl PassthroughConfig {
    pub fn is_host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        let host = host.to_ascii_lowercase();
        self.allowed_hosts.iter().any(|allowed| {
            let allowed = allowed.trim().to_ascii_lowercase();
            host == allowed || host.ends_with(&format!(".{allowed}"))
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tools: ToolsConfig,
    pub downloads: DownloadsConfig,
    pub passthrough: PassthroughConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.downloads.max_concurrent_jobs == 0 {
            anyhow::bail!("downloads.max_concurrent_jobs must be at least 1");
        }
        if self.downloads.default_audio_format_id.trim().is_empty() {
            anyhow::bail!("downloads.default_audio_format_id must not be empty");
        }
        Ok(())
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
