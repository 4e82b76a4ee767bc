//! @acp:module "Configuration"
//! @acp:summary "User configuration loading and defaults"
//! @acp:domain cli
//! @acp:layer config
//!
//! User-level settings loaded from `<config_dir>/so/config.json`. Every
//! field has a default, so a partial file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Host DNS backend settings
    #[serde(default)]
    pub dns: DnsConfig,

    /// Docker binaries and global container names
    #[serde(default)]
    pub docker: DockerConfig,
}

impl Config {
    /// Load config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load config, falling back to defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("so").join("config.json"))
            .unwrap_or_else(|| PathBuf::from(".so.config.json"))
    }
}

/// Resolver file locations and the nameserver the DNS proxy listens on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Loopback nameserver served by the container DNS proxy
    pub nameserver: String,

    pub systemd_resolved_conf: PathBuf,

    /// Resolver file systemd-resolved generates at runtime
    pub systemd_runtime_resolv_conf: PathBuf,

    /// The system resolver symlink
    pub system_resolv_conf: PathBuf,

    /// resolvconf head file, prepended to the generated resolv.conf
    pub resolvconf_head: PathBuf,

    /// Replacement for the bundled resolved.conf template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_template: Option<PathBuf>,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            nameserver: "127.0.0.1".to_string(),
            systemd_resolved_conf: PathBuf::from("/etc/systemd/resolved.conf"),
            systemd_runtime_resolv_conf: PathBuf::from("/run/systemd/resolve/resolv.conf"),
            system_resolv_conf: PathBuf::from("/etc/resolv.conf"),
            resolvconf_head: PathBuf::from("/etc/resolvconf/resolv.conf.d/head"),
            resolved_template: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerConfig {
    pub binary: String,
    pub compose_binary: String,

    /// Network shared by the global proxy and project containers
    pub network: String,

    pub proxy_container: String,
    pub ngrok_image: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            compose_binary: "docker-compose".to_string(),
            network: "global_proxy".to_string(),
            proxy_container: "tribe-proxy".to_string(),
            ngrok_image: "wernight/ngrok".to_string(),
        }
    }
}
