// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Share Configuration Types
//
// Defines the configuration schema for a LAN share node:
// - Kubernetes-style manifest format (apiVersion/kind/spec)
// - Listener settings and the index page
// - Shared storage directory location
// - Upload ceilings
// - Access gate ranges and reachability probing

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::access::{PrivateRangeSet, RangeParseError, DEFAULT_PRIVATE_RANGES};
use crate::domain::upload::UploadLimits;

pub const API_VERSION: &str = "lanshare/v1";
pub const KIND: &str = "ShareConfig";
pub const CONFIG_PATH_ENV: &str = "LANSHARE_CONFIG_PATH";

/// Top-level configuration manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareConfigManifest {
    /// API version (must be "lanshare/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ShareConfig")
    pub kind: String,

    #[serde(default)]
    pub spec: ShareConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub limits: UploadLimits,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, or "auto" for the first non-loopback IPv4 interface
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Page served at `/`
    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Shared directory; relative paths resolve against the working directory
    #[serde(default = "default_storage_directory")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// CIDR blocks allowed through the access gate
    #[serde(default = "default_allowed_ranges")]
    pub allowed_ranges: Vec<String>,

    /// Take the client address from `X-Forwarded-For` instead of the peer
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "auto".to_string()
}

fn default_port() -> u16 {
    8088
}

fn default_index_file() -> PathBuf {
    PathBuf::from("index.html")
}

fn default_storage_directory() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_allowed_ranges() -> Vec<String> {
    DEFAULT_PRIVATE_RANGES.iter().map(|r| r.to_string()).collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            index_file: default_index_file(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_storage_directory(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            allowed_ranges: default_allowed_ranges(),
            trust_forwarded_for: false,
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for ShareConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            spec: ShareConfigSpec::default(),
        }
    }
}

impl ShareConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Candidate locations, in precedence order, after the explicit `--config` flag
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("./lanshare.yaml"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".lanshare").join("config.yaml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/lanshare/config.yaml"));
        #[cfg(windows)]
        paths.push(PathBuf::from("C:\\ProgramData\\LanShare\\config.yaml"));

        paths
    }

    /// Discover configuration file using precedence order
    /// 1. LANSHARE_CONFIG_PATH environment variable
    /// 2. ./lanshare.yaml (working directory)
    /// 3. ~/.lanshare/config.yaml (user home)
    /// 4. /etc/lanshare/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must load
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(&config_path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", config_path, e)
            })?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("LANSHARE_STORAGE_DIR") {
            tracing::info!("Environment override: LANSHARE_STORAGE_DIR={}", dir);
            self.spec.storage.directory = PathBuf::from(dir);
        }

        if let Some(port) = lookup("LANSHARE_PORT") {
            match port.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: LANSHARE_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for LANSHARE_PORT: '{}'. Ignoring.", port);
                }
            }
        }

        if let Some(val) = lookup("LANSHARE_PROBE_ENABLED") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: LANSHARE_PROBE_ENABLED=true");
                    self.spec.probe.enabled = true;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: LANSHARE_PROBE_ENABLED=false");
                    self.spec.probe.enabled = false;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for LANSHARE_PROBE_ENABLED: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Parse the configured ranges into the gate's range set
    pub fn range_set(&self) -> Result<PrivateRangeSet, RangeParseError> {
        PrivateRangeSet::parse(&self.spec.network.allowed_ranges)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.spec.storage.directory.as_os_str().is_empty() {
            anyhow::bail!("spec.storage.directory cannot be empty");
        }

        if self.spec.server.bind_address.trim().is_empty() {
            anyhow::bail!("spec.server.bind_address cannot be empty");
        }

        let limits = &self.spec.limits;
        if limits.max_file_bytes == 0 || limits.max_total_bytes == 0 || limits.max_request_bytes == 0 {
            anyhow::bail!("spec.limits values must be greater than zero");
        }

        if limits.max_file_bytes > limits.max_total_bytes {
            anyhow::bail!(
                "spec.limits.max_file_bytes ({}) exceeds spec.limits.max_total_bytes ({})",
                limits.max_file_bytes,
                limits.max_total_bytes
            );
        }

        if limits.max_request_bytes < limits.max_file_bytes {
            anyhow::bail!(
                "spec.limits.max_request_bytes ({}) is smaller than spec.limits.max_file_bytes ({})",
                limits.max_request_bytes,
                limits.max_file_bytes
            );
        }

        if self.spec.network.allowed_ranges.is_empty() {
            anyhow::bail!("spec.network.allowed_ranges must list at least one CIDR block");
        }

        self.range_set()?;

        Ok(())
    }
}
