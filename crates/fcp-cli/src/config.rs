//! Configuration system for the FCP CLI.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Node endpoint configuration
    pub node: NodeConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Node endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node hostname
    #[serde(default = "default_host")]
    pub host: String,
    /// FCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client name registered with the node; must be unique per node
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (tracing env-filter syntax)
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default values

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    fcp_client::fcp_proto::DEFAULT_PORT
}

fn default_client_name() -> String {
    "fcp-cli".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_name: default_client_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("fcp/config.toml")
    }

    /// Load config from default path, or create default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if reading or creating the config fails.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            let config = Self::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.node.host.is_empty() {
            anyhow::bail!("Node host must not be empty");
        }
        if self.node.port == 0 {
            anyhow::bail!("Node port must not be 0");
        }
        if self.node.client_name.is_empty() {
            anyhow::bail!("Client name must not be empty");
        }
        Ok(())
    }
}
