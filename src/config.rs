use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Award Flow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AwardFlowConfig {
    /// Where award bundles are stored
    pub storage: StorageConfig,
    /// Notification delivery settings
    pub notifications: NotificationConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per award bundle
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// Hostname used to build award links in notification bodies
    pub url_hostname: String,
    /// From address on outgoing mail
    pub from_address: String,
    /// Compliance recipients for PHS funded notifications
    pub phs_funded_recipients: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level filter (overridden by RUST_LOG)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
}

impl Default for AwardFlowConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: ".award-flow/awards".to_string(),
            },
            notifications: NotificationConfig {
                url_hostname: "http://localhost:8000".to_string(),
                from_address: "award-flow@example.edu".to_string(),
                phs_funded_recipients: Vec::new(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl AwardFlowConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (award-flow.toml, .award-flow-rc)
    /// 3. Environment variables (prefixed with AWARD_FLOW_)
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&AwardFlowConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new("award-flow.toml").exists() {
            builder = builder.add_source(File::with_name("award-flow"));
        }

        if Path::new(".award-flow-rc").exists() {
            builder = builder.add_source(File::with_name(".award-flow-rc"));
        }

        builder = builder.add_source(
            Environment::with_prefix("AWARD_FLOW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
