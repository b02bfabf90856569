use clap::{Parser, Subcommand};
use config::{Config, ConfigError, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    /// Base URL of the warehouse data API endpoint.
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Provisioned-cluster identity. Unused when running against a
    /// serverless workgroup.
    pub cluster_id: Option<String>,
    pub db_user: Option<String>,
    pub workgroup: Option<String>,
    /// Opaque reference to stored database credentials, resolved by the
    /// warehouse service itself.
    pub secret_arn: String,
    pub database_name: String,
    /// Schema holding the user_profile and booking_data tables.
    #[serde(default = "default_schema_name")]
    pub schema_name: String,
    /// Name given to the external schema created by init-schema.
    #[serde(default = "default_external_schema")]
    pub external_schema: String,
    /// Data-catalog database the external schema maps onto.
    #[serde(default = "default_catalog_database")]
    pub catalog_database: String,
    /// Comma-separated allow list of tables whose contents may be fed to
    /// the model.
    #[serde(default)]
    pub tables_to_be_fed_to_llm: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_schema_name() -> String {
    "travel".to_string()
}

fn default_external_schema() -> String {
    "ext_spectrum".to_string()
}

fn default_catalog_database() -> String {
    "hotelbookingdb".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

impl WarehouseConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn table_list(&self) -> Vec<String> {
        self.tables_to_be_fed_to_llm
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Inference backend, currently "bedrock" only.
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens_to_sample: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_backend() -> String {
    "bedrock".to_string()
}

fn default_model() -> String {
    "anthropic.claude-v2".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f32 {
    1.0
}

fn default_top_k() -> u32 {
    250
}

fn default_top_p() -> f32 {
    0.999
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub warehouse: WarehouseConfig,
    pub llm: LlmConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the external schema mapping over the data catalog
    InitSchema,
    /// Generate a travel itinerary for a user
    Plan {
        /// User identifier to plan for
        user_id: String,
    },
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config_builder = Config::builder();

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/voyage/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        let config: AppConfig = config_builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Checks the cross-field constraints that serde cannot express.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.warehouse.workgroup.is_none() && self.warehouse.cluster_id.is_none() {
            return Err(ConfigError::Message(
                "either warehouse.workgroup or warehouse.cluster_id must be set".to_string(),
            ));
        }
        if self.warehouse.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "warehouse.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
