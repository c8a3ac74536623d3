//! Configuration management for the DKH admin dashboard

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Web server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Which backend implementation to use
    #[serde(default)]
    pub backend: BackendConfig,

    /// Firebase project settings (used when `backend.kind = "firebase"`)
    #[serde(default)]
    pub firebase: FirebaseConfig,

    /// In-memory backend settings (used when `backend.kind = "memory"`)
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Dashboard presentation settings
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted Firebase project (Identity Toolkit + Firestore REST)
    Firebase,
    /// In-process store, for local development and demos
    #[default]
    Memory,
}

/// Backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend implementation
    #[serde(default)]
    pub kind: BackendKind,
}

/// Firebase project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Web API key of the Firebase project
    #[serde(default)]
    pub api_key: String,

    /// Project identifier
    #[serde(default)]
    pub project_id: String,

    /// Firestore database identifier
    #[serde(default = "default_database_id")]
    pub database_id: String,

    /// Identity Toolkit base URL
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Firestore REST base URL
    #[serde(default = "default_firestore_url")]
    pub firestore_url: String,

    /// Interval between collection polls for live subscriptions, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// In-memory backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Operator account email
    #[serde(default = "default_operator_email")]
    pub operator_email: String,

    /// Operator account password
    #[serde(default = "default_operator_password")]
    pub operator_password: String,

    /// Seed the default collection with sample consultations
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
}

/// Dashboard presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Collection shown when the dashboard opens
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Abbreviation printed after formatted timestamps
    #[serde(default = "default_zone_label")]
    pub zone_label: String,

    /// Offset of the display zone from UTC, in minutes
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_database_id() -> String {
    "(default)".to_string()
}

fn default_auth_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

const fn default_poll_interval_ms() -> u64 {
    2_000
}

const fn default_request_timeout() -> u64 {
    30
}

fn default_operator_email() -> String {
    "admin@example.com".to_string()
}

fn default_operator_password() -> String {
    "change-me".to_string()
}

const fn default_seed_demo_data() -> bool {
    true
}

fn default_collection() -> String {
    "consultations".to_string()
}

fn default_zone_label() -> String {
    "UTC".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            database_id: default_database_id(),
            auth_url: default_auth_url(),
            firestore_url: default_firestore_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            operator_email: default_operator_email(),
            operator_password: default_operator_password(),
            seed_demo_data: default_seed_demo_data(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            zone_label: default_zone_label(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Largest UTC offset accepted for the display zone, in minutes
const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

impl Config {
    /// Load configuration from an optional `config.*` file in the working
    /// directory and `DKH_`-prefixed environment variables
    /// (for example `DKH_FIREBASE__API_KEY`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        Self::build(
            config::Config::builder()
                .add_source(config::File::with_name("config").required(false)),
        )
    }

    /// Load configuration from an explicit file, still honouring environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        Self::build(config::Config::builder().add_source(config::File::from(path)))
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> crate::Result<Self> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("DKH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check values that serde defaults cannot guard.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field.
    pub fn validate(&self) -> crate::Result<()> {
        if self.backend.kind == BackendKind::Firebase {
            if self.firebase.api_key.trim().is_empty() {
                return Err(crate::Error::validation(
                    "firebase.api_key",
                    "required when backend.kind = \"firebase\"",
                ));
            }
            if self.firebase.project_id.trim().is_empty() {
                return Err(crate::Error::validation(
                    "firebase.project_id",
                    "required when backend.kind = \"firebase\"",
                ));
            }
            if self.firebase.poll_interval_ms == 0 {
                return Err(crate::Error::validation(
                    "firebase.poll_interval_ms",
                    "must be greater than zero",
                ));
            }
        }

        if self.dashboard.collection.trim().is_empty() {
            return Err(crate::Error::validation(
                "dashboard.collection",
                "must not be empty",
            ));
        }

        if self.dashboard.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(crate::Error::validation(
                "dashboard.utc_offset_minutes",
                format!("must be within +/-{MAX_UTC_OFFSET_MINUTES}"),
            ));
        }

        if !matches!(self.logging.format.as_str(), "json" | "text") {
            return Err(crate::Error::validation(
                "logging.format",
                "must be \"json\" or \"text\"",
            ));
        }

        Ok(())
    }
}
