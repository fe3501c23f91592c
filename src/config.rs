use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8000;
const CONFIG_DIR: &str = "config";
const DEFAULT_CHANNEL_MANAGER_URL: &str = "https://pms.shalom.com.tw/api/cm/channel/inventory/";
const DEFAULT_CHANNEL_MANAGER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FETCH_HORIZON_DAYS: i64 = 180;
const DEFAULT_WEEKS_BACK: i64 = 12;
const DEFAULT_WEEKS_AHEAD: i64 = 13;

/// Credentials and endpoint of the upstream channel manager
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ChannelManagerConfig {
    /// Inventory endpoint queried with GET
    #[serde(default = "default_channel_manager_url")]
    #[validate(url)]
    pub base_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub echo_token: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_channel_manager_timeout_secs")]
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
}

impl Default for ChannelManagerConfig {
    fn default() -> Self {
        Self {
            base_url: default_channel_manager_url(),
            username: String::new(),
            password: String::new(),
            echo_token: String::new(),
            request_timeout_secs: default_channel_manager_timeout_secs(),
        }
    }
}

/// Window used by the background weekly update
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct WeeklyUpdateConfig {
    /// Days of upstream inventory fetched starting today
    #[serde(default = "default_fetch_horizon_days")]
    #[validate(range(min = 1, max = 730))]
    pub fetch_horizon_days: i64,

    /// Weeks before the current week that get recalculated
    #[serde(default = "default_weeks_back")]
    #[validate(range(min = 0, max = 104))]
    pub weeks_back: i64,

    /// Weeks after the current week that get recalculated
    #[serde(default = "default_weeks_ahead")]
    #[validate(range(min = 0, max = 104))]
    pub weeks_ahead: i64,
}

impl Default for WeeklyUpdateConfig {
    fn default() -> Self {
        Self {
            fetch_horizon_days: default_fetch_horizon_days(),
            weeks_back: default_weeks_back(),
            weeks_ahead: default_weeks_ahead(),
        }
    }
}

/// Process configuration, layered from defaults, TOML files and `APP__*` variables
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub database_url: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `development` enables permissive CORS
    pub environment: String,

    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,

    /// Apply the embedded migrator before serving
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    /// Comma separated origins for the dashboard front end
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
    #[serde(default)]
    pub cors_allow_any_origin: bool,
    #[serde(default)]
    pub cors_allow_credentials: bool,

    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    #[validate(range(min = 1))]
    pub db_min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default)]
    #[validate]
    pub channel_manager: ChannelManagerConfig,

    /// Hotel id to display name
    #[serde(default = "default_hotels")]
    pub hotels: HashMap<String, String>,

    #[serde(default)]
    #[validate]
    pub weekly_update: WeeklyUpdateConfig,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: true,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            channel_manager: ChannelManagerConfig::default(),
            hotels: default_hotels(),
            weekly_update: WeeklyUpdateConfig::default(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Explicit origins, blanks dropped
    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Permissive CORS is only used in development or when opted into
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Field rules plus the constraints spanning several fields
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;

        let mut errors = ValidationErrors::new();
        if !self.should_allow_permissive_cors() && self.cors_origins().is_empty() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "set APP__CORS_ALLOWED_ORIGINS outside development, or APP__CORS_ALLOW_ANY_ORIGIN=true"
                    .into(),
            );
            errors.add("cors_allowed_origins", err);
        }
        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections_exceeds_max");
            err.message = Some("db_min_connections must not exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true_bool() -> bool {
    true
}

fn default_db_max_connections() -> u32 {
    20
}
fn default_db_min_connections() -> u32 {
    5
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_channel_manager_url() -> String {
    DEFAULT_CHANNEL_MANAGER_URL.to_string()
}

fn default_channel_manager_timeout_secs() -> u64 {
    DEFAULT_CHANNEL_MANAGER_TIMEOUT_SECS
}

fn default_fetch_horizon_days() -> i64 {
    DEFAULT_FETCH_HORIZON_DAYS
}

fn default_weeks_back() -> i64 {
    DEFAULT_WEEKS_BACK
}

fn default_weeks_ahead() -> i64 {
    DEFAULT_WEEKS_AHEAD
}

/// Properties known to the reporting dashboard
pub fn default_hotels() -> HashMap<String, String> {
    [
        ("2436", "霧繞"),
        ("2799", "霧語"),
        ("2155", "山中靜靜"),
        ("2656", "暖硫"),
    ]
    .into_iter()
    .map(|(id, name)| (id.to_string(), name.to_string()))
    .collect()
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    level
        .parse::<tracing::Level>()
        .map(|_| ())
        .map_err(|_| {
            let mut err = ValidationError::new("log_level");
            err.message = Some("expected trace, debug, info, warn or error".into());
            err
        })
}

/// Installs the global subscriber; `RUST_LOG` takes precedence over `level`
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("hotel_inventory_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads `config/default.toml`, then `config/{RUN_ENV}.toml`, then `APP__*` variables
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Loads configuration, reading TOML files from `config_dir`
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    if !config_dir.exists() {
        info!(
            dir = %config_dir.display(),
            "No config directory, using defaults and environment only"
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://hotel_inventory.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate_all().map_err(|e| {
        error!(errors = ?e, "Configuration rejected");
        AppConfigError::Validation(e)
    })?;

    info!(
        environment = %app_config.environment,
        hotels = app_config.hotels.len(),
        "Configuration loaded"
    );
    Ok(app_config)
}
