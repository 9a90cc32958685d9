use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub sizing: SizingConfig,
    pub measurement: MeasurementConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub static_dir: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Default)]
pub struct SizingConfig {
    pub dataset_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct MeasurementConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub storage_backend: Option<StorageBackend>,
    pub database_url: Option<String>,
    pub dataset_path: Option<PathBuf>,
    pub measurement_endpoint: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

/// Environment keys read for `server.port`, in precedence order.
pub const SERVER_PORT_ENV_KEYS: &[&str] = &["LASTFIT_SERVER_PORT", "PORT"];
pub const LOGGING_LEVEL_ENV_KEYS: &[&str] = &["LASTFIT_LOGGING_LEVEL", "LASTFIT_LOG_LEVEL"];
pub const LOGGING_FORMAT_ENV_KEYS: &[&str] = &["LASTFIT_LOGGING_FORMAT", "LASTFIT_LOG_FORMAT"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
                static_dir: None,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database_url: "sqlite://lastfit.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            sizing: SizingConfig::default(),
            measurement: MeasurementConfig { endpoint: None, api_key: None, timeout_secs: 30 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Validation(format!(
                "unsupported storage backend `{other}` (expected memory|sqlite)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("lastfit.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(static_dir) = server.static_dir {
                self.server.static_dir = Some(static_dir);
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(backend) = storage.backend {
                self.storage.backend = backend;
            }
            if let Some(database_url) = storage.database_url {
                self.storage.database_url = database_url;
            }
            if let Some(max_connections) = storage.max_connections {
                self.storage.max_connections = max_connections;
            }
            if let Some(timeout_secs) = storage.timeout_secs {
                self.storage.timeout_secs = timeout_secs;
            }
        }

        if let Some(sizing) = patch.sizing {
            if let Some(dataset_path) = sizing.dataset_path {
                self.sizing.dataset_path = Some(dataset_path);
            }
        }

        if let Some(measurement) = patch.measurement {
            if let Some(endpoint) = measurement.endpoint {
                self.measurement.endpoint = Some(endpoint);
            }
            if let Some(api_key) = measurement.api_key {
                self.measurement.api_key = Some(api_key.into());
            }
            if let Some(timeout_secs) = measurement.timeout_secs {
                self.measurement.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LASTFIT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some((key, value)) = read_first_env(SERVER_PORT_ENV_KEYS) {
            self.server.port = parse_u16(key, &value)?;
        }
        if let Some(value) = read_env("LASTFIT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("LASTFIT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("LASTFIT_SERVER_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("LASTFIT_STORAGE_BACKEND") {
            self.storage.backend = value.parse()?;
        }
        if let Some(value) = read_env("LASTFIT_STORAGE_DATABASE_URL") {
            self.storage.database_url = value;
        }
        if let Some(value) = read_env("LASTFIT_STORAGE_MAX_CONNECTIONS") {
            self.storage.max_connections = parse_u32("LASTFIT_STORAGE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("LASTFIT_STORAGE_TIMEOUT_SECS") {
            self.storage.timeout_secs = parse_u64("LASTFIT_STORAGE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LASTFIT_SIZING_DATASET_PATH") {
            self.sizing.dataset_path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("LASTFIT_MEASUREMENT_ENDPOINT") {
            self.measurement.endpoint = Some(value);
        }
        if let Some(value) = read_env("LASTFIT_MEASUREMENT_API_KEY") {
            self.measurement.api_key = Some(value.into());
        }
        if let Some(value) = read_env("LASTFIT_MEASUREMENT_TIMEOUT_SECS") {
            self.measurement.timeout_secs = parse_u64("LASTFIT_MEASUREMENT_TIMEOUT_SECS", &value)?;
        }

        if let Some((_, value)) = read_first_env(LOGGING_LEVEL_ENV_KEYS) {
            self.logging.level = value;
        }
        if let Some((_, value)) = read_first_env(LOGGING_FORMAT_ENV_KEYS) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(backend) = overrides.storage_backend {
            self.storage.backend = backend;
        }
        if let Some(database_url) = overrides.database_url {
            self.storage.database_url = database_url;
        }
        if let Some(dataset_path) = overrides.dataset_path {
            self.sizing.dataset_path = Some(dataset_path);
        }
        if let Some(endpoint) = overrides.measurement_endpoint {
            self.measurement.endpoint = Some(endpoint);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.server)?;
        validate_storage(&self.storage)?;
        validate_measurement(&self.measurement)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("lastfit.toml"), PathBuf::from("config/lastfit.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    if storage.backend == StorageBackend::Memory {
        return Ok(());
    }

    let url = storage.database_url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "storage.database_url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if storage.max_connections == 0 {
        return Err(ConfigError::Validation(
            "storage.max_connections must be greater than zero".to_string(),
        ));
    }

    if storage.timeout_secs == 0 || storage.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "storage.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_measurement(measurement: &MeasurementConfig) -> Result<(), ConfigError> {
    if let Some(endpoint) = &measurement.endpoint {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Validation(
                "measurement.endpoint must start with http:// or https://".to_string(),
            ));
        }
    }

    let blank_key = measurement
        .api_key
        .as_ref()
        .map(|value| value.expose_secret().trim().is_empty())
        .unwrap_or(false);
    if blank_key {
        return Err(ConfigError::Validation(
            "measurement.api_key must not be blank when set".to_string(),
        ));
    }

    if measurement.timeout_secs == 0 || measurement.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "measurement.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// First non-blank variable among `keys`, along with the key it came from.
pub fn read_first_env(keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter().find_map(|key| read_env(key).map(|value| (*key, value)))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    storage: Option<StoragePatch>,
    sizing: Option<SizingPatch>,
    measurement: Option<MeasurementPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    static_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    backend: Option<StorageBackend>,
    database_url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SizingPatch {
    dataset_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct MeasurementPatch {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
