use std::fs;
use std::path::{Path, PathBuf};

use lastfit_core::config::{
    read_first_env, AppConfig, LoadOptions, LOGGING_FORMAT_ENV_KEYS, LOGGING_LEVEL_ENV_KEYS,
    SERVER_PORT_ENV_KEYS,
};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let unset = || "<unset>".to_string();
    let api_key = match &config.measurement.api_key {
        Some(key) => redact_secret(key.expose_secret()),
        None => unset(),
    };

    let fields: [(&str, &[&'static str], String); 14] = [
        ("server.bind_address", &["LASTFIT_SERVER_BIND_ADDRESS"], config.server.bind_address.clone()),
        ("server.port", SERVER_PORT_ENV_KEYS, config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            &["LASTFIT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        (
            "server.static_dir",
            &["LASTFIT_SERVER_STATIC_DIR"],
            config.server.static_dir.as_ref().map(|dir| dir.display().to_string()).unwrap_or_else(unset),
        ),
        ("storage.backend", &["LASTFIT_STORAGE_BACKEND"], format!("{:?}", config.storage.backend)),
        ("storage.database_url", &["LASTFIT_STORAGE_DATABASE_URL"], config.storage.database_url.clone()),
        (
            "storage.max_connections",
            &["LASTFIT_STORAGE_MAX_CONNECTIONS"],
            config.storage.max_connections.to_string(),
        ),
        ("storage.timeout_secs", &["LASTFIT_STORAGE_TIMEOUT_SECS"], config.storage.timeout_secs.to_string()),
        (
            "sizing.dataset_path",
            &["LASTFIT_SIZING_DATASET_PATH"],
            config
                .sizing
                .dataset_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<builtin>".to_string()),
        ),
        (
            "measurement.endpoint",
            &["LASTFIT_MEASUREMENT_ENDPOINT"],
            config.measurement.endpoint.clone().unwrap_or_else(unset),
        ),
        ("measurement.api_key", &["LASTFIT_MEASUREMENT_API_KEY"], api_key),
        (
            "measurement.timeout_secs",
            &["LASTFIT_MEASUREMENT_TIMEOUT_SECS"],
            config.measurement.timeout_secs.to_string(),
        ),
        ("logging.level", LOGGING_LEVEL_ENV_KEYS, config.logging.level.clone()),
        ("logging.format", LOGGING_FORMAT_ENV_KEYS, format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in fields {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("lastfit.toml"), PathBuf::from("config/lastfit.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&'static str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some((env_key, _)) = read_first_env(env_keys) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let visible = trimmed.chars().take(4).collect::<String>();
    if trimmed.chars().count() > 8 {
        return format!("{visible}***");
    }

    "<redacted>".to_string()
}
