pub mod config;
pub mod dataset;
pub mod doctor;
pub mod lasts;
pub mod migrate;
pub mod recommend;
pub mod width;

use lastfit_core::config::{AppConfig, LoadOptions};
use lastfit_core::sizing::ReferenceDataset;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_DATASET: u8 = 3;
pub const EXIT_INVALID_INPUT: u8 = 4;
pub const EXIT_UNKNOWN_LAST: u8 = 5;
pub const EXIT_RUNTIME: u8 = 6;
pub const EXIT_DATABASE: u8 = 7;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })
}

/// The configured replacement dataset, or the builtin one.
pub(crate) fn load_dataset(
    command: &str,
    config: &AppConfig,
) -> Result<ReferenceDataset, CommandResult> {
    ReferenceDataset::load(config.sizing.dataset_path.as_deref()).map_err(|error| {
        CommandResult::failure(command, "dataset_load", error.to_string(), EXIT_DATASET)
    })
}

pub(crate) fn to_data<T: Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}
