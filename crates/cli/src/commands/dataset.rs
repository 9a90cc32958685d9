use std::path::Path;

use lastfit_core::sizing::ReferenceDataset;
use serde_json::json;

use crate::commands::{load_config, to_data, CommandResult, EXIT_DATASET};

const COMMAND: &str = "dataset";

/// Validates `path`, or the configured dataset when no path is given.
pub fn run(path: Option<&Path>) -> CommandResult {
    let (source, loaded) = match path {
        Some(path) => (path.display().to_string(), ReferenceDataset::from_path(path)),
        None => {
            let config = match load_config(COMMAND) {
                Ok(config) => config,
                Err(failure) => return failure,
            };
            let source = config
                .sizing
                .dataset_path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "builtin".to_string());
            (source, ReferenceDataset::load(config.sizing.dataset_path.as_deref()))
        }
    };

    match loaded {
        Ok(dataset) => CommandResult::success_with_data(
            COMMAND,
            format!(
                "dataset `{source}` is valid: {} lasts, {} size rows",
                dataset.len(),
                dataset.row_count()
            ),
            to_data(&json!({
                "source": source,
                "lasts": dataset.last_types().collect::<Vec<_>>(),
                "rows": dataset.row_count(),
            })),
        ),
        Err(error) => CommandResult::failure(COMMAND, "dataset_invalid", error.to_string(), EXIT_DATASET),
    }
}
