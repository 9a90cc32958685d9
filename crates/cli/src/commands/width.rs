use std::sync::Arc;

use lastfit_core::domain::measurement::SizeQuery;
use lastfit_core::sizing::{DeterministicSizingEngine, SizingEngine};
use serde_json::json;

use crate::commands::{
    load_config, load_dataset, to_data, CommandResult, EXIT_INVALID_INPUT, EXIT_UNKNOWN_LAST,
};

const COMMAND: &str = "width";

pub fn run(last: &str, foot_length: f64, ball_girth: f64) -> CommandResult {
    let query = match SizeQuery::from_payload(&json!({
        "lastType": last,
        "footLength": foot_length,
        "ballGirth": ball_girth,
    })) {
        Ok(query) => query,
        Err(errors) => {
            return CommandResult::failure(
                COMMAND,
                "invalid_input",
                format!("{} invalid argument(s)", errors.errors.len()),
                EXIT_INVALID_INPUT,
            );
        }
    };

    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let dataset = match load_dataset(COMMAND, &config) {
        Ok(dataset) => dataset,
        Err(failure) => return failure,
    };
    let engine = DeterministicSizingEngine::new(Arc::new(dataset));

    match engine.estimate_width(&query.last_type, query.foot_length, query.ball_girth) {
        Some(width) => CommandResult::success_with_data(
            COMMAND,
            format!("estimated width for {}: {width}", query.last_type),
            to_data(&json!({ "lastType": query.last_type, "width": width })),
        ),
        None => CommandResult::failure(
            COMMAND,
            "unknown_last",
            format!("no D-width sizing data for `{}`", query.last_type),
            EXIT_UNKNOWN_LAST,
        ),
    }
}
