use std::sync::Arc;

use lastfit_core::catalog::display_name;
use lastfit_core::domain::measurement::{FootMeasurements, SizeQuery};
use lastfit_core::domain::sizing::{size_label, SizeCalculationResult};
use lastfit_core::domain::validation::ValidationErrors;
use lastfit_core::sizing::{DeterministicSizingEngine, SizingEngine};
use serde::Serialize;
use serde_json::json;

use crate::commands::{load_config, load_dataset, to_data, CommandResult, EXIT_INVALID_INPUT};

const COMMAND: &str = "recommend";

#[derive(Clone, Debug, Default)]
pub struct RecommendArgs {
    pub last: Option<String>,
    pub foot_length: f64,
    pub ball_girth: f64,
    pub right_foot_length: Option<f64>,
    pub right_ball_girth: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LastResult {
    last_type: String,
    display_name: String,
    result: SizeCalculationResult,
}

pub fn run(args: RecommendArgs) -> CommandResult {
    let measurements = match FootMeasurements::from_payload(&json!({
        "leftFootLength": args.foot_length,
        "leftBallGirth": args.ball_girth,
        "rightFootLength": args.right_foot_length,
        "rightBallGirth": args.right_ball_girth,
    })) {
        Ok(measurements) => measurements,
        Err(errors) => return invalid_input(&errors),
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
    let (foot_length, ball_girth) = measurements.effective();

    match args.last {
        Some(last_type) => {
            let query = match SizeQuery::from_payload(&json!({
                "lastType": last_type,
                "footLength": foot_length,
                "ballGirth": ball_girth,
            })) {
                Ok(query) => query,
                Err(errors) => return invalid_input(&errors),
            };
            let result =
                engine.calculate_size(&query.last_type, query.foot_length, query.ball_girth);
            CommandResult::success_with_data(
                COMMAND,
                summarize(&query.last_type, &result),
                to_data(&result),
            )
        }
        None => {
            let results = engine
                .calculate_all(foot_length, ball_girth)
                .into_iter()
                .map(|entry| LastResult {
                    display_name: display_name(&entry.last_type),
                    last_type: entry.last_type,
                    result: entry.result,
                })
                .collect::<Vec<_>>();
            let message = format!(
                "evaluated {} lasts for {foot_length}mm length and {ball_girth}mm girth",
                results.len()
            );
            CommandResult::success_with_data(COMMAND, message, to_data(&results))
        }
    }
}

fn summarize(last_type: &str, result: &SizeCalculationResult) -> String {
    match result.best() {
        Some(best) => format!(
            "{}: best fit US {} {} ({}% confidence)",
            display_name(last_type),
            size_label(best.size.us_size),
            best.width,
            result.confidence
        ),
        None => result.message.clone(),
    }
}

fn invalid_input(errors: &ValidationErrors) -> CommandResult {
    let fields = errors
        .errors
        .iter()
        .map(|error| format!("{}: {}", error.path.join("."), error.message))
        .collect::<Vec<_>>()
        .join("; ");
    CommandResult::failure(COMMAND, "invalid_input", fields, EXIT_INVALID_INPUT)
}
