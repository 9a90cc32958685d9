use lastfit_core::catalog::{all_last_descriptions, last_description};
use lastfit_core::domain::sizing::WidthClass;
use serde::Serialize;

use crate::commands::{load_config, load_dataset, to_data, CommandResult};

const COMMAND: &str = "lasts";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LastEntry {
    name: String,
    display_name: String,
    style: Option<&'static str>,
    available_widths: Vec<WidthClass>,
    size_rows: usize,
}

pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let dataset = match load_dataset(COMMAND, &config) {
        Ok(dataset) => dataset,
        Err(failure) => return failure,
    };

    let entry = |name: &str, display_name: &str, style: Option<&'static str>| {
        let sizing = dataset.last(name);
        LastEntry {
            name: name.to_string(),
            display_name: display_name.to_string(),
            style,
            available_widths: sizing.map(|sizing| sizing.available_widths()).unwrap_or_default(),
            size_rows: sizing
                .map(|sizing| sizing.widths().map(|(_, rows)| rows.len()).sum())
                .unwrap_or(0),
        }
    };

    let mut entries = all_last_descriptions()
        .iter()
        .map(|description| entry(description.name, description.display_name, Some(description.style)))
        .collect::<Vec<_>>();
    entries.extend(
        dataset
            .last_types()
            .filter(|name| last_description(name).is_none())
            .map(|name| entry(name, name, None)),
    );

    let message = entries
        .iter()
        .map(|entry| {
            let widths =
                entry.available_widths.iter().map(|width| width.as_str()).collect::<Vec<_>>();
            format!("{} [{}]", entry.display_name, widths.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ");

    CommandResult::success_with_data(COMMAND, message, to_data(&entries))
}
