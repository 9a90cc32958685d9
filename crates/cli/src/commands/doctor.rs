use lastfit_core::config::{AppConfig, LoadOptions, StorageBackend};
use lastfit_core::sizing::ReferenceDataset;
use lastfit_db::{connect_with_settings, ping};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> (bool, String) {
    let report = build_report();
    let passed = report.overall_status == CheckStatus::Pass;

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return (passed, output);
    }

    (passed, render_human(&report))
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_dataset(&config));
            checks.push(check_storage(&config));
            checks.push(check_measurement(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["sizing_dataset", "storage_connectivity", "measurement_endpoint"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // Skipped checks are optional features and do not fail the report.
    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_dataset(config: &AppConfig) -> DoctorCheck {
    match ReferenceDataset::load(config.sizing.dataset_path.as_deref()) {
        Ok(dataset) if dataset.is_empty() => DoctorCheck {
            name: "sizing_dataset",
            status: CheckStatus::Fail,
            details: "sizing dataset defines no lasts".to_string(),
        },
        Ok(dataset) => DoctorCheck {
            name: "sizing_dataset",
            status: CheckStatus::Pass,
            details: format!("{} lasts, {} size rows", dataset.len(), dataset.row_count()),
        },
        Err(error) => DoctorCheck {
            name: "sizing_dataset",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_storage(config: &AppConfig) -> DoctorCheck {
    if config.storage.backend == StorageBackend::Memory {
        return DoctorCheck {
            name: "storage_connectivity",
            status: CheckStatus::Skipped,
            details: "in-memory store needs no connection".to_string(),
        };
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "storage_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.storage.database_url,
            config.storage.max_connections,
            config.storage.timeout_secs,
        )
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

        let probed = ping(&pool).await.map_err(|error| format!("database query failed: {error}"));
        pool.close().await;
        probed
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "storage_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.storage.database_url),
        },
        Err(error) => {
            DoctorCheck { name: "storage_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn check_measurement(config: &AppConfig) -> DoctorCheck {
    match &config.measurement.endpoint {
        Some(endpoint) => DoctorCheck {
            name: "measurement_endpoint",
            status: CheckStatus::Pass,
            details: format!("photo measurements forward to `{endpoint}`"),
        },
        None => DoctorCheck {
            name: "measurement_endpoint",
            status: CheckStatus::Skipped,
            details: "no endpoint configured; /api/measure-foot answers 503".to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
