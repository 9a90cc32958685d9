use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use lastfit_core::sizing::ReferenceDataset;
use lastfit_db::DbPool;
use serde::Serialize;
use tracing::warn;

#[derive(Clone)]
pub enum StorageProbe {
    Memory,
    Sqlite(DbPool),
}

#[derive(Clone)]
pub struct HealthState {
    dataset: Arc<ReferenceDataset>,
    storage: StorageProbe,
}

impl HealthState {
    pub fn new(dataset: Arc<ReferenceDataset>, storage: StorageProbe) -> Self {
        Self { dataset, storage }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub dataset: HealthCheck,
    pub storage: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/healthz", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let dataset = dataset_check(&state.dataset);
    let storage = storage_check(&state.storage).await;
    let ready = dataset.status == "ready" && storage.status == "ready";

    if !ready {
        warn!(
            event_name = "system.health.degraded",
            correlation_id = "healthz",
            dataset = %dataset.detail,
            storage = %storage.detail,
            "health check reported degraded dependencies"
        );
    }

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "lastfit-server runtime initialized".to_string(),
        },
        dataset,
        storage,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn dataset_check(dataset: &ReferenceDataset) -> HealthCheck {
    if dataset.is_empty() {
        return HealthCheck { status: "degraded", detail: "sizing dataset has no lasts".to_string() };
    }
    HealthCheck {
        status: "ready",
        detail: format!("{} lasts, {} size rows", dataset.len(), dataset.row_count()),
    }
}

async fn storage_check(storage: &StorageProbe) -> HealthCheck {
    match storage {
        StorageProbe::Memory => {
            HealthCheck { status: "ready", detail: "in-memory calculation store".to_string() }
        }
        StorageProbe::Sqlite(pool) => match lastfit_db::ping(pool).await {
            Ok(()) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
            Err(error) => HealthCheck {
                status: "degraded",
                detail: format!("database query failed: {error}"),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use lastfit_core::sizing::ReferenceDataset;
    use lastfit_db::connect_with_settings;

    use crate::health::{health, HealthState, StorageProbe};

    fn builtin() -> Arc<ReferenceDataset> {
        Arc::new(ReferenceDataset::builtin().expect("builtin dataset"))
    }

    #[tokio::test]
    async fn health_is_ready_with_builtin_dataset_and_memory_store() {
        let (status, Json(payload)) =
            health(State(HealthState::new(builtin(), StorageProbe::Memory))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.dataset.status, "ready");
        assert_eq!(payload.storage.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_ready_when_database_is_reachable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        let (status, Json(payload)) =
            health(State(HealthState::new(builtin(), StorageProbe::Sqlite(pool.clone())))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.storage.status, "ready");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) =
            health(State(HealthState::new(builtin(), StorageProbe::Sqlite(pool)))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.storage.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn empty_dataset_degrades_health() {
        let empty = ReferenceDataset::from_lasts(BTreeMap::new()).expect("empty dataset is valid");

        let (status, Json(payload)) =
            health(State(HealthState::new(Arc::new(empty), StorageProbe::Memory))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.dataset.status, "degraded");
    }
}
