use std::sync::Arc;

use axum::Router;
use lastfit_core::config::{AppConfig, ConfigError, StorageBackend};
use lastfit_core::sizing::{DatasetError, DeterministicSizingEngine, ReferenceDataset};
use lastfit_db::{
    connect_with_settings, migrations, DbPool, InMemorySizeCalculationRepository,
    SizeCalculationRepository, SqlSizeCalculationRepository,
};
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{self, AppState};
use crate::health::{self, HealthState, StorageProbe};
use crate::measure::MeasurementForwarder;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
    pub health: HealthState,
    pub db_pool: Option<DbPool>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("measurement client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let dataset = Arc::new(ReferenceDataset::load(config.sizing.dataset_path.as_deref())?);
    info!(
        event_name = "system.bootstrap.dataset_loaded",
        correlation_id = "bootstrap",
        lasts = dataset.len(),
        rows = dataset.row_count(),
        source = config
            .sizing
            .dataset_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "builtin".to_string()),
        "sizing dataset loaded"
    );

    let (store, probe, db_pool) = match config.storage.backend {
        StorageBackend::Memory => {
            let store: Arc<dyn SizeCalculationRepository> =
                Arc::new(InMemorySizeCalculationRepository::default());
            (store, StorageProbe::Memory, None)
        }
        StorageBackend::Sqlite => {
            let pool = connect_with_settings(
                &config.storage.database_url,
                config.storage.max_connections,
                config.storage.timeout_secs,
            )
            .await
            .map_err(BootstrapError::DatabaseConnect)?;
            info!(
                event_name = "system.bootstrap.database_connected",
                correlation_id = "bootstrap",
                "database connection established"
            );

            migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
            info!(
                event_name = "system.bootstrap.migrations_applied",
                correlation_id = "bootstrap",
                "database migrations applied"
            );

            let store: Arc<dyn SizeCalculationRepository> =
                Arc::new(SqlSizeCalculationRepository::new(pool.clone()));
            (store, StorageProbe::Sqlite(pool.clone()), Some(pool))
        }
    };

    let measurement =
        MeasurementForwarder::from_config(&config.measurement).map_err(BootstrapError::HttpClient)?;
    if !measurement.is_configured() {
        info!(
            event_name = "system.bootstrap.measurement_disabled",
            correlation_id = "bootstrap",
            "no measurement endpoint configured; /api/measure-foot will answer 503"
        );
    }

    let engine = Arc::new(DeterministicSizingEngine::new(dataset.clone()));
    let state = AppState {
        engine,
        dataset: dataset.clone(),
        store,
        measurement: Arc::new(measurement),
    };
    let health = HealthState::new(dataset, probe);

    Ok(Application { config, state, health, db_pool })
}

impl Application {
    /// API and health routes, with static assets as the fallback when configured.
    pub fn router(&self) -> Router {
        let router = api::router(self.state.clone()).merge(health::router(self.health.clone()));
        let router = match &self.config.server.static_dir {
            Some(dir) => router.fallback_service(ServeDir::new(dir)),
            None => router,
        };
        router.layer(TraceLayer::new_for_http())
    }
}
