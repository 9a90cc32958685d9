use lastfit_core::config::StorageBackend;
use lastfit_db::{connect_with_settings, migrations};

use crate::commands::{load_config, CommandResult, EXIT_DATABASE, EXIT_RUNTIME};

const COMMAND: &str = "migrate";

pub fn run() -> CommandResult {
    let config = match load_config(COMMAND) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    if config.storage.backend == StorageBackend::Memory {
        return CommandResult::success(COMMAND, "in-memory storage has no schema to migrate");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.storage.database_url,
            config.storage.max_connections,
            config.storage.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string()))?;
        migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string()))?;
        pool.close().await;
        Ok::<(), (&'static str, String)>(())
    });

    match result {
        Ok(()) => CommandResult::success(COMMAND, "applied pending migrations"),
        Err((error_class, message)) => {
            CommandResult::failure(COMMAND, error_class, message, EXIT_DATABASE)
        }
    }
}
