//! Builds a [`TutorService`] from configuration.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use tutor_core::config::TutorConfig;
use tutor_engines::create_coordinator;
use tutor_service::TutorService;
use tutor_storage::{MemoryRecordStore, SqliteRecordStore};

const CREDENTIAL_ENV_PREFIX: &str = "CREDENTIAL_";

/// `CREDENTIAL_NAME=value` environment variables, keyed by `NAME`.
pub fn credentials_from_environment() -> HashMap<String, String> {
    env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(CREDENTIAL_ENV_PREFIX)
                .filter(|name| !name.is_empty())
                .map(|name| (name.to_string(), value))
        })
        .collect()
}

/// Uses SQLite when a database path is configured (or given), otherwise a
/// store that lives only as long as the process.
pub async fn build_service(config: &TutorConfig, database: Option<&str>) -> Result<TutorService> {
    let coordinator = Arc::new(create_coordinator(&config.llm));
    if config.llm.credential().is_none() {
        info!("No API key configured; rule-based generation will be used");
    }

    let database = database.or(config.storage.database_path.as_deref());
    let service = match database {
        Some(path) => {
            let store = SqliteRecordStore::open(path)
                .await
                .with_context(|| format!("Failed to open database {}", path))?;
            TutorService::new(coordinator, Arc::new(store), &config.analytics)
        }
        None => {
            warn!("No database configured; records will not outlive this process");
            TutorService::new(
                coordinator,
                Arc::new(MemoryRecordStore::new()),
                &config.analytics,
            )
        }
    };
    Ok(service)
}
