//! Background task management
//!
//! Starts the long-running operation guard on its own administrative
//! connection. The returned handle is used to stop it at shutdown.

use crate::{
    config::Config,
    db::MongoAdmin,
    workers::{spawn_op_guard, GuardConfig, GuardHandle, OpGuard},
    Result,
};
use std::sync::Arc;

/// Start the operation guard, or return `None` when it is disabled
pub async fn start_op_guard(config: &Config) -> Result<Option<GuardHandle>> {
    if !config.guard.enabled {
        tracing::info!("Operation guard disabled by configuration");
        return Ok(None);
    }

    tracing::info!("Initializing operation guard environment...");

    let admin = MongoAdmin::connect(&config.database).await?;
    let guard = OpGuard::new(Arc::new(admin), GuardConfig::from_config(&config.guard));
    let handle = spawn_op_guard(guard);

    tracing::info!(
        poll_interval_seconds = config.guard.poll_interval_seconds,
        "Operation guard started"
    );

    Ok(Some(handle))
}
