//! Long-running operation guard
//!
//! Periodically lists the operations in progress on the admin database and
//! kills client-initiated ones that have exceeded the configured timeout
//! (e.g. a slow pipeline produced by a wide range search). Each tick:
//!
//! 1. `currentOp`; on failure or `!OK`, log and wait for the next tick
//! 2. classify every operation
//! 3. `killOp` each eligible one; a failed kill does not stop the others
//!
//! Ticks never overlap: the next one starts only after the current tick's
//! round-trips have finished. A stop request is honoured between ticks.

use super::classifier::skip_reason;
use crate::{
    config::GuardSettings,
    db::{AdminCommands, LiveOperation},
    metrics::{GUARD_KILLS_TOTAL, GUARD_TICKS_TOTAL},
    Error, Result,
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

/// Shortest accepted poll interval; `tokio::time::interval` rejects zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Guard settings, fixed once the guard starts
#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub namespace_suffix: String,
    pub operation_timeout: Duration,
    pub poll_interval: Duration,
    pub command_timeout: Duration,
}

impl GuardConfig {
    pub fn from_config(settings: &GuardSettings) -> Self {
        Self {
            namespace_suffix: settings.namespace_suffix.clone(),
            operation_timeout: Duration::from_secs(settings.operation_timeout_seconds),
            poll_interval: Duration::from_secs(settings.poll_interval_seconds),
            command_timeout: Duration::from_secs(settings.command_timeout_seconds),
        }
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub evaluated: usize,
    pub eligible: usize,
    pub killed: usize,
    pub failed: usize,
}

pub struct OpGuard {
    admin: Arc<dyn AdminCommands>,
    config: GuardConfig,
}

impl OpGuard {
    pub fn new(admin: Arc<dyn AdminCommands>, mut config: GuardConfig) -> Self {
        if config.poll_interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                requested = ?config.poll_interval,
                "Poll interval too short, using {:?}",
                MIN_POLL_INTERVAL
            );
            config.poll_interval = MIN_POLL_INTERVAL;
        }
        Self { admin, config }
    }

    pub fn name(&self) -> &str {
        "OpGuard"
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Run a single poll/evaluate/terminate pass
    ///
    /// Fails only when the operation list could not be obtained; individual
    /// kill failures are logged and counted in the report.
    pub async fn run_tick(&self) -> Result<TickReport> {
        let ops = self
            .bounded("currentOp", self.admin.current_ops())
            .await
            .map_err(|e| match e {
                Error::CommunicationFailure(_) => e,
                other => Error::CommunicationFailure(other.to_string()),
            })?;

        if !ops.is_ok() {
            let info = ops
                .info
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("No additional information");
            return Err(Error::CommunicationFailure(format!("!OK: {info}")));
        }

        let mut report = TickReport {
            evaluated: ops.operations.len(),
            ..Default::default()
        };

        for op in &ops.operations {
            if let Some(reason) = skip_reason(op, &self.config) {
                tracing::trace!(op_id = op.id, reason = reason.as_str(), "Skipping operation");
                continue;
            }
            report.eligible += 1;

            match self.kill(op).await {
                Ok(()) => {
                    report.killed += 1;
                    GUARD_KILLS_TOTAL.with_label_values(&["killed"]).inc();
                    tracing::info!(
                        op_id = op.id,
                        query = op.query_name().unwrap_or_default(),
                        namespace = %op.namespace,
                        secs_running = op.secs_running,
                        "Killed long-running operation"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    GUARD_KILLS_TOTAL.with_label_values(&["failed"]).inc();
                    tracing::warn!(op_id = op.id, error = %e, "Failed to kill long-running operation");
                }
            }
        }

        Ok(report)
    }

    async fn kill(&self, op: &LiveOperation) -> Result<()> {
        let reply = self
            .bounded("killOp", self.admin.kill_op(op.id))
            .await
            .map_err(|e| Error::TerminationFailure {
                op_id: op.id,
                reason: e.to_string(),
            })?;

        if reply.is_ok() {
            return Ok(());
        }
        Err(Error::TerminationFailure {
            op_id: op.id,
            reason: reply
                .diagnostic()
                .map(str::to_string)
                .unwrap_or_else(|| "server replied !OK".to_string()),
        })
    }

    /// Bound an admin round-trip so the guard cannot itself become a
    /// long-running operation
    async fn bounded<T>(&self, command: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.command_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::CommunicationFailure(format!(
                "{command} timed out after {:?}",
                self.config.command_timeout
            ))),
        }
    }

    /// Tick until `shutdown` turns true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        tracing::info!(
            namespace_suffix = %self.config.namespace_suffix,
            operation_timeout = ?self.config.operation_timeout,
            poll_interval = ?self.config.poll_interval,
            "{} monitoring databases for long-running operations",
            self.name()
        );

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::warn!("{} shutdown channel closed, stopping...", self.name());
                        break;
                    }
                    continue;
                }
            }

            // Checked again so a stop that raced the timer wins.
            if *shutdown.borrow() {
                break;
            }

            match self.run_tick().await {
                Ok(report) => {
                    GUARD_TICKS_TOTAL.with_label_values(&["ok"]).inc();
                    if report.eligible > 0 {
                        tracing::info!(
                            evaluated = report.evaluated,
                            killed = report.killed,
                            failed = report.failed,
                            "{} tick finished",
                            self.name()
                        );
                    } else {
                        tracing::debug!(evaluated = report.evaluated, "{} tick finished", self.name());
                    }
                }
                Err(e) if e.is_transient() => {
                    GUARD_TICKS_TOTAL.with_label_values(&["failed"]).inc();
                    tracing::warn!(error = %e, "{} could not list current operations", self.name());
                }
                Err(e) => {
                    GUARD_TICKS_TOTAL.with_label_values(&["failed"]).inc();
                    tracing::error!(error = %e, "{} tick failed", self.name());
                }
            }
        }

        tracing::info!("{} stopped", self.name());
        Ok(())
    }
}

/// Handle to a running guard task
pub struct GuardHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

impl GuardHandle {
    /// Request a stop and wait for the current tick to finish
    ///
    /// The guard and its admin connection are dropped when the task exits.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.task
            .await
            .map_err(|e| Error::Internal(format!("guard task failed: {e}")))?
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the guard on the current runtime
pub fn spawn_op_guard(guard: OpGuard) -> GuardHandle {
    let (shutdown, rx) = watch::channel(false);
    let task = tokio::spawn(guard.run(rx));
    GuardHandle { shutdown, task }
}
