use async_trait::async_trait;
use fhirmongo::{
    db::{AdminCommands, CommandReply, CurrentOps, LiveOperation, OK},
    workers::GuardConfig,
    Error, Result,
};
use mongodb::bson::doc;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

/// How the fake answers `killOp` for a given op id
#[derive(Debug, Clone)]
pub enum KillOutcome {
    NotOk(Option<String>),
    Fail(String),
}

/// In-memory admin interface that records every kill request
#[derive(Default)]
pub struct FakeAdmin {
    operations: Mutex<Vec<LiveOperation>>,
    listing_ok: Mutex<Option<(f64, Option<String>)>>,
    listing_error: Mutex<Option<String>>,
    listing_delay: Mutex<Duration>,
    kill_outcomes: Mutex<HashMap<u32, KillOutcome>>,
    kills: Mutex<Vec<u32>>,
    listings: AtomicUsize,
}

impl FakeAdmin {
    pub fn with_operations(operations: Vec<LiveOperation>) -> Self {
        let fake = Self::default();
        *fake.operations.lock().unwrap() = operations;
        fake
    }

    /// Answer `currentOp` with the given `ok` and `info`
    pub fn reply_with(self, ok: f64, info: Option<&str>) -> Self {
        *self.listing_ok.lock().unwrap() = Some((ok, info.map(str::to_string)));
        self
    }

    pub fn fail_listing(self, message: &str) -> Self {
        *self.listing_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn delay_listing(self, delay: Duration) -> Self {
        *self.listing_delay.lock().unwrap() = delay;
        self
    }

    pub fn kill_outcome(self, op_id: u32, outcome: KillOutcome) -> Self {
        self.kill_outcomes.lock().unwrap().insert(op_id, outcome);
        self
    }

    /// Op ids `killOp` was called with, in call order
    pub fn kills(&self) -> Vec<u32> {
        self.kills.lock().unwrap().clone()
    }

    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdminCommands for FakeAdmin {
    async fn current_ops(&self) -> Result<CurrentOps> {
        self.listings.fetch_add(1, Ordering::SeqCst);

        let delay = *self.listing_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.listing_error.lock().unwrap().clone() {
            return Err(Error::Internal(message));
        }

        let (ok, info) = self.listing_ok.lock().unwrap().clone().unwrap_or((OK, None));
        Ok(CurrentOps {
            operations: self.operations.lock().unwrap().clone(),
            info,
            ok,
        })
    }

    async fn kill_op(&self, op_id: u32) -> Result<CommandReply> {
        self.kills.lock().unwrap().push(op_id);

        match self.kill_outcomes.lock().unwrap().get(&op_id).cloned() {
            None => Ok(CommandReply {
                info: Some("attempting to kill op".to_string()),
                ok: OK,
                ..Default::default()
            }),
            Some(KillOutcome::NotOk(info)) => Ok(CommandReply {
                info,
                ok: 0.0,
                ..Default::default()
            }),
            Some(KillOutcome::Fail(message)) => Err(Error::Internal(message)),
        }
    }
}

pub fn guard_config() -> GuardConfig {
    GuardConfig {
        namespace_suffix: "fhir".to_string(),
        operation_timeout: Duration::from_secs(60),
        poll_interval: Duration::from_secs(5),
        command_timeout: Duration::from_secs(10),
    }
}

/// An active `find` on `db.fhir` running for `secs` seconds
pub fn long_query(id: u32, secs: u64) -> LiveOperation {
    LiveOperation {
        id,
        active: true,
        secs_running: secs,
        kind: "query".to_string(),
        namespace: "db.fhir".to_string(),
        query: doc! { "find": "fhir", "filter": { "resourceType": "Patient" } },
        ..Default::default()
    }
}

/// Same shape as reported by servers that use `command` instead of `query`
pub fn long_command(id: u32, secs: u64) -> LiveOperation {
    LiveOperation {
        id,
        active: true,
        secs_running: secs,
        kind: "command".to_string(),
        namespace: "db.fhir".to_string(),
        command: doc! { "aggregate": "fhir", "pipeline": [] },
        ..Default::default()
    }
}
