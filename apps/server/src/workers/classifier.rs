//! Decides which live operations the guard may terminate

use super::op_guard::GuardConfig;
use crate::db::LiveOperation;

/// Operation kinds that are safe to kill without risking data integrity.
/// See <https://www.mongodb.com/docs/manual/reference/command/currentOp/#currentOp.op>.
pub const KILLABLE_OP_KINDS: &[&str] = &["command", "query", "getMore"];

/// Why an operation was left alone this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    /// A kill was already requested; don't retry it.
    KillPending,
    ForeignNamespace,
    BelowTimeout,
    ProtectedKind,
    /// Internal and administrative operations carry no query.
    EmptyQuery,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Inactive => "inactive",
            SkipReason::KillPending => "kill_pending",
            SkipReason::ForeignNamespace => "foreign_namespace",
            SkipReason::BelowTimeout => "below_timeout",
            SkipReason::ProtectedKind => "protected_kind",
            SkipReason::EmptyQuery => "empty_query",
        }
    }
}

/// First condition that excludes `op` from termination, if any
pub fn skip_reason(op: &LiveOperation, config: &GuardConfig) -> Option<SkipReason> {
    if !op.active {
        return Some(SkipReason::Inactive);
    }
    if op.kill_pending {
        return Some(SkipReason::KillPending);
    }
    if !op.namespace.ends_with(config.namespace_suffix.as_str()) {
        return Some(SkipReason::ForeignNamespace);
    }
    if (op.secs_running as f64) < config.operation_timeout.as_secs_f64() {
        return Some(SkipReason::BelowTimeout);
    }
    if !KILLABLE_OP_KINDS.contains(&op.kind.as_str()) {
        return Some(SkipReason::ProtectedKind);
    }
    if op.query_doc().is_empty() {
        return Some(SkipReason::EmptyQuery);
    }
    None
}

pub fn is_killable(op: &LiveOperation, config: &GuardConfig) -> bool {
    skip_reason(op, config).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, Document};
    use std::time::Duration;

    fn config() -> GuardConfig {
        GuardConfig {
            namespace_suffix: "fhir".to_string(),
            operation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
            command_timeout: Duration::from_secs(10),
        }
    }

    fn query_op(
        active: bool,
        kill_pending: bool,
        namespace: &str,
        secs_running: u64,
        query: Document,
    ) -> LiveOperation {
        LiveOperation {
            id: 1,
            active,
            secs_running,
            kind: "query".to_string(),
            namespace: namespace.to_string(),
            kill_pending,
            query,
            ..Default::default()
        }
    }

    #[test]
    fn classification_table() {
        use SkipReason::*;
        let find = || doc! { "find": "Observation" };

        // (active, killPending, namespace, secs_running, query, expected)
        let scenarios = [
            (true, false, "prod.fhir", 60, find(), None),
            (true, false, "prod.fhir", 59, find(), Some(BelowTimeout)),
            (true, true, "prod.fhir", 60, find(), Some(KillPending)),
            (false, false, "prod.fhir", 60, find(), Some(Inactive)),
            (true, false, "admin.$cmd", 60, find(), Some(ForeignNamespace)),
            (true, false, "prod.fhir", 60, Document::new(), Some(EmptyQuery)),
        ];

        for (i, (active, kill_pending, ns, secs, query, expected)) in
            scenarios.into_iter().enumerate()
        {
            let op = query_op(active, kill_pending, ns, secs, query);
            assert_eq!(skip_reason(&op, &config()), expected, "scenario {i}");
            assert_eq!(is_killable(&op, &config()), expected.is_none(), "scenario {i}");
        }
    }

    #[test]
    fn only_read_kinds_are_killable() {
        for kind in ["command", "query", "getMore"] {
            let op = LiveOperation {
                active: true,
                secs_running: 600,
                kind: kind.to_string(),
                namespace: "db.fhir".to_string(),
                command: doc! { "aggregate": "Patient" },
                ..Default::default()
            };
            assert!(is_killable(&op, &config()), "{kind}");
        }
        for kind in ["insert", "update", "remove", "none"] {
            let op = LiveOperation {
                active: true,
                secs_running: 600,
                kind: kind.to_string(),
                namespace: "db.fhir".to_string(),
                query: doc! { "q": 1 },
                ..Default::default()
            };
            assert_eq!(skip_reason(&op, &config()), Some(SkipReason::ProtectedKind), "{kind}");
        }
    }

    #[test]
    fn zero_timeout_still_requires_other_conditions() {
        let config = GuardConfig {
            operation_timeout: Duration::ZERO,
            ..config()
        };
        let op = LiveOperation {
            active: true,
            kind: "query".to_string(),
            namespace: "prod.fhir".to_string(),
            ..Default::default()
        };
        assert_eq!(skip_reason(&op, &config), Some(SkipReason::EmptyQuery));
    }
}
