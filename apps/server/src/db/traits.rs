//! Administrative command interface used by the operation guard
//!
//! The reply shapes mirror what `db.currentOp()` and `db.killOp()` return.
//! See <https://www.mongodb.com/docs/manual/reference/command/currentOp/>.

use crate::Result;
use async_trait::async_trait;
use mongodb::bson::Document;
use serde::Deserialize;

/// Success marker in command replies. MongoDB reports `ok` as a double.
pub const OK: f64 = 1.0;

/// Reply of `currentOp`: every in-progress operation, including the
/// `currentOp` command itself
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentOps {
    #[serde(default, rename = "inprog")]
    pub operations: Vec<LiveOperation>,

    #[serde(default)]
    pub info: Option<String>,

    #[serde(default)]
    pub ok: f64,
}

impl CurrentOps {
    pub fn is_ok(&self) -> bool {
        self.ok == OK
    }
}

/// Point-in-time snapshot of a database operation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveOperation {
    #[serde(default, rename = "opid")]
    pub id: u32,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub secs_running: u64,

    #[serde(default)]
    pub microsecs_running: u64,

    /// Operation type: command, query, getMore, insert, update, remove, ...
    #[serde(default, rename = "op")]
    pub kind: String,

    #[serde(default, rename = "ns")]
    pub namespace: String,

    #[serde(default, rename = "killPending")]
    pub kill_pending: bool,

    /// Reported by servers before 3.6
    #[serde(default)]
    pub query: Document,

    /// Reported by servers since 3.6
    #[serde(default)]
    pub command: Document,
}

impl LiveOperation {
    /// The document describing what the operation runs
    pub fn query_doc(&self) -> &Document {
        if self.query.is_empty() {
            &self.command
        } else {
            &self.query
        }
    }

    /// First key of the query document, e.g. `find` or `aggregate`
    pub fn query_name(&self) -> Option<&str> {
        self.query_doc().keys().next().map(String::as_str)
    }
}

/// Reply of a command that returns no results, such as `killOp`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandReply {
    #[serde(default)]
    pub info: Option<String>,

    #[serde(default)]
    pub errmsg: Option<String>,

    #[serde(default)]
    pub ok: f64,
}

impl CommandReply {
    pub fn is_ok(&self) -> bool {
        self.ok == OK
    }

    /// Diagnostic text, if the server sent any
    pub fn diagnostic(&self) -> Option<&str> {
        self.info
            .as_deref()
            .or(self.errmsg.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Administrative commands the guard needs from the store
///
/// Implementations own a connection dedicated to administration so the guard
/// never competes with request-serving I/O.
#[async_trait]
pub trait AdminCommands: Send + Sync {
    /// List client-initiated operations currently in progress
    async fn current_ops(&self) -> Result<CurrentOps>;

    /// Ask the server to terminate an operation
    async fn kill_op(&self, op_id: u32) -> Result<CommandReply>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, doc};

    #[test]
    fn decodes_current_op_reply() {
        let reply = doc! {
            "inprog": [
                {
                    "opid": 4242_i32,
                    "active": true,
                    "secs_running": 75_i64,
                    "microsecs_running": 75_000_123_i64,
                    "op": "command",
                    "ns": "prod_fhir.Observation",
                    "command": { "aggregate": "Observation", "pipeline": [] },
                },
                { "opid": 1_i32, "active": false, "op": "none", "ns": "" },
            ],
            "ok": 1.0,
        };

        let ops: CurrentOps = bson::from_document(reply).unwrap();
        assert!(ops.is_ok());
        assert_eq!(ops.operations.len(), 2);

        let op = &ops.operations[0];
        assert_eq!(op.id, 4242);
        assert_eq!(op.secs_running, 75);
        assert_eq!(op.kind, "command");
        assert_eq!(op.namespace, "prod_fhir.Observation");
        assert!(!op.kill_pending);
        assert_eq!(op.query_name(), Some("aggregate"));

        assert!(ops.operations[1].query_doc().is_empty());
    }

    #[test]
    fn legacy_query_field_takes_precedence() {
        let op: LiveOperation = bson::from_document(doc! {
            "opid": 7_i32,
            "query": { "find": "Patient" },
            "command": { "getMore": 1_i64 },
        })
        .unwrap();
        assert_eq!(op.query_name(), Some("find"));
    }

    #[test]
    fn not_ok_reply_carries_diagnostic() {
        let reply: CommandReply =
            bson::from_document(doc! { "ok": 0.0, "errmsg": "not authorized" }).unwrap();
        assert!(!reply.is_ok());
        assert_eq!(reply.diagnostic(), Some("not authorized"));

        let reply: CommandReply = bson::from_document(doc! { "ok": 1_i32 }).unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.diagnostic(), None);
    }
}
