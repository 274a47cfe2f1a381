//! MongoDB implementation of the administrative commands

use super::traits::{AdminCommands, CommandReply, CurrentOps};
use crate::{config::DatabaseConfig, Result};
use async_trait::async_trait;
use mongodb::{
    bson::{self, doc},
    options::ClientOptions,
    Client, Database,
};

/// Dedicated administrative connection
///
/// Holds its own client so a stuck guard cannot starve the connection pool
/// used for serving requests. Dropping it releases the connection.
pub struct MongoAdmin {
    _client: Client,
    admin_db: Database,
}

impl MongoAdmin {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.url).await?;
        options.app_name = Some(config.app_name.clone());

        let client = Client::with_options(options)?;
        let admin_db = client.database(&config.admin_database);

        tracing::debug!(
            database = %config.admin_database,
            "Administrative connection configured"
        );

        Ok(Self {
            _client: client,
            admin_db,
        })
    }
}

#[async_trait]
impl AdminCommands for MongoAdmin {
    async fn current_ops(&self) -> Result<CurrentOps> {
        // Without {"$all": true} only client-initiated operations are returned.
        let reply = self.admin_db.run_command(doc! { "currentOp": 1 }).await?;
        Ok(bson::from_document(reply)?)
    }

    async fn kill_op(&self, op_id: u32) -> Result<CommandReply> {
        let reply = self
            .admin_db
            .run_command(doc! { "killOp": 1, "op": i64::from(op_id) })
            .await?;
        Ok(bson::from_document(reply)?)
    }
}
