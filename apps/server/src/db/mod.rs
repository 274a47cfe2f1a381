//! Administrative access to the MongoDB deployment

pub mod mongo;
pub mod traits;

pub use mongo::MongoAdmin;
pub use traits::{AdminCommands, CommandReply, CurrentOps, LiveOperation, OK};
