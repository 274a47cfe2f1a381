//! Error types for the operation guard

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The administrative interface could not be reached or answered `!OK`
    #[error("Communication failure: {0}")]
    CommunicationFailure(String),

    #[error("Failed to kill op[{op_id}]: {reason}")]
    TerminationFailure { op_id: u32, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Unexpected reply: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the guard should just try again on its next tick
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::CommunicationFailure(_)
                | Error::TerminationFailure { .. }
                | Error::Database(_)
                | Error::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_guard_side_failures_are_transient() {
        assert!(Error::CommunicationFailure("down".into()).is_transient());
        assert!(Error::TerminationFailure {
            op_id: 7,
            reason: "gone".into()
        }
        .is_transient());
        assert!(!Error::Config("bad".into()).is_transient());
        assert!(!Error::Internal("join".into()).is_transient());
    }
}
