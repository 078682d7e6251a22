use thiserror::Error;

/// Failures reported by a ledger endpoint or while decoding its answers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{0}")]
    Unavailable(String),
    #[error("invalid address {0}")]
    InvalidAddress(String),
    #[error("failed to decode ledger response: {0}")]
    Decode(String),
    #[error("execution reverted: {reason}")]
    Reverted { reason: String },
    #[error("user rejected the request: {0}")]
    Rejected(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}

impl LedgerError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Submission failures the user caused rather than the network or the contract.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, LedgerError::Rejected(_))
    }
}
