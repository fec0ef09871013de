//! Error types for pool admission and processing.

use thiserror::Error;

use crate::state::transaction::TxId;

/// Errors surfaced by the transaction pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The union of the body partitions is at the configured limit
    #[error("Transaction pool is full")]
    PoolFull,

    /// The id failed verification recently and is cached as invalid
    #[error("Transaction {0} is invalid")]
    AlreadyInvalid(TxId),

    /// The id is already present in a body partition; the existing copy stands
    #[error("Transaction {0} already in pool")]
    Duplicate(TxId),

    /// Sender has a multisignature group but the named requester is unknown
    #[error("Requester not found for transaction {0}")]
    RequesterNotFound(TxId),

    /// The transaction logic collaborator rejected the transaction
    #[error("Failed to process transaction {id}: {reason}")]
    Verification { id: TxId, reason: String },

    /// Projected balance cannot cover amount plus fee
    #[error("Account does not have enough funds for transaction {id}: balance {effective}")]
    InsufficientBalance { id: TxId, effective: String },

    /// The account store collaborator failed
    #[error("Account lookup failed: {0}")]
    Account(String),
}

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
