//! Pool type definitions: query results, statistics and the messages
//! passed through the service channels.

use crate::state::{
    address::Address,
    transaction::{Transaction, TxId},
};

/// Where a transaction currently lives, as reported by lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Unverified,
    Pending,
    Ready,
    NotInPool,
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Unverified => write!(f, "unverified"),
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Ready => write!(f, "ready"),
            TxStatus::NotInPool => write!(f, "not-in-pool"),
        }
    }
}

/// Per-partition occupancy counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolUsage {
    pub unverified: usize,
    pub pending: usize,
    pub ready: usize,
}

impl PoolUsage {
    /// Total occupancy of the body partitions.
    pub fn total(&self) -> usize {
        self.unverified + self.pending + self.ready
    }
}

/// Cumulative counters since pool creation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PoolStats {
    /// Transactions admitted (plain or ready path)
    pub added: u64,
    /// Transactions removed by explicit request
    pub removed: u64,
    /// Transactions that failed verification and were cached as invalid
    pub invalidated: u64,
    /// Transactions evicted by the expiry scan
    pub expired: u64,
}

/// Parameters for the [`list`](crate::pool::TransactionPool::list) query.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListParams {
    /// Flip scan order before truncating
    pub reverse: bool,
    /// Keep at most this many entries
    pub limit: Option<usize>,
    /// Address to match for the sender/recipient filters
    pub address: Option<Address>,
}

/// Transactions grouped by the partition they were found in.
#[derive(Clone, Debug, Default)]
pub struct PartitionedTxs {
    pub unverified: Vec<Transaction>,
    pub pending: Vec<Transaction>,
    pub ready: Vec<Transaction>,
}

/// Result of the [`list`](crate::pool::TransactionPool::list) query.
///
/// An unknown filter string yields `InvalidFilter` rather than an error;
/// callers forward it as-is.
#[derive(Clone, Debug)]
pub enum ListResult {
    /// Ids of one partition
    Ids(Vec<TxId>),
    /// Transactions matching a sender/recipient filter, partition-tagged
    Matches(PartitionedTxs),
    /// The filter string named no known view
    InvalidFilter,
}

/// Outcome of one processing tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessSummary {
    /// Unverified entries that went straight to ready
    pub ready: usize,
    /// Unverified entries routed to pending
    pub pending: usize,
    /// Entries that failed verification and were cached as invalid
    pub invalidated: usize,
    /// Entries dropped on balance grounds (not cached as invalid)
    pub dropped: usize,
    /// Pending entries promoted to ready
    pub promoted: usize,
}

/// Request from the block producer for schedulable transactions.
#[derive(Clone, Copy, Debug)]
pub struct ReadyDrawRequest {
    /// Maximum number of transactions to return
    pub limit: Option<usize>,
}

/// Response carrying the ready snapshot, highest fee first.
#[derive(Clone, Debug)]
pub struct ReadyDrawResponse {
    pub transactions: Vec<Transaction>,
}

/// Transactions re-staged by the ledger layer when blocks are applied or
/// rolled back; admitted into ready unconditionally.
#[derive(Clone, Debug)]
pub struct ReadyBatch {
    pub transactions: Vec<Transaction>,
}

/// Notification that a block included these transactions; the pool drops
/// its copies.
#[derive(Clone, Debug)]
pub struct BlockInclusion {
    pub tx_ids: Vec<TxId>,
}
