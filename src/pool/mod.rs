//! Transaction Pool - Staging Area for Unconfirmed Transactions
//!
//! This module buffers, validates and orders candidate transactions
//! between their arrival (gossip, client API, block rollback) and their
//! inclusion in a block.
//!
//! ## Partitions
//!
//! Transactions move through four partitions:
//!
//! 1. `unverified` - freshly admitted, not yet cryptographically checked
//! 2. `pending` - verified but deferred (multisignature, future-dated)
//! 3. `ready` - verified and schedulable; the block producer draws from here
//! 4. `invalid` - ids of recently rejected transactions (negative cache)
//!
//! ## Data Flow
//!
//! 1. Admission: `add` stages raw transactions into unverified
//! 2. Processing tick: the verifier pipeline and the projected-balance
//!    check move entries to pending or ready, or cache them as invalid
//! 3. Expiry tick: aged entries are evicted; a coarser tick empties the
//!    invalid cache
//! 4. Draw: `get_ready` serves a fee-ordered snapshot for block production
//! 5. Ledger sync: `add_ready` re-stages rolled-back transactions,
//!    `remove` drops included ones
//!
//! ## Thread Safety
//!
//! [`TransactionPool`] is **not** thread-safe; it is designed to be owned
//! by a single thread. [`PoolService`] provides that owner and drives the
//! periodic jobs; cross-thread communication uses lock-free rtrb channels.

mod expiry;
mod pool;
mod processor;
mod service;
mod store;
pub mod traits;
mod types;

pub use pool::TransactionPool;
pub use processor::DISPLAY_UNIT;
pub use service::{PoolChannels, PoolService};
pub use store::Partition;
pub use types::{
    BlockInclusion, ListParams, ListResult, PartitionedTxs, PoolStats, PoolUsage, ProcessSummary,
    ReadyBatch, ReadyDrawRequest, ReadyDrawResponse, TxStatus,
};
