//! Admission, lifecycle and query surface of the transaction pool.

use slog::Logger;

use crate::{
    config::PoolConfig,
    error::{PoolError, PoolResult},
    pool::{
        store::{Partition, PoolStore},
        traits::{AccountProvider, PoolBus, TransactionLogic},
        types::{ListParams, ListResult, PartitionedTxs, PoolStats, PoolUsage, TxStatus},
    },
    state::{
        now,
        transaction::{Transaction, TransactionType, TxId},
    },
};

/// In-memory staging pool for unconfirmed transactions.
///
/// One instance owns all four partitions plus the injected collaborators;
/// every method takes `&mut self` or `&self`, so a single owner (thread or
/// task) serializes all mutations. [`PoolService`](crate::pool::PoolService)
/// provides that owner together with the periodic jobs.
pub struct TransactionPool {
    pub(crate) store: PoolStore,
    pub(crate) config: PoolConfig,
    pub(crate) accounts: Box<dyn AccountProvider>,
    pub(crate) logic: Box<dyn TransactionLogic>,
    pub(crate) bus: Box<dyn PoolBus>,
    pub(crate) logger: Logger,
    pub(crate) stats: PoolStats,
}

impl TransactionPool {
    /// Creates a pool with the given configuration and collaborators.
    pub fn new(
        config: PoolConfig,
        accounts: Box<dyn AccountProvider>,
        logic: Box<dyn TransactionLogic>,
        bus: Box<dyn PoolBus>,
        logger: Logger,
    ) -> Self {
        Self {
            store: PoolStore::new(),
            config,
            accounts,
            logic,
            bus,
            logger,
            stats: PoolStats::default(),
        }
    }

    /// The configuration the pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Admits transactions into the unverified partition.
    ///
    /// Transactions are admitted in order and the batch stops at the first
    /// rejection (pool full, cached invalid, or duplicate); transactions
    /// admitted before the failure stay in the pool. `received_at` is
    /// stamped here, never taken from the sender.
    pub fn add<I>(&mut self, txs: I) -> PoolResult<()>
    where
        I: IntoIterator<Item = Transaction>,
    {
        for tx in txs {
            self.admit(tx)?;
        }
        Ok(())
    }

    fn admit(&mut self, mut tx: Transaction) -> PoolResult<()> {
        if self.store.body_len() >= self.config.pool_storage_txs_limit {
            return Err(PoolError::PoolFull);
        }
        if self.store.is_invalid(&tx.id) {
            return Err(PoolError::AlreadyInvalid(tx.id));
        }
        if self.store.contains_body(&tx.id) {
            return Err(PoolError::Duplicate(tx.id));
        }

        tx.received_at = now();
        slog::debug!(self.logger, "transaction admitted";
            "tx" => %tx.id,
            "pool_size" => self.store.body_len() + 1,
        );
        self.store.insert(Partition::Unverified, tx);
        self.stats.added += 1;
        Ok(())
    }

    /// Re-stages transactions handed back by the ledger layer (block apply
    /// or rollback) directly into the ready partition.
    ///
    /// Any copy living in a body partition is replaced, the whole batch
    /// shares one `received_at` instant, and neither the duplicate nor the
    /// capacity check applies: the ledger layer is authoritative.
    pub fn add_ready<I>(&mut self, txs: I)
    where
        I: IntoIterator<Item = Transaction>,
    {
        let received_at = now();
        for mut tx in txs {
            self.store.remove_everywhere(&tx.id);
            tx.received_at = received_at;
            slog::debug!(self.logger, "transaction staged as ready"; "tx" => %tx.id);
            self.store.insert(Partition::Ready, tx);
            self.stats.added += 1;
        }
    }

    /// Deletes a transaction from every body partition it lives in and
    /// returns which partitions held it.
    ///
    /// More than one partition holding the same id means partition
    /// exclusivity was broken somewhere; it is logged and repaired here.
    pub fn remove(&mut self, id: &TxId) -> Vec<Partition> {
        let removed = self.store.remove_everywhere(id);
        if removed.len() > 1 {
            slog::warn!(self.logger, "transaction removed from multiple partitions";
                "tx" => %id,
                "partitions" => ?removed,
            );
        }
        if !removed.is_empty() {
            self.stats.removed += 1;
        }
        removed
    }

    /// Looks a transaction up across the body partitions.
    pub fn get(&self, id: &TxId) -> (Option<&Transaction>, TxStatus) {
        if let Some(tx) = self.store.get(Partition::Unverified, id) {
            return (Some(tx), TxStatus::Unverified);
        }
        if let Some(tx) = self.store.get(Partition::Pending, id) {
            return (Some(tx), TxStatus::Pending);
        }
        if let Some(tx) = self.store.get(Partition::Ready, id) {
            return (Some(tx), TxStatus::Ready);
        }
        (None, TxStatus::NotInPool)
    }

    /// Looks up an unverified transaction by id.
    pub fn get_unverified(&self, id: &TxId) -> Option<&Transaction> {
        self.store.get(Partition::Unverified, id)
    }

    /// Looks up a pending transaction by id.
    pub fn get_pending(&self, id: &TxId) -> Option<&Transaction> {
        self.store.get(Partition::Pending, id)
    }

    /// Looks up a ready transaction by id.
    pub fn get_ready_by_id(&self, id: &TxId) -> Option<&Transaction> {
        self.store.get(Partition::Ready, id)
    }

    /// Whether the id lives in any body partition.
    pub fn transaction_in_pool(&self, id: &TxId) -> bool {
        self.store.contains_body(id)
    }

    /// Generic listing query.
    ///
    /// `unverified`, `pending` and `ready` return the partition's ids in
    /// insertion order, after the optional reverse and limit in
    /// `params`. `sender_id` and `recipient_id` return partition-tagged
    /// transactions matching `params.address`. Any other filter string is
    /// answered with [`ListResult::InvalidFilter`].
    pub fn list(&self, filter: &str, params: &ListParams) -> ListResult {
        match filter {
            "unverified" => ListResult::Ids(self.partition_ids(Partition::Unverified, params)),
            "pending" => ListResult::Ids(self.partition_ids(Partition::Pending, params)),
            "ready" => ListResult::Ids(self.partition_ids(Partition::Ready, params)),
            "sender_id" => {
                ListResult::Matches(self.matching(|tx| Some(tx.sender_id) == params.address))
            }
            "recipient_id" => {
                ListResult::Matches(self.matching(|tx| tx.recipient_id == params.address))
            }
            _ => ListResult::InvalidFilter,
        }
    }

    fn partition_ids(&self, partition: Partition, params: &ListParams) -> Vec<TxId> {
        let mut ids = self.store.keys(partition);
        if params.reverse {
            ids.reverse();
        }
        if let Some(limit) = params.limit {
            ids.truncate(limit);
        }
        ids
    }

    fn matching<F>(&self, pred: F) -> PartitionedTxs
    where
        F: Fn(&Transaction) -> bool,
    {
        let collect = |partition| {
            self.store
                .iter(partition)
                .filter(|tx| pred(tx))
                .cloned()
                .collect()
        };
        PartitionedTxs {
            unverified: collect(Partition::Unverified),
            pending: collect(Partition::Pending),
            ready: collect(Partition::Ready),
        }
    }

    /// Snapshot of the ready partition for the block producer.
    ///
    /// Ordered by fee descending and, within equal fee, by arrival time
    /// ascending. This ordering is the contract block production relies
    /// on.
    pub fn get_ready(&self, limit: Option<usize>) -> Vec<Transaction> {
        let mut snapshot: Vec<Transaction> = self.store.iter(Partition::Ready).cloned().collect();
        snapshot.sort_by(|a, b| {
            b.fee
                .cmp(&a.fee)
                .then_with(|| a.received_at.cmp(&b.received_at))
        });
        if let Some(limit) = limit {
            snapshot.truncate(limit);
        }
        snapshot
    }

    /// Per-partition occupancy counts.
    pub fn usage(&self) -> PoolUsage {
        PoolUsage {
            unverified: self.store.len(Partition::Unverified),
            pending: self.store.len(Partition::Pending),
            ready: self.store.len(Partition::Ready),
        }
    }

    /// Cumulative counters since creation.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Number of ids currently cached as invalid.
    pub fn invalid_count(&self) -> usize {
        self.store.invalid_len()
    }

    /// Whether the transaction is routed to pending rather than ready.
    ///
    /// Multisignature registrations wait for their co-signer group,
    /// co-signed transactions wait for the remaining signatures, and
    /// future-dated transactions wait for their timestamp to mature.
    pub(crate) fn defers_to_pending(tx: &Transaction) -> bool {
        tx.tx_type == TransactionType::Multi
            || tx.has_signatures()
            || (tx.received_at as i64) < tx.timestamp
    }

    #[cfg(test)]
    pub(crate) fn set_received_at(&mut self, id: &TxId, received_at: u64) {
        self.store.set_received_at(id, received_at);
    }
}
