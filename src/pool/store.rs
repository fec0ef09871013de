//! Partitioned transaction storage.
//!
//! Three body partitions hold full transactions keyed by id in insertion
//! order; a fourth holds only the ids of recently rejected transactions.
//! A transaction id must never live in more than one body partition at a
//! time, and the union of the body partitions is what the pool-wide storage
//! limit bounds.

use indexmap::{IndexMap, IndexSet};

use crate::state::transaction::{Transaction, TxId};

/// One of the three body partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Partition {
    /// Admitted but not yet cryptographically checked
    Unverified,
    /// Verified, waiting on co-signatures or timestamp maturity
    Pending,
    /// Verified and schedulable; the block producer draws from here
    Ready,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Unverified => write!(f, "unverified"),
            Partition::Pending => write!(f, "pending"),
            Partition::Ready => write!(f, "ready"),
        }
    }
}

/// Insertion-ordered storage for the four partitions.
///
/// Lookups are O(1); removal uses `shift_remove` so each partition keeps
/// FIFO scan order.
#[derive(Debug, Default)]
pub struct PoolStore {
    unverified: IndexMap<TxId, Transaction>,
    pending: IndexMap<TxId, Transaction>,
    ready: IndexMap<TxId, Transaction>,
    invalid: IndexSet<TxId>,
}

impl PoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, partition: Partition) -> &IndexMap<TxId, Transaction> {
        match partition {
            Partition::Unverified => &self.unverified,
            Partition::Pending => &self.pending,
            Partition::Ready => &self.ready,
        }
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut IndexMap<TxId, Transaction> {
        match partition {
            Partition::Unverified => &mut self.unverified,
            Partition::Pending => &mut self.pending,
            Partition::Ready => &mut self.ready,
        }
    }

    /// Inserts a transaction into the given partition.
    pub fn insert(&mut self, partition: Partition, tx: Transaction) {
        self.partition_mut(partition).insert(tx.id, tx);
    }

    /// Looks up a transaction in one partition.
    pub fn get(&self, partition: Partition, id: &TxId) -> Option<&Transaction> {
        self.partition(partition).get(id)
    }

    /// Number of transactions in one partition.
    pub fn len(&self, partition: Partition) -> usize {
        self.partition(partition).len()
    }

    /// Total number of transactions across the body partitions.
    pub fn body_len(&self) -> usize {
        self.unverified.len() + self.pending.len() + self.ready.len()
    }

    /// Whether the id lives in any body partition.
    pub fn contains_body(&self, id: &TxId) -> bool {
        self.unverified.contains_key(id)
            || self.pending.contains_key(id)
            || self.ready.contains_key(id)
    }

    /// Ids of one partition in insertion order.
    ///
    /// Returns an owned snapshot so callers can mutate the store while
    /// walking it; entries inserted after the snapshot are not visited.
    pub fn keys(&self, partition: Partition) -> Vec<TxId> {
        self.partition(partition).keys().copied().collect()
    }

    /// Iterates every transaction in the body partitions, unverified
    /// first, then pending, then ready.
    pub fn iter_bodies(&self) -> impl Iterator<Item = &Transaction> {
        self.unverified
            .values()
            .chain(self.pending.values())
            .chain(self.ready.values())
    }

    /// Transactions of one partition in insertion order.
    pub fn iter(&self, partition: Partition) -> impl Iterator<Item = &Transaction> {
        self.partition(partition).values()
    }

    /// Removes an id from a single partition, preserving scan order of the
    /// remaining entries.
    ///
    /// This is the only deletion primitive; every removal path goes
    /// through it.
    pub fn remove_from(&mut self, partition: Partition, id: &TxId) -> Option<Transaction> {
        self.partition_mut(partition).shift_remove(id)
    }

    /// Removes an id from every body partition it lives in and reports
    /// which ones held it.
    pub fn remove_everywhere(&mut self, id: &TxId) -> Vec<Partition> {
        let mut removed = Vec::new();
        for partition in [Partition::Unverified, Partition::Pending, Partition::Ready] {
            if self.remove_from(partition, id).is_some() {
                removed.push(partition);
            }
        }
        removed
    }

    /// Records an id in the invalid cache.
    pub fn mark_invalid(&mut self, id: TxId) {
        self.invalid.insert(id);
    }

    /// Whether the id is cached as invalid.
    pub fn is_invalid(&self, id: &TxId) -> bool {
        self.invalid.contains(id)
    }

    /// Number of ids in the invalid cache.
    pub fn invalid_len(&self) -> usize {
        self.invalid.len()
    }

    /// Empties the invalid cache and returns how many ids it held.
    pub fn clear_invalid(&mut self) -> usize {
        let cleared = self.invalid.len();
        self.invalid.clear();
        cleared
    }

    #[cfg(test)]
    pub(crate) fn set_received_at(&mut self, id: &TxId, received_at: u64) {
        for partition in [Partition::Unverified, Partition::Pending, Partition::Ready] {
            if let Some(tx) = self.partition_mut(partition).get_mut(id) {
                tx.received_at = received_at;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::address::{Address, PublicKey};

    fn tx(byte: u8) -> Transaction {
        Transaction::new_send(
            PublicKey::from_bytes([byte; 32]),
            Address::from_bytes([0xFF; 32]),
            100,
            u64::from(byte),
        )
    }

    #[test]
    fn insert_and_lookup_per_partition() {
        let mut store = PoolStore::new();
        let t = tx(1);
        let id = t.id;
        store.insert(Partition::Unverified, t);

        assert!(store.get(Partition::Unverified, &id).is_some());
        assert!(store.get(Partition::Pending, &id).is_none());
        assert!(store.contains_body(&id));
        assert_eq!(store.body_len(), 1);
    }

    #[test]
    fn keys_preserve_insertion_order_after_removal() {
        let mut store = PoolStore::new();
        let txs: Vec<_> = (1..=4).map(tx).collect();
        let ids: Vec<_> = txs.iter().map(|t| t.id).collect();
        for t in txs {
            store.insert(Partition::Ready, t);
        }

        store.remove_from(Partition::Ready, &ids[1]);

        let remaining = store.keys(Partition::Ready);
        assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn remove_everywhere_reports_partitions() {
        let mut store = PoolStore::new();
        let t = tx(1);
        let id = t.id;
        store.insert(Partition::Pending, t.clone());
        store.insert(Partition::Ready, t);

        let removed = store.remove_everywhere(&id);
        assert_eq!(removed, vec![Partition::Pending, Partition::Ready]);
        assert!(!store.contains_body(&id));
    }

    #[test]
    fn invalid_cache_marks_and_clears() {
        let mut store = PoolStore::new();
        let id = tx(1).id;
        assert!(!store.is_invalid(&id));

        store.mark_invalid(id);
        assert!(store.is_invalid(&id));
        assert_eq!(store.invalid_len(), 1);

        assert_eq!(store.clear_invalid(), 1);
        assert!(!store.is_invalid(&id));
        assert_eq!(store.invalid_len(), 0);
    }
}
