//! Aged eviction and the invalid-cache reset.

use crate::{
    pool::store::Partition,
    state::{
        now,
        transaction::{Transaction, TransactionType, TxId},
    },
};

use super::pool::TransactionPool;

/// Co-signed transactions wait this many times longer than plain ones.
const SIGNED_TIMEOUT_MULTIPLIER: u64 = 8;

impl TransactionPool {
    /// One expiry tick: scans unverified, then pending, then ready, and
    /// deletes every entry older than its residency timeout.
    ///
    /// Multisignature registrations live for their declared lifetime,
    /// co-signed transactions for eight times the base timeout, everything
    /// else for the base timeout. Expired ids are returned; they are not
    /// cached as invalid, so a re-gossiped copy may be admitted again.
    pub fn expire_transactions(&mut self) -> Vec<TxId> {
        let now = now();
        let mut expired = Vec::new();

        for partition in [Partition::Unverified, Partition::Pending, Partition::Ready] {
            for id in self.store.keys(partition) {
                let timed_out = {
                    let Some(tx) = self.store.get(partition, &id) else {
                        continue;
                    };
                    let timeout = self.timeout_secs(tx);
                    now.saturating_sub(tx.received_at) > timeout
                };
                if timed_out {
                    self.store.remove_from(partition, &id);
                    slog::debug!(self.logger, "transaction expired";
                        "tx" => %id,
                        "partition" => %partition,
                    );
                    expired.push(id);
                }
            }
        }

        self.stats.expired += expired.len() as u64;
        expired
    }

    /// Empties the invalid cache and returns how many ids were cleared.
    ///
    /// Runs on a coarse timer: long enough to suppress gossip re-flooding
    /// of a rejected id, short enough that the cache stays bounded.
    pub fn reset_invalid_transactions(&mut self) -> usize {
        let cleared = self.store.clear_invalid();
        if cleared > 0 {
            slog::info!(self.logger, "invalid transaction cache cleared"; "count" => cleared);
        }
        cleared
    }

    fn timeout_secs(&self, tx: &Transaction) -> u64 {
        if tx.tx_type == TransactionType::Multi {
            if let Some(asset) = &tx.asset {
                return u64::from(asset.lifetime) * 3600;
            }
        }
        if tx.has_signatures() {
            self.config.unconfirmed_transaction_timeout_secs * SIGNED_TIMEOUT_MULTIPLIER
        } else {
            self.config.unconfirmed_transaction_timeout_secs
        }
    }
}
