//! Processing engine: the periodic tick that drains unverified entries
//! through the verifier pipeline and the projected-balance check.
//!
//! The on-chain balance lags behind the pool: spends and receipts already
//! staged here will settle before any new transaction. Admission to the
//! verified partitions therefore checks the candidate against the
//! *projected* balance, the confirmed balance adjusted by every staged
//! transaction touching the same address. Sums run in arbitrary-precision
//! integers so a long queue of large transactions cannot overflow.

use num_bigint::{BigInt, Sign};

use crate::{
    error::{PoolError, PoolResult},
    pool::{store::Partition, types::ProcessSummary},
    state::{
        address::Address,
        now,
        transaction::{Transaction, TransactionType},
    },
};

use super::pool::TransactionPool;

/// Smallest display unit: balances render with eight decimal places.
pub const DISPLAY_UNIT: u64 = 100_000_000;

impl TransactionPool {
    /// One processing tick.
    ///
    /// Phase A drains the unverified partition in insertion order: each
    /// entry runs the verifier pipeline (failure caches the id as invalid)
    /// and the balance check (failure drops the entry silently, balances
    /// change), then lands in pending or ready. Phase B promotes every
    /// pending entry that existed when the tick began. Per-entry failures
    /// never abort the tick.
    pub fn process_pool(&mut self) -> ProcessSummary {
        let mut summary = ProcessSummary::default();

        // Both snapshots are taken up front: entries that arrive in a
        // partition while the tick runs wait for the next one.
        let unverified = self.store.keys(Partition::Unverified);
        let pending = self.store.keys(Partition::Pending);

        for id in unverified {
            let Some(mut tx) = self.store.remove_from(Partition::Unverified, &id) else {
                continue;
            };
            if let Err(err) = self.process_unverified_transaction(&mut tx, true) {
                slog::error!(self.logger, "transaction failed verification";
                    "tx" => %id,
                    "error" => %err,
                );
                self.store.mark_invalid(id);
                self.stats.invalidated += 1;
                summary.invalidated += 1;
                continue;
            }
            let sender = tx.sender_id;
            if let Err(err) = self.check_balance(&tx, &sender) {
                slog::error!(self.logger, "transaction dropped";
                    "tx" => %id,
                    "error" => %err,
                );
                summary.dropped += 1;
                continue;
            }
            tx.received_at = now();
            if Self::defers_to_pending(&tx) {
                self.store.insert(Partition::Pending, tx);
                summary.pending += 1;
            } else {
                self.store.insert(Partition::Ready, tx);
                summary.ready += 1;
            }
        }

        for id in pending {
            let Some(mut tx) = self.store.remove_from(Partition::Pending, &id) else {
                continue;
            };
            tx.received_at = now();
            self.store.insert(Partition::Ready, tx);
            summary.promoted += 1;
        }

        if summary.ready + summary.pending + summary.invalidated + summary.dropped + summary.promoted
            > 0
        {
            slog::debug!(self.logger, "pool processed";
                "ready" => summary.ready,
                "pending" => summary.pending,
                "promoted" => summary.promoted,
                "invalidated" => summary.invalidated,
                "dropped" => summary.dropped,
            );
        }
        summary
    }

    /// Runs one transaction through the verifier pipeline.
    ///
    /// Resolves the sender (creating the account row when new), resolves
    /// the requester for multisignature accounts, then hands the
    /// transaction to the logic collaborator: `process`, `object_normalize`
    /// (which may canonicalize it in place) and `verify`. Success announces
    /// the transaction on the bus.
    fn process_unverified_transaction(
        &mut self,
        tx: &mut Transaction,
        broadcast: bool,
    ) -> PoolResult<()> {
        let sender = self
            .accounts
            .ensure_account(&tx.sender_public_key)
            .map_err(|err| PoolError::Account(err.to_string()))?;

        let requester = match (&tx.requester_public_key, sender.has_multisignature_group()) {
            (Some(key), true) => {
                let account = self
                    .accounts
                    .account_by_public_key(key)
                    .map_err(|err| PoolError::Account(err.to_string()))?;
                match account {
                    Some(account) => Some(account),
                    None => return Err(PoolError::RequesterNotFound(tx.id)),
                }
            }
            _ => None,
        };

        self.logic
            .process(tx, &sender, requester.as_ref())
            .map_err(|err| PoolError::Verification {
                id: tx.id,
                reason: err.to_string(),
            })?;
        self.logic
            .object_normalize(tx)
            .map_err(|err| PoolError::Verification {
                id: tx.id,
                reason: err.to_string(),
            })?;
        self.logic
            .verify(tx, &sender)
            .map_err(|err| PoolError::Verification {
                id: tx.id,
                reason: err.to_string(),
            })?;

        self.bus.unconfirmed_transaction(tx, broadcast);
        Ok(())
    }

    /// Checks a candidate against the sender's projected balance.
    ///
    /// Projected balance = confirmed balance, minus amount plus fee of
    /// every staged transaction the address sends, plus the amount of
    /// every staged value transfer it receives. Only `Send` transactions
    /// credit their recipient; other kinds move no value in the pool's
    /// view. Returns the projected balance on success.
    pub fn check_balance(&self, tx: &Transaction, sender: &Address) -> PoolResult<BigInt> {
        let confirmed = self
            .accounts
            .balance(sender)
            .map_err(|err| PoolError::Account(err.to_string()))?;

        let mut pool_balance = BigInt::from(0u8);
        for staged in self.store.iter_bodies() {
            if staged.sender_id == *sender {
                pool_balance -=
                    BigInt::from(staged.amount.unwrap_or(0)) + BigInt::from(staged.fee);
            }
            if staged.tx_type == TransactionType::Send && staged.recipient_id == Some(*sender) {
                pool_balance += BigInt::from(staged.amount.unwrap_or(0));
            }
        }

        let effective = BigInt::from(confirmed) + pool_balance;
        let cost = BigInt::from(tx.amount.unwrap_or(0)) + BigInt::from(tx.fee);
        if effective >= cost {
            Ok(effective)
        } else {
            Err(PoolError::InsufficientBalance {
                id: tx.id,
                effective: format_display_units(&effective),
            })
        }
    }
}

/// Renders a raw balance in display units, eight decimal places.
pub(crate) fn format_display_units(value: &BigInt) -> String {
    let sign = match value.sign() {
        Sign::Minus => "-",
        _ => "",
    };
    let unit = num_bigint::BigUint::from(DISPLAY_UNIT);
    let whole = value.magnitude() / &unit;
    let frac = (value.magnitude() % &unit).to_string();
    format!("{sign}{whole}.{frac:0>8}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_units_render_eight_decimals() {
        assert_eq!(format_display_units(&BigInt::from(0u8)), "0.00000000");
        assert_eq!(
            format_display_units(&BigInt::from(12_345_000_000u64)),
            "123.45000000"
        );
        assert_eq!(format_display_units(&BigInt::from(1u8)), "0.00000001");
        assert_eq!(
            format_display_units(&BigInt::from(-6_900_000_001i64)),
            "-69.00000001"
        );
    }

    #[test]
    fn display_units_survive_past_u64() {
        let big = BigInt::from(u64::MAX) * BigInt::from(10u8);
        assert_eq!(format_display_units(&big), "1844674407370.95516150");
    }
}
