use anyhow::Result;

use crate::state::{
    account::Account,
    address::{Address, PublicKey},
    transaction::Transaction,
};

/// Trait for ledger-side account access.
pub trait AccountProvider: Send {
    /// Resolves the account owning `public_key`, creating an empty row
    /// when none exists yet.
    fn ensure_account(&mut self, public_key: &PublicKey) -> Result<Account>;

    /// Resolves an existing account by public key; `None` when absent.
    fn account_by_public_key(&self, public_key: &PublicKey) -> Result<Option<Account>>;

    /// Confirmed balance of an address.
    fn balance(&self, address: &Address) -> Result<u64>;
}

/// Trait for per-transaction semantic validation.
///
/// The three calls run in order and the first failure rejects the
/// transaction: `process` applies type-specific rules against the resolved
/// sender (and requester, for multisignature accounts), `object_normalize`
/// may rewrite the transaction into canonical form in place, and `verify`
/// checks signatures against the sender's keys.
pub trait TransactionLogic: Send {
    /// Apply type-specific processing rules.
    fn process(
        &mut self,
        tx: &Transaction,
        sender: &Account,
        requester: Option<&Account>,
    ) -> Result<()>;

    /// Canonicalize the transaction in place.
    fn object_normalize(&self, tx: &mut Transaction) -> Result<()>;

    /// Verify signatures against the sender's keys.
    fn verify(&self, tx: &Transaction, sender: &Account) -> Result<()>;
}

/// Trait for the node-internal message bus.
pub trait PoolBus: Send {
    /// Announces a freshly verified transaction; fire-and-forget. The
    /// broadcast flag asks the gossip layer to relay it to peers.
    fn unconfirmed_transaction(&mut self, tx: &Transaction, broadcast: bool);
}
