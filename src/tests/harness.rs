//! Test collaborators and fixture builders.
//!
//! The pool's collaborator seams are filled with in-memory fakes: an
//! account map, a scriptable transaction logic, and a bus that records
//! every announcement.

use std::{
    collections::{HashMap, HashSet},
    env,
    str::FromStr,
    sync::{Arc, Mutex},
};

use anyhow::{Result, bail};
use slog::{Drain, Level, Logger};

use crate::{
    config::PoolConfig,
    pool::{
        TransactionPool,
        traits::{AccountProvider, PoolBus, TransactionLogic},
    },
    state::{
        account::Account,
        address::{Address, PublicKey},
        transaction::{Transaction, TxId},
    },
};

/// Creates a logger for integration tests with configurable log levels.
///
/// Respects the `RUST_LOG` environment variable (`error`, `warn`, `info`,
/// `debug`); defaults to errors only so test output stays quiet.
pub fn create_test_logger() -> Logger {
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|env_str| Level::from_str(&env_str).ok())
        .unwrap_or(Level::Error);

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain)
        .build()
        .fuse()
        .filter_level(log_level)
        .fuse();
    Logger::root(drain, slog::o!())
}

/// In-memory account store.
pub struct MemoryAccounts {
    accounts: HashMap<PublicKey, Account>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Creates a fresh funded account and returns its keys.
    pub fn fund(&mut self, balance: u64) -> (PublicKey, Address) {
        let pk = PublicKey::from_bytes(rand::random());
        self.accounts.insert(pk, Account::new(pk, balance));
        (pk, pk.address())
    }

    /// Inserts a prepared account row.
    pub fn insert_account(&mut self, account: Account) {
        self.accounts.insert(account.public_key, account);
    }
}

impl AccountProvider for MemoryAccounts {
    fn ensure_account(&mut self, public_key: &PublicKey) -> Result<Account> {
        Ok(self
            .accounts
            .entry(*public_key)
            .or_insert_with(|| Account::new(*public_key, 0))
            .clone())
    }

    fn account_by_public_key(&self, public_key: &PublicKey) -> Result<Option<Account>> {
        Ok(self.accounts.get(public_key).cloned())
    }

    fn balance(&self, address: &Address) -> Result<u64> {
        Ok(self
            .accounts
            .values()
            .find(|account| account.address == *address)
            .map(|account| account.balance)
            .unwrap_or(0))
    }
}

/// Transaction logic that passes everything except explicitly scripted ids.
pub struct ScriptedLogic {
    fail_process: HashSet<TxId>,
    fail_verify: HashSet<TxId>,
}

impl ScriptedLogic {
    /// Accepts every transaction.
    pub fn permissive() -> Self {
        Self {
            fail_process: HashSet::new(),
            fail_verify: HashSet::new(),
        }
    }

    /// Fails `verify` for the given ids.
    pub fn failing_verify<I: IntoIterator<Item = TxId>>(ids: I) -> Self {
        Self {
            fail_process: HashSet::new(),
            fail_verify: ids.into_iter().collect(),
        }
    }

    /// Fails `process` for the given ids.
    pub fn failing_process<I: IntoIterator<Item = TxId>>(ids: I) -> Self {
        Self {
            fail_process: ids.into_iter().collect(),
            fail_verify: HashSet::new(),
        }
    }
}

impl TransactionLogic for ScriptedLogic {
    fn process(
        &mut self,
        tx: &Transaction,
        _sender: &Account,
        _requester: Option<&Account>,
    ) -> Result<()> {
        if self.fail_process.contains(&tx.id) {
            bail!("unknown transaction type");
        }
        Ok(())
    }

    fn object_normalize(&self, _tx: &mut Transaction) -> Result<()> {
        Ok(())
    }

    fn verify(&self, tx: &Transaction, _sender: &Account) -> Result<()> {
        if self.fail_verify.contains(&tx.id) {
            bail!("failed to verify signature");
        }
        Ok(())
    }
}

/// Bus that records every announcement.
pub struct RecordingBus {
    pub events: Arc<Mutex<Vec<(TxId, bool)>>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl PoolBus for RecordingBus {
    fn unconfirmed_transaction(&mut self, tx: &Transaction, broadcast: bool) {
        self.events.lock().unwrap().push((tx.id, broadcast));
    }
}

/// Builds a pool over the in-memory collaborators, returning the bus
/// event log alongside it.
pub fn test_pool_with(
    config: PoolConfig,
    accounts: MemoryAccounts,
    logic: ScriptedLogic,
) -> (TransactionPool, Arc<Mutex<Vec<(TxId, bool)>>>) {
    let bus = RecordingBus::new();
    let events = Arc::clone(&bus.events);
    let pool = TransactionPool::new(
        config,
        Box::new(accounts),
        Box::new(logic),
        Box::new(bus),
        Logger::root(slog::Discard, slog::o!()),
    );
    (pool, events)
}

/// Configuration with intervals short enough for timed tests.
pub fn fast_config() -> PoolConfig {
    PoolConfig {
        pool_process_interval_ms: 10,
        pool_expiry_interval_ms: 50,
        ..PoolConfig::default()
    }
}

/// A value transfer to a random recipient.
pub fn send_tx(sender: PublicKey, amount: u64, fee: u64) -> Transaction {
    Transaction::new_send(sender, Address::from_bytes(rand::random()), amount, fee)
}

/// A multisignature group registration with two random co-signers.
pub fn multi_tx(sender: PublicKey, fee: u64, lifetime: u16) -> Transaction {
    Transaction::new_multisig(
        sender,
        fee,
        2,
        lifetime,
        vec![
            PublicKey::from_bytes(rand::random()),
            PublicKey::from_bytes(rand::random()),
        ],
    )
}
