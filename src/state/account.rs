use crate::state::address::{Address, PublicKey};

/// [`Account`] is the ledger-side view of a spending identity.
///
/// The pool only reads the confirmed balance and the multisignature group;
/// account rows live in the account store collaborator and are handed to the
/// pool by value.
#[derive(Clone, Debug)]
pub struct Account {
    /// The account's address
    pub address: Address,
    /// The account's public key
    pub public_key: PublicKey,
    /// Confirmed on-chain balance
    pub balance: u64,
    /// Public keys of the account's multisignature group, empty for
    /// plain accounts
    pub multisignatures: Vec<PublicKey>,
}

impl Account {
    pub fn new(public_key: PublicKey, balance: u64) -> Self {
        Self {
            address: public_key.address(),
            public_key,
            balance,
            multisignatures: Vec::new(),
        }
    }

    /// Attaches a multisignature group to the account.
    pub fn with_multisignatures(mut self, keys: Vec<PublicKey>) -> Self {
        self.multisignatures = keys;
        self
    }

    /// Whether the account is governed by a multisignature group.
    pub fn has_multisignature_group(&self) -> bool {
        !self.multisignatures.is_empty()
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for Account {}
