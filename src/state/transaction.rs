use crate::state::{
    address::{Address, PublicKey},
    now,
};

/// Unique transaction identifier, a hash of the transaction content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TxId(pub [u8; blake3::OUT_LEN]);

impl TxId {
    /// Derives an id by hashing arbitrary content bytes.
    pub fn from_content(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// Transaction kind.
///
/// The pool only branches on `Send` (value transfer, credits the recipient)
/// and `Multi` (multisignature group registration, deferred until
/// co-signatures arrive); every other kind is passed through unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Send,
    Signature,
    Delegate,
    Vote,
    Multi,
}

/// A co-signer signature attached to a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

/// Multisignature registration payload, present iff `tx_type == Multi`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigAsset {
    /// Minimum number of co-signatures required
    pub min: u8,
    /// Hours the registration may wait for co-signatures
    pub lifetime: u16,
    /// Public keys of the co-signer group
    pub keysgroup: Vec<PublicKey>,
}

/// [`Transaction`] is the unit the pool stages between arrival and block
/// inclusion.
///
/// The pool treats most fields as opaque routing data; semantic validity
/// (signatures, schema, per-type rules) is the transaction logic
/// collaborator's concern. `received_at` is owned by the pool: it is stamped
/// on admission and again on promotion, never trusted from the sender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Content-hash identifier
    pub id: TxId,
    /// Transaction kind
    pub tx_type: TransactionType,
    /// Address of the spending account
    pub sender_id: Address,
    /// Public key of the spending account
    pub sender_public_key: PublicKey,
    /// Public key of the group member submitting on behalf of a
    /// multisignature account, when different from the sender
    pub requester_public_key: Option<PublicKey>,
    /// Receiving address, for kinds that move value
    pub recipient_id: Option<Address>,
    /// Transferred value; absent for kinds that move no value
    pub amount: Option<u64>,
    /// Fee paid to the block producer
    pub fee: u64,
    /// Sender-declared epoch seconds; may lie in the future for
    /// time-locked transactions
    pub timestamp: i64,
    /// Co-signer signatures collected so far
    pub signatures: Vec<Signature>,
    /// Multisignature registration payload, `Multi` only
    pub asset: Option<MultisigAsset>,
    /// Epoch seconds at which the pool last admitted or promoted this
    /// transaction; written by the pool, never by the sender
    pub received_at: u64,
}

impl Transaction {
    /// Builds a value transfer.
    pub fn new_send(sender_public_key: PublicKey, recipient: Address, amount: u64, fee: u64) -> Self {
        let timestamp = now() as i64;
        let id = Self::content_id(
            0,
            &sender_public_key,
            Some(&recipient),
            Some(amount),
            fee,
            timestamp,
        );
        Self {
            id,
            tx_type: TransactionType::Send,
            sender_id: sender_public_key.address(),
            sender_public_key,
            requester_public_key: None,
            recipient_id: Some(recipient),
            amount: Some(amount),
            fee,
            timestamp,
            signatures: Vec::new(),
            asset: None,
            received_at: 0,
        }
    }

    /// Builds a multisignature group registration.
    pub fn new_multisig(
        sender_public_key: PublicKey,
        fee: u64,
        min: u8,
        lifetime: u16,
        keysgroup: Vec<PublicKey>,
    ) -> Self {
        let timestamp = now() as i64;
        let id = Self::content_id(4, &sender_public_key, None, None, fee, timestamp);
        Self {
            id,
            tx_type: TransactionType::Multi,
            sender_id: sender_public_key.address(),
            sender_public_key,
            requester_public_key: None,
            recipient_id: None,
            amount: None,
            fee,
            timestamp,
            signatures: Vec::new(),
            asset: Some(MultisigAsset {
                min,
                lifetime,
                keysgroup,
            }),
            received_at: 0,
        }
    }

    /// Whether any co-signer signatures have been collected.
    pub fn has_signatures(&self) -> bool {
        !self.signatures.is_empty()
    }

    fn content_id(
        kind: u8,
        sender_public_key: &PublicKey,
        recipient: Option<&Address>,
        amount: Option<u64>,
        fee: u64,
        timestamp: i64,
    ) -> TxId {
        let mut bytes = Vec::with_capacity(128);
        bytes.push(kind);
        bytes.extend_from_slice(sender_public_key.as_bytes());
        if let Some(recipient) = recipient {
            bytes.extend_from_slice(recipient.as_bytes());
        }
        bytes.extend_from_slice(&amount.unwrap_or(0).to_le_bytes());
        bytes.extend_from_slice(&fee.to_le_bytes());
        bytes.extend_from_slice(&timestamp.to_le_bytes());
        TxId::from_content(&bytes)
    }
}
