//! # Core Domain Entities
//!
//! Defines the core blockchain entities shared across subsystems.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `Transaction`
//! - **Consensus**: `Delegate`, `BlocksStat`
//! - **Networking**: `Peer`, `SyncStatus`
//! - **Ledger contract**: `AccountDelta`, `AccountTarget`
//! - **Forensics**: `ForkEvent`, `ForkCause`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 public key. Delegates are identified by public key.
pub type PublicKey = [u8; 32];

/// A block identifier (hash of the signed block payload).
pub type BlockId = Hash;

/// A ledger account address. Opaque to the consensus core; the ledger store
/// owns address derivation and formatting.
pub type Address = String;

/// A block in the chain. Immutable once accepted; `height` forms a strictly
/// increasing chain from the genesis block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Unique block identifier.
    pub id: BlockId,
    /// Height in the chain, starting at 1 for genesis.
    pub height: u64,
    /// Unix timestamp (seconds) at which the block was forged.
    pub timestamp: u64,
    /// Identifier of the parent block. `None` only for genesis.
    pub previous_block: Option<BlockId>,
    /// Public key of the delegate that forged this block.
    pub generator_public_key: PublicKey,
    /// Sum of all transaction fees carried by this block.
    pub total_fee: u64,
    /// Transactions in application order.
    pub transactions: Vec<Transaction>,
}

/// A minimal transaction shape. The full transaction-type catalog lives in
/// the transaction subsystem; the consensus core only needs fees, the sender
/// identity, and the optional delegate-registration asset.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier.
    pub id: Hash,
    /// Sender's public key.
    pub sender_public_key: PublicKey,
    /// Recipient address, if any.
    pub recipient: Option<Address>,
    /// Transferred amount in base units.
    pub amount: u64,
    /// Fee in base units.
    pub fee: u64,
    /// Unix timestamp (seconds).
    pub timestamp: u64,
    /// Delegate-registration asset, when this transaction registers one.
    pub delegate: Option<DelegateAsset>,
    /// Sender's signature over the transaction.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// The delegate-registration payload carried by a registration transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateAsset {
    /// Requested delegate username.
    pub username: String,
}

/// A delegate eligible to forge blocks, ranked by cumulative vote weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegate {
    /// The delegate's public key (identity).
    pub public_key: PublicKey,
    /// Registered username, if any.
    pub username: Option<String>,
    /// Cumulative vote weight. Source of truth for active-list ranking.
    pub vote: u64,
    /// Fees accrued from round distributions. Signed: rollback subtracts.
    pub accrued_fee: i64,
    /// Identifier of the registration transaction.
    pub transaction_id: Option<Hash>,
}

impl Delegate {
    /// A delegate with no votes and no accrued fees.
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            username: None,
            vote: 0,
            accrued_fee: 0,
            transaction_id: None,
        }
    }
}

/// Forged/missed block counters for one delegate.
///
/// Both fields are `None` (absence, not zero) until the delegate has any
/// recorded activity, to distinguish a brand-new delegate from one with zero
/// misses. Counters are signed because backward replay can transiently drive
/// them negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocksStat {
    /// Blocks forged, if any activity was recorded.
    pub forged: Option<i64>,
    /// Blocks missed, if any activity was recorded.
    pub missed: Option<i64>,
}

/// A peer in the network, identified by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    /// IPv4 address as a packed integer.
    pub ip: u32,
    /// TCP port.
    pub port: u16,
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let b = self.ip.to_be_bytes();
        write!(f, "{}.{}.{}.{}:{}", b[0], b[1], b[2], b[3], self.port)
    }
}

/// Sync progress exposed to operators and telemetry collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Whether the chain bootstrap completed.
    pub loaded: bool,
    /// Total persisted block count observed at bootstrap.
    pub blocks_count: u64,
    /// Whether a sync cycle is currently running.
    pub syncing: bool,
    /// Peer-reported target height of the sync in progress, 0 when idle.
    pub blocks_remaining: u64,
    /// Local chain height.
    pub height: u64,
}

/// Target of an account merge: the ledger resolves either form to the same
/// account record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountTarget {
    /// Resolve by ledger address.
    Address(Address),
    /// Resolve by public key.
    PublicKey(PublicKey),
}

/// Input to the ledger store's `merge_account_and_get` contract. Balance
/// fields are deltas: the merge is additive, never an overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDelta {
    /// The account to merge into.
    pub target: AccountTarget,
    /// Confirmed balance delta (may be negative).
    pub balance: i64,
    /// Unconfirmed balance delta (may be negative).
    pub unconfirmed_balance: i64,
}

impl AccountDelta {
    /// A delta applying the same amount to both balance fields.
    pub fn symmetric(target: AccountTarget, amount: i64) -> Self {
        Self {
            target,
            balance: amount,
            unconfirmed_balance: amount,
        }
    }
}

/// Why a fork/rollback event was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForkCause {
    /// The peer's chain diverged from ours at a common ancestor.
    CommonAncestorMismatch,
    /// Divergence exceeded the rollback bound; no rollback attempted.
    LongFork,
    /// Replacement blocks from the peer failed validation mid-load.
    InvalidReplacement,
}

/// Append-only forensic record written whenever a fork or rollback is
/// detected, for offline replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkEvent {
    /// Generator of the block at the divergence point.
    pub generator_public_key: PublicKey,
    /// Timestamp of that block.
    pub block_timestamp: u64,
    /// Identifier of that block.
    pub block_id: BlockId,
    /// Height of that block.
    pub block_height: u64,
    /// Parent of that block.
    pub previous_block: Option<BlockId>,
    /// Classification of the event.
    pub cause: ForkCause,
}
