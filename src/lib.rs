//! # DNZ Chain - a minimal proof-of-work token ledger
//!
//! Each node keeps a chain of blocks in memory, a pool of pending signed
//! token transfers, and the set of peers it discovered on its local
//! neighbourhood of hosts and ports. Nodes mine on a timer, tell each other
//! to clear their pools and run consensus, and adopt the longest valid chain.
//!
//! ## Layout
//! - `core/`: amounts, transactions, blocks, proof-of-work and the ledger
//! - `wallet/`: P-256 key pairs, addresses and transaction signing
//! - `network/`: the HTTP node API, the peer client and peer discovery
//! - `storage/`: the durable head hash and the transaction pool
//! - `config/`: `CHAIN_*` environment and TOML configuration
//! - `utils/`: hashing, signatures, hex codecs and periodic background tasks
//! - `cli/`: command-line parsing for the node binary
//!
//! Only the hash of the last block survives a restart. A restarted node
//! starts a fresh chain whose genesis links to that hash and catches up
//! through consensus.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

pub use cli::{Command, Opt};
pub use config::ChainConfig;
pub use core::{
    Amount, Block, Blockchain, NodeTasks, ProofOfWork, Token, Transaction, TransactionRequest,
};
pub use error::{BlockchainError, Result};
pub use network::{run_server, HttpPeerClient, Node, Nodes, PeerClient, PeerScanner};
pub use storage::{HeadStore, MemoryPool};
pub use utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest, sha256_digest, PublicKey,
    Signature,
};
pub use wallet::{convert_address, hash_pub_key, validate_address, Wallet, ADDRESS_CHECK_SUM_LEN};
