//! Core ledger functionality
//!
//! Blocks, token transfers, the decimal amount type, proof-of-work and the
//! `Blockchain` ledger that ties them together with the pool and peers.

pub mod amount;
pub mod block;
pub mod blockchain;
pub mod proof_of_work;
pub mod transaction;

pub use amount::Amount;
pub use block::Block;
pub use blockchain::{balance_of, validate_chain, Blockchain, NodeTasks};
pub use proof_of_work::{meets_difficulty, proof_of_work, valid_proof, ProofOfWork};
pub use transaction::{DecodedRequest, Token, Transaction, TransactionRequest};
