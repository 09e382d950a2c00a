use crate::core::Transaction;
use crate::error::Result;
use crate::utils::{current_timestamp, encode_hash, hex_hash, sha256_hash, Hash, HASH_LEN};
use serde::{Deserialize, Serialize};

/// One chain element. The hash is derived from the JSON serialization of all
/// four fields, in this order, so transaction order is part of the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    timestamp: i64,
    nonce: u64,
    #[serde(with = "hex_hash")]
    previous_hash: Hash,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Stamps the block with the current time. The nonce must already be known.
    pub fn new_block(nonce: u64, previous_hash: Hash, transactions: Vec<Transaction>) -> Result<Block> {
        Ok(Block {
            timestamp: current_timestamp()?,
            nonce,
            previous_hash,
            transactions,
        })
    }

    pub fn with_timestamp(
        timestamp: i64,
        nonce: u64,
        previous_hash: Hash,
        transactions: Vec<Transaction>,
    ) -> Block {
        Block {
            timestamp,
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// The zero-valued block. Its hash seeds the very first genesis block.
    pub fn empty() -> Block {
        Block::with_timestamp(0, 0, [0u8; HASH_LEN], Vec::new())
    }

    pub fn hash(&self) -> Hash {
        let bytes = serde_json::to_vec(self)
            .expect("Block serialization should never fail: all fields are strings or integers");
        sha256_hash(&bytes)
    }

    pub fn hash_hex(&self) -> String {
        encode_hash(&self.hash())
    }

    /// Hash of this block's proof candidate: same content with the timestamp
    /// zeroed. This is the digest the difficulty predicate is checked against.
    pub fn proof_hash(&self) -> Hash {
        Block::with_timestamp(0, self.nonce, self.previous_hash, self.transactions.clone()).hash()
    }

    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_previous_hash(&self) -> &Hash {
        &self.previous_hash
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }
}
