//! Test utilities for ledger testing

use crate::config::ChainConfig;
use crate::core::{proof_of_work, Block, Blockchain, Token, Transaction, TransactionRequest};
use crate::error::{BlockchainError, Result};
use crate::network::PeerClient;
use crate::storage::HeadStore;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const TEST_MINER_ADDRESS: &str = "MINER";

/// In-memory stand-in for the HTTP peer client. Records every outbound call
/// as `"<METHOD> <node><path>"`.
#[derive(Default)]
pub struct MockPeerClient {
    chains: Mutex<HashMap<String, Vec<Block>>>,
    reachable: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockPeerClient {
    pub fn new() -> MockPeerClient {
        MockPeerClient::default()
    }

    pub fn set_chain(&self, node: &str, chain: Vec<Block>) {
        self.chains.lock().unwrap().insert(node.to_string(), chain);
    }

    pub fn set_reachable(&self, node: &str) {
        self.reachable.lock().unwrap().insert(node.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PeerClient for MockPeerClient {
    fn fetch_chain(&self, node: &str) -> Result<Vec<Block>> {
        self.record(format!("GET {node}/chain"));
        self.chains
            .lock()
            .unwrap()
            .get(node)
            .cloned()
            .ok_or_else(|| BlockchainError::Network(format!("{node} unreachable")))
    }

    fn request_consensus(&self, node: &str) -> Result<()> {
        self.record(format!("PUT {node}/consensus"));
        Ok(())
    }

    fn request_clear_pool(&self, node: &str) -> Result<()> {
        self.record(format!("DELETE {node}/transactions"));
        Ok(())
    }

    fn forward_transaction(&self, node: &str, _request: &TransactionRequest) -> Result<()> {
        self.record(format!("PUT {node}/transactions"));
        Ok(())
    }

    fn is_reachable(&self, addr: &SocketAddr) -> bool {
        self.reachable.lock().unwrap().contains(&addr.to_string())
    }
}

pub fn dnz(value: &str) -> Token {
    Token::new("DNZ", value.parse().unwrap())
}

/// A ledger at `difficulty` with temporary storage and a mock peer client.
pub fn create_test_blockchain(
    difficulty: usize,
) -> Result<(Blockchain, Arc<MockPeerClient>, TempDir)> {
    let temp_dir = tempfile::tempdir()?;
    let head_store = HeadStore::open(&temp_dir.path().join("head"))?;
    let client = Arc::new(MockPeerClient::new());
    let config = ChainConfig {
        difficulty,
        ..ChainConfig::default()
    };
    let peer_client: Arc<dyn PeerClient> = client.clone();
    let blockchain =
        Blockchain::create_blockchain(TEST_MINER_ADDRESS, config, head_store, peer_client)?;
    Ok((blockchain, client, temp_dir))
}

/// A properly linked and proven chain of `len` blocks, one reward per block.
pub fn build_valid_chain(len: usize, difficulty: usize) -> Vec<Block> {
    let mut chain = Vec::with_capacity(len);
    let mut previous_hash = Block::empty().hash();
    for i in 0..len {
        let transactions = if i == 0 {
            Vec::new()
        } else {
            vec![Transaction::new("DENIZ", "PEER", dnz("1"))]
        };
        let nonce = proof_of_work(&transactions, &previous_hash, difficulty);
        let block = Block::with_timestamp(i as i64 + 1, nonce, previous_hash, transactions);
        previous_hash = block.hash();
        chain.push(block);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validate_chain;

    #[test]
    fn test_create_test_blockchain() {
        let (blockchain, client, _temp_dir) = create_test_blockchain(1).unwrap();
        assert_eq!(blockchain.len(), 1);
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_build_valid_chain() {
        let chain = build_valid_chain(4, 2);
        assert_eq!(chain.len(), 4);
        assert!(validate_chain(&chain, 2));
    }

    #[test]
    fn test_mock_reports_unknown_peer() {
        let client = MockPeerClient::new();
        assert!(client.fetch_chain("127.0.0.1:9").is_err());
        assert_eq!(client.calls(), vec!["GET 127.0.0.1:9/chain".to_string()]);
    }
}
