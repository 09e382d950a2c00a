use crate::core::{Block, TransactionRequest};
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Body of `GET /chain`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainPayload {
    pub chain: Vec<Block>,
}

/// Outbound calls a node makes to its peers. Every call is bounded by a
/// timeout, and none of them may be made while the mining lock is held.
pub trait PeerClient: Send + Sync {
    /// `GET /chain`
    fn fetch_chain(&self, node: &str) -> Result<Vec<Block>>;

    /// `PUT /consensus`: ask the peer to run conflict resolution.
    fn request_consensus(&self, node: &str) -> Result<()>;

    /// `DELETE /transactions`: ask the peer to empty its pool.
    fn request_clear_pool(&self, node: &str) -> Result<()>;

    /// `PUT /transactions`: hand an admitted transaction to the peer.
    fn forward_transaction(&self, node: &str, request: &TransactionRequest) -> Result<()>;

    /// Reachability check used by discovery.
    fn is_reachable(&self, addr: &SocketAddr) -> bool;
}

/// Blocking HTTP/JSON client over a shared `ureq` agent.
pub struct HttpPeerClient {
    agent: ureq::Agent,
    connect_timeout: Duration,
}

impl HttpPeerClient {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> HttpPeerClient {
        let agent = ureq::AgentBuilder::new().timeout(request_timeout).build();
        HttpPeerClient {
            agent,
            connect_timeout,
        }
    }

    fn endpoint(node: &str, path: &str) -> String {
        format!("http://{node}{path}")
    }
}

impl PeerClient for HttpPeerClient {
    fn fetch_chain(&self, node: &str) -> Result<Vec<Block>> {
        let response = self.agent.get(&Self::endpoint(node, "/chain")).call()?;
        let payload: ChainPayload = response.into_json().map_err(|e| {
            BlockchainError::Network(format!("Malformed chain from {node}: {e}"))
        })?;
        Ok(payload.chain)
    }

    fn request_consensus(&self, node: &str) -> Result<()> {
        self.agent
            .put(&Self::endpoint(node, "/consensus"))
            .call()?;
        Ok(())
    }

    fn request_clear_pool(&self, node: &str) -> Result<()> {
        self.agent
            .delete(&Self::endpoint(node, "/transactions"))
            .call()?;
        Ok(())
    }

    fn forward_transaction(&self, node: &str, request: &TransactionRequest) -> Result<()> {
        self.agent
            .put(&Self::endpoint(node, "/transactions"))
            .send_json(request)?;
        Ok(())
    }

    fn is_reachable(&self, addr: &SocketAddr) -> bool {
        TcpStream::connect_timeout(addr, self.connect_timeout).is_ok()
    }
}
