//! Peer-to-peer plumbing
//!
//! Peers talk HTTP/JSON. `server` is the inbound API; `peer_client` makes the
//! outbound calls; `discovery` finds live peers in a fixed host/port range.

pub mod discovery;
pub mod node;
pub mod peer_client;
pub mod server;

pub use discovery::PeerScanner;
pub use node::{Node, Nodes};
pub use peer_client::{ChainPayload, HttpPeerClient, PeerClient};
pub use server::{init_routes, run_server};
