use crate::config::ChainConfig;
use crate::network::PeerClient;
use log::debug;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Scans a fixed neighbourhood of `host:port` candidates for live peers.
///
/// Candidates are `prefix.(last_octet + offset):port` for every offset in the
/// IP range and every port in the port range, excluding this node's own
/// address. Offsets that would overflow the last octet are skipped.
#[derive(Debug, Clone)]
pub struct PeerScanner {
    host: Ipv4Addr,
    own_port: u16,
    ip_range: (u8, u8),
    port_range: (u16, u16),
}

impl PeerScanner {
    pub fn new(
        host: Ipv4Addr,
        own_port: u16,
        ip_range: (u8, u8),
        port_range: (u16, u16),
    ) -> PeerScanner {
        PeerScanner {
            host,
            own_port,
            ip_range,
            port_range,
        }
    }

    pub fn from_config(config: &ChainConfig) -> PeerScanner {
        PeerScanner::new(
            config.discovery_host,
            config.port,
            (config.ip_range_start, config.ip_range_end),
            (config.port_range_start, config.port_range_end),
        )
    }

    pub fn candidates(&self) -> Vec<SocketAddr> {
        let [a, b, c, last] = self.host.octets();
        let own = SocketAddrV4::new(self.host, self.own_port);

        let mut candidates = Vec::new();
        for port in self.port_range.0..=self.port_range.1 {
            for offset in self.ip_range.0..=self.ip_range.1 {
                let Some(octet) = last.checked_add(offset) else {
                    continue;
                };
                let guess = SocketAddrV4::new(Ipv4Addr::new(a, b, c, octet), port);
                if guess != own {
                    candidates.push(SocketAddr::V4(guess));
                }
            }
        }
        candidates
    }

    /// Checks every candidate and returns the reachable ones as `host:port`.
    pub fn scan(&self, client: &dyn PeerClient) -> Vec<String> {
        self.candidates()
            .into_iter()
            .filter(|addr| {
                let reachable = client.is_reachable(addr);
                debug!("Scan {addr}: reachable={reachable}");
                reachable
            })
            .map(|addr| addr.to_string())
            .collect()
    }
}
