use std::sync::{PoisonError, RwLock};

/// A known peer, addressed as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    addr: String,
}

impl Node {
    fn new(addr: String) -> Node {
        Node { addr }
    }

    pub fn get_addr(&self) -> String {
        self.addr.clone()
    }
}

/// The current peer set. Discovery replaces it wholesale on every sync.
pub struct Nodes {
    inner: RwLock<Vec<Node>>,
}

impl Default for Nodes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nodes {
    pub fn new() -> Nodes {
        Nodes {
            inner: RwLock::new(vec![]),
        }
    }

    pub fn add_node(&self, addr: String) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !inner.iter().any(|x| x.get_addr().eq(addr.as_str())) {
            inner.push(Node::new(addr));
        }
    }

    /// Swaps in a freshly discovered peer set and returns the addresses that
    /// were known before but are absent now.
    pub fn replace_all(&self, addrs: Vec<String>) -> Vec<String> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = inner
            .iter()
            .map(Node::get_addr)
            .filter(|known| !addrs.contains(known))
            .collect();

        let mut fresh: Vec<Node> = Vec::with_capacity(addrs.len());
        for addr in addrs {
            if !fresh.iter().any(|x| x.addr == addr) {
                fresh.push(Node::new(addr));
            }
        }
        *inner = fresh;
        dropped
    }

    pub fn get_nodes(&self) -> Vec<Node> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    pub fn get_addrs(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Node::get_addr)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn node_is_known(&self, addr: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.iter().any(|x| x.get_addr().eq(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_node_deduplicates() {
        let nodes = Nodes::new();
        nodes.add_node("127.0.0.1:5001".to_string());
        nodes.add_node("127.0.0.1:5001".to_string());
        assert_eq!(nodes.len(), 1);
        assert!(nodes.node_is_known("127.0.0.1:5001"));
    }

    #[test]
    fn test_replace_all_reports_dropped_peers() {
        let nodes = Nodes::new();
        nodes.add_node("127.0.0.1:5001".to_string());
        nodes.add_node("127.0.0.1:5002".to_string());

        let dropped = nodes.replace_all(vec![
            "127.0.0.1:5002".to_string(),
            "127.0.0.1:5003".to_string(),
            "127.0.0.1:5003".to_string(),
        ]);

        assert_eq!(dropped, vec!["127.0.0.1:5001".to_string()]);
        assert_eq!(
            nodes.get_addrs(),
            vec!["127.0.0.1:5002".to_string(), "127.0.0.1:5003".to_string()]
        );
    }

    #[test]
    fn test_replace_all_with_nothing_empties_the_set() {
        let nodes = Nodes::new();
        nodes.add_node("127.0.0.1:5001".to_string());
        nodes.replace_all(Vec::new());
        assert!(nodes.is_empty());
        assert!(nodes.get_nodes().is_empty());
    }
}
