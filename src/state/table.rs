use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};

use crate::state::{Node, NodeId};


/// Provider of the network-wide state digest that peers compare to detect
///  divergence. Returns `None` until a first digest can be computed, i.e.
///  before any node state is known.
pub trait NetworkHasher: Send + Sync {
    fn network_hash(&self) -> Option<[u8; 8]>;
}


/// Digest of a node's raw data. Kept alongside the data and re-derived on
///  every mutation, never on the announcement path.
pub fn node_data_hash(data: &[u8]) -> [u8; 8] {
    truncated(Sha256::digest(data).as_slice())
}

fn truncated(digest: &[u8]) -> [u8; 8] {
    let mut hash = [0u8; 8];
    hash.copy_from_slice(&digest[..8]);
    hash
}


/// All node states this daemon currently knows, keyed by node id. This is the
///  read side the announcement path iterates; mutation happens between event
///  loop turns, never during a serialization pass.
pub struct NodeTable {
    nodes: FxHashMap<NodeId, Node>,
}

impl NodeTable {
    pub fn new() -> NodeTable {
        NodeTable {
            nodes: FxHashMap::default(),
        }
    }

    /// Inserts or replaces a node's state, refreshing its data hash.
    pub fn update(&mut self, mut node: Node) {
        node.datahash = node_data_hash(&node.data);
        self.nodes.insert(node.id, node);
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NetworkHasher for NodeTable {
    /// Hash over (id, seqno, data hash) of every known node in ascending id
    ///  order, so two daemons with the same view agree on the digest without
    ///  exchanging full state.
    fn network_hash(&self) -> Option<[u8; 8]> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut ids: Vec<&NodeId> = self.nodes.keys().collect();
        ids.sort();

        let mut sha256 = Sha256::default();
        for id in ids {
            let node = &self.nodes[id];
            sha256.update(node.id.as_bytes());
            sha256.update(node.seqno.to_be_bytes());
            sha256.update(node.datahash);
        }
        Some(truncated(sha256.finalize().as_slice()))
    }
}


#[cfg(test)]
mod test {
    use std::time::Instant;

    use bytes::Bytes;

    use super::*;

    fn node(id: &[u8; 4], seqno: u32, data: &'static [u8]) -> Node {
        Node::new(NodeId(*id), seqno, Instant::now(), Bytes::from_static(data))
    }

    #[test]
    fn test_empty_table_has_no_hash() {
        assert_eq!(NodeTable::new().network_hash(), None);
    }

    #[test]
    fn test_update_refreshes_datahash() {
        let mut table = NodeTable::new();
        let mut n = node(b"aaaa", 1, b"old");
        n.data = Bytes::from_static(b"new");
        table.update(n);

        assert_eq!(table.get(&NodeId(*b"aaaa")).unwrap().datahash, node_data_hash(b"new"));
    }

    #[test]
    fn test_network_hash_is_insertion_order_independent() {
        let mut first = NodeTable::new();
        first.update(node(b"aaaa", 1, b"a-data"));
        first.update(node(b"bbbb", 2, b"b-data"));

        let mut second = NodeTable::new();
        second.update(node(b"bbbb", 2, b"b-data"));
        second.update(node(b"aaaa", 1, b"a-data"));

        assert_eq!(first.network_hash(), second.network_hash());
        assert!(first.network_hash().is_some());
    }

    #[test]
    fn test_network_hash_tracks_seqno() {
        let mut table = NodeTable::new();
        table.update(node(b"aaaa", 1, b"a-data"));
        let before = table.network_hash();

        table.update(node(b"aaaa", 2, b"a-data"));
        assert_ne!(before, table.network_hash());
    }
}
