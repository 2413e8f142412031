mod prefix;
mod table;

pub use prefix::Prefix;
pub use table::{node_data_hash, NetworkHasher, NodeTable};

use std::fmt::{Debug, Formatter};
use std::net::Ipv6Addr;
use std::time::Instant;

use bytes::Bytes;


/// A node's identity on the wire, four opaque bytes. Ids are compared and
///  ordered bytewise; the daemon never interprets their contents.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(pub [u8; 4]);

impl NodeId {
    pub const LEN: usize = 4;

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}


/// One participant's announced state as this daemon last learned it.
///
/// `seqno` increases monotonically with every re-origination, and `orig_time`
///  is the local instant the current `data` was originated (learned). The
///  announcement path transmits the age derived from it rather than the
///  instant itself, so peers do not need synchronized clocks.
///
/// `datahash` summarizes `data` and is maintained by the store whenever
///  `data` changes - the announcement path only ever transmits it.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub seqno: u32,
    pub orig_time: Instant,
    pub datahash: [u8; 8],
    pub data: Bytes,
}

impl Node {
    pub fn new(id: NodeId, seqno: u32, orig_time: Instant, data: Bytes) -> Node {
        let datahash = node_data_hash(&data);
        Node {
            id,
            seqno,
            orig_time,
            datahash,
            data,
        }
    }
}


/// A directly reachable peer: its node id, the endpoint id it announced for
///  the link, and the local interface the adjacency lives on.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Neighbour {
    pub id: NodeId,
    pub eid: u32,
    pub ifindex: u32,
}


/// A prefix assigned on a local interface. Only published assignments are
///  announced; the address is announced independently of publication.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AssignedPrefix {
    pub prefix: Prefix,
    pub prio: u8,
    pub published: bool,
    pub address: Option<Ipv6Addr>,
}


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Interface {
    pub ifindex: u32,
    pub assigned: Vec<AssignedPrefix>,
}


/// An external connection's worth of delegations: prefixes this node may
///  sub-delegate, and the DNS servers it learned upstream (as /128 resp.
///  v4-mapped /128 prefixes).
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Extension {
    pub delegated: Vec<Prefix>,
    pub dns: Vec<Prefix>,
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_node_id_debug() {
        let formatted = format!("{:?}", NodeId([0x01, 0x02, 0xab, 0xff]));
        assert_eq!(&formatted, "0102abff");
    }

    #[test]
    fn test_node_new_hashes_data() {
        let node = Node::new(NodeId(*b"abcd"), 1, Instant::now(), Bytes::from_static(b"hello"));
        assert_eq!(node.datahash, node_data_hash(b"hello"));
    }
}
