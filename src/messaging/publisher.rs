use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::messaging::coalescer::Coalescer;
use crate::messaging::destination::Destination;
use crate::state::{NetworkHasher, Node};
use crate::wire::records;
use crate::wire::tlv::{TlvType, WireError};


/// Outbound announcement glue: turns state into records and feeds the
///  coalescer. It decides nothing about *when* to announce - that is the
///  announcement scheduler's business.
pub struct Publisher {
    coalescer: Coalescer,
    hasher: Arc<dyn NetworkHasher>,
}

impl Publisher {
    pub fn new(coalescer: Coalescer, hasher: Arc<dyn NetworkHasher>) -> Publisher {
        Publisher { coalescer, hasher }
    }

    /// Announces the network-wide digest. Fails without touching the pending
    ///  buffer while no digest is available; the caller typically skips the
    ///  tick in that case.
    pub async fn announce_network_state(&mut self, destination: &Destination) -> Result<(), WireError> {
        let hash = self.hasher.network_hash().ok_or(WireError::DigestUnavailable)?;

        debug!(
            "-> NETWORK-STATE {:016x}{}",
            u64::from_be_bytes(hash),
            if destination.is_multicast() { " (multicast)" } else { "" },
        );
        self.coalescer.append(TlvType::NetworkState, &hash, destination).await
    }

    /// Announces one node's state, as a summary or, for a full-state
    ///  exchange, with the node's data included.
    pub async fn announce_node_state(
        &mut self,
        node: &Node,
        full: bool,
        now: Instant,
        destination: &Destination,
    ) -> Result<(), WireError> {
        let value = records::node_state_value(node, full, now);

        debug!(
            "-> NODE-STATE {:?}{}",
            node.id,
            match (full, destination.is_multicast()) {
                (true, true) => " (full, multicast)",
                (true, false) => " (full)",
                (false, true) => " (multicast)",
                (false, false) => "",
            },
        );
        self.coalescer.append(TlvType::NodeState, &value, destination).await
    }

    pub async fn try_flush(&mut self) -> anyhow::Result<usize> {
        self.coalescer.try_flush().await
    }

    pub async fn flush(&mut self) {
        self.coalescer.flush().await
    }

    pub fn is_empty(&self) -> bool {
        self.coalescer.is_empty()
    }
}


#[cfg(test)]
mod test {
    use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};
    use std::str::FromStr;
    use std::time::Duration;

    use bytes::Bytes;

    use crate::messaging::send_config::SendConfig;
    use crate::state::{NodeId, NodeTable};
    use crate::test_util::reader::split_tlvs;
    use crate::test_util::transport::RecordingTransport;

    use super::*;

    struct NoDigest;
    impl NetworkHasher for NoDigest {
        fn network_hash(&self) -> Option<[u8; 8]> {
            None
        }
    }

    struct FixedDigest([u8; 8]);
    impl NetworkHasher for FixedDigest {
        fn network_hash(&self) -> Option<[u8; 8]> {
            Some(self.0)
        }
    }

    fn publisher(transport: Arc<RecordingTransport>, hasher: Arc<dyn NetworkHasher>) -> Publisher {
        let coalescer = Coalescer::new(NodeId([1, 2, 3, 4]), SendConfig::new(), transport);
        Publisher::new(coalescer, hasher)
    }

    #[tokio::test]
    async fn test_network_state_announcement() {
        let transport = RecordingTransport::new();
        let mut publisher = publisher(
            transport.clone(),
            Arc::new(FixedDigest([1, 2, 3, 4, 5, 6, 7, 8])),
        );

        publisher.announce_network_state(&Destination::Interface(7)).await.unwrap();
        publisher.try_flush().await.unwrap();

        let sent = transport.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SocketAddr::from_str("[ff02::8808%7]:8808").unwrap());

        let records = split_tlvs(&sent[0].1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tlv_type, 4);
        assert_eq!(&records[1].value, &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn test_unavailable_digest_leaves_the_buffer_untouched() {
        let transport = RecordingTransport::new();
        let mut publisher = publisher(transport.clone(), Arc::new(NoDigest));

        let result = publisher.announce_network_state(&Destination::Interface(7)).await;

        assert_eq!(result, Err(WireError::DigestUnavailable));
        assert!(publisher.is_empty());
        assert!(transport.take_sent().is_empty());
    }

    #[tokio::test]
    async fn test_node_table_backs_the_digest() {
        let mut table = NodeTable::new();
        table.update(Node::new(
            NodeId(*b"aaaa"), 1, Instant::now(), Bytes::from_static(b"data"),
        ));
        let expected = table.network_hash().unwrap();

        let transport = RecordingTransport::new();
        let mut publisher = publisher(transport.clone(), Arc::new(table));

        publisher.announce_network_state(&Destination::Interface(1)).await.unwrap();
        publisher.flush().await;

        let sent = transport.take_sent();
        let records = split_tlvs(&sent[0].1);
        assert_eq!(&records[1].value, &expected);
    }

    #[tokio::test]
    async fn test_single_unicast_full_state_reply() {
        let now = Instant::now();
        let node = Node {
            id: NodeId([1, 2, 3, 4]),
            seqno: 7,
            orig_time: now - Duration::from_millis(500),
            datahash: [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x11],
            data: Bytes::from_static(&[0x42; 20]),
        };
        let peer = Destination::Unicast(SocketAddrV6::new(
            Ipv6Addr::from_str("fe80::1").unwrap(), 8808, 0, 0,
        ));

        let transport = RecordingTransport::new();
        let mut publisher = publisher(transport.clone(), Arc::new(NoDigest));

        publisher.announce_node_state(&node, true, now, &peer).await.unwrap();
        publisher.try_flush().await.unwrap();

        let sent = transport.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].0,
            SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::from_str("fe80::1").unwrap(), 8808, 0, 0))
        );

        // envelope + one node-state record, byte for byte, nothing trailing
        let mut expected = Vec::new();
        expected.extend_from_slice(b"\0\x03\0\x08\x01\x02\x03\x04\0\0\0\0");
        expected.extend_from_slice(b"\0\x05\0\x28");
        expected.extend_from_slice(&[1, 2, 3, 4]);
        expected.extend_from_slice(&7u32.to_be_bytes());
        expected.extend_from_slice(&500u32.to_be_bytes());
        expected.extend_from_slice(&node.datahash);
        expected.extend_from_slice(&[0x42; 20]);
        assert_eq!(&sent[0].1, &expected);
    }

    #[tokio::test]
    async fn test_summary_and_digest_share_one_datagram() {
        let now = Instant::now();
        let node = Node::new(NodeId(*b"node"), 3, now, Bytes::from_static(b"abcd"));

        let transport = RecordingTransport::new();
        let mut publisher = publisher(
            transport.clone(),
            Arc::new(FixedDigest([8, 7, 6, 5, 4, 3, 2, 1])),
        );

        publisher.announce_network_state(&Destination::Interface(2)).await.unwrap();
        publisher.announce_node_state(&node, false, now, &Destination::Interface(2)).await.unwrap();
        publisher.try_flush().await.unwrap();

        let sent = transport.take_sent();
        assert_eq!(sent.len(), 1);

        let types: Vec<u16> = split_tlvs(&sent[0].1).iter().map(|t| t.tlv_type).collect();
        assert_eq!(types, vec![3, 4, 5]);
    }
}
