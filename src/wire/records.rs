use std::time::Instant;

use bytes::{BufMut, BytesMut};

use crate::state::{Extension, Interface, Neighbour, Node};
use crate::wire::tlv::{padded, TlvType, TlvWriter, WireError, TLV_HEADER_SIZE};


/// User agent carried in the version record, fixed width on the wire.
pub const USER_AGENT: &[u8; 8] = b"SHNCPD/0";

pub const DELEGATED_PREFERRED_LIFETIME: u32 = 3600;
pub const DELEGATED_VALID_LIFETIME: u32 = 1800;

const DHCPV6_OPTION_DNS_SERVERS: u16 = 23;
const DHCPV4_OPTION_DNS_SERVERS: u8 = 6;

/// Size of a node-state value without the data payload: id + seqno +
///  origination delay + data hash.
pub const NODE_STATE_SUMMARY_SIZE: usize = 4 + 4 + 4 + 8;


/// Serializes the value of a node-state record: the summary fields, followed
///  by the node's data verbatim when `full` is requested. The origination
///  delay is the age of the node's data in milliseconds, rounded up.
pub fn node_state_value(node: &Node, full: bool, now: Instant) -> BytesMut {
    let value_len = NODE_STATE_SUMMARY_SIZE + if full { node.data.len() } else { 0 };
    let mut buf = BytesMut::with_capacity(value_len);

    buf.put_slice(node.id.as_bytes());
    buf.put_u32(node.seqno);
    buf.put_u32(origination_delay_millis(node.orig_time, now));
    buf.put_slice(&node.datahash);
    if full {
        buf.put_slice(&node.data);
    }

    debug_assert_eq!(buf.len(), value_len);
    buf
}

fn origination_delay_millis(orig_time: Instant, now: Instant) -> u32 {
    let nanos = now.saturating_duration_since(orig_time).as_nanos();
    let millis = (nanos + 999_999) / 1_000_000;
    millis.min(u32::MAX as u128) as u32
}


/// A borrowed snapshot of everything that goes into the local node's own
///  announcement: the adjacencies it sees, the prefixes and addresses it
///  assigned, and what its external connections delegated to it.
///
/// `dhcpv4_priority` is the node-global DHCPv4 election priority; only its
///  low nibble reaches the wire.
pub struct LocalView<'a> {
    pub neighbours: &'a [Neighbour],
    pub interfaces: &'a [Interface],
    pub extensions: &'a [Extension],
    pub dhcpv4_priority: u8,
}

/// Serializes the local node's complete state bundle and returns the number
///  of bytes written. This is what goes out as the `data` payload of full
///  node-state announcements about the local node.
///
/// On a capacity error the writer is rewound to where it started - a bundle
///  is emitted whole or not at all.
pub fn local_state(view: &LocalView, w: &mut TlvWriter) -> Result<usize, WireError> {
    let start = w.mark();
    match local_state_records(view, w) {
        Ok(()) => Ok(w.len() - start),
        Err(e) => {
            w.rewind(start);
            Err(e)
        }
    }
}

fn local_state_records(view: &LocalView, w: &mut TlvWriter) -> Result<(), WireError> {
    for n in view.neighbours {
        w.header(TlvType::Neighbour, 12)?;
        w.put_slice(n.id.as_bytes())?;
        w.put_u32(n.eid)?;
        w.put_u32(n.ifindex)?;
        w.pad()?;
    }

    w.header(TlvType::Version, 12)?;
    w.put_u16(0)?;
    w.put_u8(0)?;
    w.put_u8(view.dhcpv4_priority & 0x0f)?;
    w.put_slice(USER_AGENT)?;
    w.pad()?;

    for interface in view.interfaces {
        for assigned in &interface.assigned {
            if assigned.published {
                debug_assert!(assigned.prefix.plen > 0);
                let pbytes = assigned.prefix.wire_len();
                w.header(TlvType::AssignedPrefix, 6 + pbytes)?;
                w.put_u32(interface.ifindex)?;
                w.put_u8(assigned.prio & 0x0f)?;
                w.put_u8(assigned.prefix.plen)?;
                w.put_slice(&assigned.prefix.raw()[..pbytes])?;
                w.pad()?;
            }
            if let Some(address) = assigned.address {
                w.header(TlvType::NodeAddress, 20)?;
                w.put_u32(interface.ifindex)?;
                w.put_slice(&address.octets())?;
                w.pad()?;
            }
        }
    }

    for extension in view.extensions {
        external_connection(extension, w)?;
    }

    Ok(())
}

/// One external-connection container. Its length covers every child record
///  including the padding between them, which is only known once all of them
///  are sized - so the children are accounted for in a dry pass before the
///  container header goes out, and the result is checked against the bytes
///  actually emitted.
fn external_connection(extension: &Extension, w: &mut TlvWriter) -> Result<(), WireError> {
    let (n_dns6, n_dns4) = dns_counts(extension);
    let dns6_len = if n_dns6 > 0 { TLV_HEADER_SIZE + 4 + 16 * n_dns6 } else { 0 };
    let dns4_len = if n_dns4 > 0 { TLV_HEADER_SIZE + 2 + 4 * n_dns4 } else { 0 };

    let mut body = 0;
    for p in extension.delegated.iter() {
        body += padded(TLV_HEADER_SIZE + 9 + p.wire_len());
    }
    body += padded(dns6_len) + padded(dns4_len);

    w.header(TlvType::ExternalConnection, body)?;
    let body_start = w.len();

    for p in extension.delegated.iter() {
        w.header(TlvType::DelegatedPrefix, 9 + p.wire_len())?;
        w.put_u32(DELEGATED_PREFERRED_LIFETIME)?;
        w.put_u32(DELEGATED_VALID_LIFETIME)?;
        w.put_u8(p.plen)?;
        w.put_slice(&p.raw()[..p.wire_len()])?;
        w.pad()?;
    }

    if n_dns6 > 0 {
        w.header(TlvType::Dhcpv6Data, 4 + 16 * n_dns6)?;
        w.put_u16(DHCPV6_OPTION_DNS_SERVERS)?;
        w.put_u16((16 * n_dns6) as u16)?;
        for p in extension.dns.iter().filter(|p| !p.is_v4()) {
            w.put_slice(&p.raw())?;
        }
        w.pad()?;
    }

    if n_dns4 > 0 {
        w.header(TlvType::Dhcpv4Data, 2 + 4 * n_dns4)?;
        w.put_u8(DHCPV4_OPTION_DNS_SERVERS)?;
        w.put_u8((4 * n_dns4) as u8)?;
        for p in extension.dns.iter().filter(|p| p.is_v4()) {
            // the v4 part of the mapped form
            w.put_slice(&p.raw()[12..])?;
        }
        w.pad()?;
    }

    debug_assert_eq!(w.len() - body_start, body);
    Ok(())
}

fn dns_counts(extension: &Extension) -> (usize, usize) {
    let n_dns4 = extension.dns.iter().filter(|p| p.is_v4()).count();
    (extension.dns.len() - n_dns4, n_dns4)
}
