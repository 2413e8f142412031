use std::net::{SocketAddr, SocketAddrV6};

use crate::messaging::send_config::SendConfig;


/// Where a pending datagram is headed: announced to all peers on one local
///  interface, or exchanged with a single peer directly. A datagram never
///  mixes the two - receivers resolve scope per datagram, not per record, so
///  the exclusivity is baked into the type rather than checked at runtime.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Destination {
    /// multicast to the protocol group, scoped to this interface
    Interface(u32),
    /// unicast to one peer
    Unicast(SocketAddrV6),
}

impl Destination {
    /// The scope carried in the node-endpoint envelope: the interface index
    ///  for multicast, the peer address's scope id for unicast.
    pub fn endpoint_scope(&self) -> u32 {
        match self {
            Destination::Interface(ifindex) => *ifindex,
            Destination::Unicast(addr) => addr.scope_id(),
        }
    }

    pub fn is_multicast(&self) -> bool {
        matches!(self, Destination::Interface(_))
    }

    /// Resolves to the concrete address a datagram is sent to.
    pub fn socket_addr(&self, config: &SendConfig) -> SocketAddr {
        match self {
            Destination::Interface(ifindex) => {
                SocketAddrV6::new(config.group, config.port, 0, *ifindex).into()
            }
            Destination::Unicast(addr) => (*addr).into(),
        }
    }
}
