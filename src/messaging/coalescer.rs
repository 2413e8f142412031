use std::sync::Arc;

use bytes::BytesMut;
use tracing::{debug, error, trace};

use crate::messaging::destination::Destination;
use crate::messaging::send_config::SendConfig;
use crate::messaging::transport::Transport;
use crate::state::NodeId;
use crate::wire::tlv::{padded, TlvType, TlvWriter, WireError, TLV_HEADER_SIZE};


/// Size of the node-endpoint envelope that opens every datagram.
const ENVELOPE_SIZE: usize = TLV_HEADER_SIZE + 8;

enum PendingState {
    Empty,
    Accumulating { destination: Destination },
}

/// Batches outbound records into one datagram per destination.
///
/// At most one datagram is ever pending. Its destination is fixed by the
///  first record appended after a flush; every later append either matches
///  it or flushes the old datagram before starting a new one. Records appear
///  on the wire in append order, right behind the envelope.
pub struct Coalescer {
    local_id: NodeId,
    config: SendConfig,
    transport: Arc<dyn Transport>,
    buf: BytesMut,
    state: PendingState,
}

impl Coalescer {
    pub fn new(local_id: NodeId, config: SendConfig, transport: Arc<dyn Transport>) -> Coalescer {
        let buf = BytesMut::with_capacity(config.buffer_capacity);
        Coalescer {
            local_id,
            config,
            transport,
            buf,
            state: PendingState::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.state, PendingState::Empty)
    }

    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Appends one record to the pending datagram, implicitly flushing first
    ///  when the destination differs from the pending one or the soft
    ///  datagram limit would be crossed.
    ///
    /// Fails without touching the buffer when the record cannot fit the hard
    ///  capacity; the caller must split the record in that case.
    pub async fn append(
        &mut self,
        tlv_type: TlvType,
        value: &[u8],
        destination: &Destination,
    ) -> Result<(), WireError> {
        if let PendingState::Accumulating { destination: pending } = &self.state {
            if pending != destination
                || self.buf.len() + value.len() > self.config.datagram_soft_limit
            {
                self.flush().await;
            }
        }

        let envelope = if self.is_empty() { ENVELOPE_SIZE } else { 0 };
        let needed = envelope + TLV_HEADER_SIZE + padded(value.len());
        if self.buf.len() + needed > self.config.buffer_capacity {
            return Err(WireError::Capacity {
                needed,
                available: self.config.buffer_capacity - self.buf.len(),
            });
        }

        let starting = matches!(self.state, PendingState::Empty);
        let mut w = TlvWriter::new(&mut self.buf, self.config.buffer_capacity);
        if starting {
            w.header(TlvType::NodeEndpoint, 8)?;
            w.put_slice(self.local_id.as_bytes())?;
            w.put_u32(destination.endpoint_scope())?;
            self.state = PendingState::Accumulating {
                destination: destination.clone(),
            };
        }

        w.header(tlv_type, value.len())?;
        w.put_slice(value)?;
        w.pad()?;

        trace!(
            "buffering {} {:?} ({})",
            if destination.is_multicast() { "multicast" } else { "unicast" },
            tlv_type,
            value.len()
        );
        Ok(())
    }

    /// Hands the pending datagram to the transport and resets to empty. The
    ///  buffer is discarded whether or not the transmit succeeded - retry
    ///  policy lives with the announcement scheduler, not here.
    pub async fn try_flush(&mut self) -> anyhow::Result<usize> {
        let destination = match &self.state {
            PendingState::Empty => return Ok(0),
            PendingState::Accumulating { destination } => destination.clone(),
        };
        let to = destination.socket_addr(&self.config);

        debug!("flushing {} bytes to {:?}", self.buf.len(), to);
        let result = self.transport.send(to, &self.buf).await;

        self.reset();
        result
    }

    /// Like [try_flush](Coalescer::try_flush), but transmit errors are logged
    ///  instead of propagated - event loop callers just move on to the next
    ///  tick.
    pub async fn flush(&mut self) {
        if let Err(e) = self.try_flush().await {
            error!("error sending datagram: {:#}", e);
        }
    }

    fn reset(&mut self) {
        // in debug builds, overwrite the stale datagram so a read after a
        // flush shows up as garbage instead of the previous packet
        #[cfg(debug_assertions)]
        self.buf.fill(0xaa);

        self.buf.clear();
        self.state = PendingState::Empty;
    }
}
