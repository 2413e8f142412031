use std::fmt::{Display, Formatter};

use bytes::{BufMut, BytesMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};


/// The record types this daemon emits. The numeric values are the wire
///  contract - peers dispatch on them, so they can never be renumbered.
#[derive(Debug, Clone, Copy, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum TlvType {
    /// datagram envelope: sender id plus the endpoint scope it sent through
    NodeEndpoint = 3,
    /// network-wide state digest for divergence detection
    NetworkState = 4,
    /// one node's summary (or full) state announcement
    NodeState = 5,
    /// one adjacency of the local node
    Neighbour = 8,
    /// user agent and DHCPv4 election priority
    Version = 32,
    /// container for everything learned over one external connection
    ExternalConnection = 33,
    DelegatedPrefix = 34,
    AssignedPrefix = 35,
    NodeAddress = 36,
    /// DHCPv6 options blob, here always option 23 (DNS servers)
    Dhcpv6Data = 37,
    /// DHCPv4 options blob, here always option 6 (DNS servers)
    Dhcpv4Data = 38,
}

pub const TLV_HEADER_SIZE: usize = 2 * size_of::<u16>();

/// Number of zero bytes bringing `len` to the next 4-byte boundary.
pub fn padding_for(len: usize) -> usize {
    len.wrapping_neg() & 3
}

pub fn padded(len: usize) -> usize {
    len + padding_for(len)
}


#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WireError {
    /// A record does not fit the buffer's remaining hard capacity. The buffer
    ///  is left exactly as it was - the caller may flush and retry, or must
    ///  split the record.
    Capacity { needed: usize, available: usize },
    /// No network-wide digest has been computed yet; nothing was emitted.
    DigestUnavailable,
}

impl Display for WireError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::Capacity { needed, available } => {
                write!(f, "record needs {} bytes, buffer has {}", needed, available)
            }
            WireError::DigestUnavailable => {
                write!(f, "no network state digest available yet")
            }
        }
    }
}

impl std::error::Error for WireError {}


/// Bounds-checked cursor over a reusable buffer. All multi-byte writes are
///  big-endian, and `pad` brings the stream back to a 4-byte boundary with
///  zero bytes. A write that would cross `limit` fails without advancing.
///
/// `header` reserves space for the whole record including its trailing
///  padding, so a record builder that got its header out can never be cut
///  off halfway through the value.
pub struct TlvWriter<'a> {
    buf: &'a mut BytesMut,
    limit: usize,
}

impl<'a> TlvWriter<'a> {
    pub fn new(buf: &'a mut BytesMut, limit: usize) -> TlvWriter<'a> {
        TlvWriter { buf, limit }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.buf.len())
    }

    /// Current position, for rewinding a partially built run of records.
    pub fn mark(&self) -> usize {
        self.buf.len()
    }

    pub fn rewind(&mut self, mark: usize) {
        debug_assert!(mark <= self.buf.len());
        self.buf.truncate(mark);
    }

    fn ensure(&self, n: usize) -> Result<(), WireError> {
        if self.remaining() < n {
            return Err(WireError::Capacity {
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn header(&mut self, tlv_type: TlvType, value_len: usize) -> Result<(), WireError> {
        debug_assert!(value_len <= u16::MAX as usize);
        self.ensure(TLV_HEADER_SIZE + padded(value_len))?;
        self.buf.put_u16(tlv_type.into());
        self.buf.put_u16(value_len as u16);
        Ok(())
    }

    pub fn put_u8(&mut self, v: u8) -> Result<(), WireError> {
        self.ensure(1)?;
        self.buf.put_u8(v);
        Ok(())
    }

    pub fn put_u16(&mut self, v: u16) -> Result<(), WireError> {
        self.ensure(2)?;
        self.buf.put_u16(v);
        Ok(())
    }

    pub fn put_u32(&mut self, v: u32) -> Result<(), WireError> {
        self.ensure(4)?;
        self.buf.put_u32(v);
        Ok(())
    }

    pub fn put_slice(&mut self, v: &[u8]) -> Result<(), WireError> {
        self.ensure(v.len())?;
        self.buf.put_slice(v);
        Ok(())
    }

    pub fn pad(&mut self) -> Result<(), WireError> {
        self.ensure(padding_for(self.buf.len()))?;
        while self.buf.len() & 3 != 0 {
            self.buf.put_u8(0);
        }
        Ok(())
    }
}
