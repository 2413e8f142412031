use std::fmt::{Debug, Formatter};
use std::net::Ipv6Addr;


/// An address-family-agnostic routing prefix: sixteen bytes of address plus a
///  bit length. IPv4 prefixes are stored v4-mapped (`::ffff:a.b.c.d`), with
///  `plen` counting from the front of the mapped form - an IPv4 /24 has
///  `plen == 120`.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Prefix {
    pub addr: Ipv6Addr,
    pub plen: u8,
}

impl Prefix {
    pub fn new(addr: Ipv6Addr, plen: u8) -> Prefix {
        Prefix { addr, plen }
    }

    /// Number of address bytes carried on the wire for this prefix.
    pub fn wire_len(&self) -> usize {
        (self.plen as usize + 7) / 8
    }

    pub fn raw(&self) -> [u8; 16] {
        self.addr.octets()
    }

    pub fn is_v4(&self) -> bool {
        self.addr.to_ipv4_mapped().is_some()
    }
}

impl Debug for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.plen)
    }
}


#[cfg(test)]
mod test {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::zero(0, 0)]
    #[case::one_bit(1, 1)]
    #[case::full_byte(8, 1)]
    #[case::byte_and_a_bit(9, 2)]
    #[case::typical_v6(64, 8)]
    #[case::host(128, 16)]
    fn test_wire_len(#[case] plen: u8, #[case] expected: usize) {
        let prefix = Prefix::new(Ipv6Addr::UNSPECIFIED, plen);
        assert_eq!(prefix.wire_len(), expected);
    }

    #[rstest]
    #[case::plain_v6("2001:db8::", false)]
    #[case::link_local("fe80::1", false)]
    #[case::mapped_v4("::ffff:10.0.0.1", true)]
    fn test_is_v4(#[case] addr: &str, #[case] expected: bool) {
        let prefix = Prefix::new(Ipv6Addr::from_str(addr).unwrap(), 128);
        assert_eq!(prefix.is_v4(), expected);
    }

    #[test]
    fn test_debug() {
        let prefix = Prefix::new(Ipv6Addr::from_str("2001:db8::").unwrap(), 56);
        assert_eq!(&format!("{:?}", prefix), "2001:db8::/56");
    }
}
