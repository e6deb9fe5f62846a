//! IPv4/IPv6 prefixes and ranges, and the RFC 3779 §2.1.2 bit-string
//! trimming rules shared by both.
//!
//! Grounded on `examples/original_source/rpkimancer/resources.py` for the
//! address-family/"inherit" model, and the prototest `cacert.rs` example
//! for the exact BIT STRING shape (`unused-bits octet` + address bytes).

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// The 2-byte big-endian Address Family Identifier (RFC 3779 §2.1.1).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Afi {
    V4,
    V6,
}

impl Afi {
    pub fn code(self) -> [u8; 2] {
        match self {
            Afi::V4 => [0x00, 0x01],
            Afi::V6 => [0x00, 0x02],
        }
    }

    pub fn addr_bits(self) -> usize {
        match self {
            Afi::V4 => 32,
            Afi::V6 => 128,
        }
    }
}

impl fmt::Display for Afi {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Afi::V4 => write!(f, "IPv4"),
            Afi::V6 => write!(f, "IPv6"),
        }
    }
}

/// An address of either family, stored as its big-endian octets.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum IpAddr {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl IpAddr {
    pub fn afi(&self) -> Afi {
        match self {
            IpAddr::V4(_) => Afi::V4,
            IpAddr::V6(_) => Afi::V6,
        }
    }

    pub fn octets(&self) -> &[u8] {
        match self {
            IpAddr::V4(b) => b,
            IpAddr::V6(b) => b,
        }
    }
}

impl From<Ipv4Addr> for IpAddr {
    fn from(a: Ipv4Addr) -> Self {
        IpAddr::V4(a.octets())
    }
}

impl From<Ipv6Addr> for IpAddr {
    fn from(a: Ipv6Addr) -> Self {
        IpAddr::V6(a.octets())
    }
}

/// `address/prefixlen`, e.g. `10.0.0.0/8`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IpPrefix {
    pub address: IpAddr,
    pub prefixlen: u8,
}

impl IpPrefix {
    pub fn new(address: IpAddr, prefixlen: u8) -> Self {
        IpPrefix { address, prefixlen }
    }

    pub fn afi(&self) -> Afi {
        self.address.afi()
    }

    /// Encodes as an RFC 3779 `IPAddress`: truncate to `prefixlen` bits
    /// and mask the unused tail bits of the last octet to zero.
    pub fn to_bit_string(&self) -> (u8, Vec<u8>) {
        truncate_to_bits(self.address.octets(), self.prefixlen as usize)
    }
}

/// `low..=high`, both addresses of the same family, `low <= high`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IpRange {
    pub low: IpAddr,
    pub high: IpAddr,
}

impl IpRange {
    pub fn new(low: IpAddr, high: IpAddr) -> Self {
        IpRange { low, high }
    }

    pub fn afi(&self) -> Afi {
        self.low.afi()
    }

    /// Encodes the low bound with its trailing run of zero bits
    /// stripped, and the high bound with its trailing run of one bits
    /// stripped, per RFC 3779 §2.1.2.
    pub fn to_bit_strings(&self) -> ((u8, Vec<u8>), (u8, Vec<u8>)) {
        (
            trim_trailing_run(self.low.octets(), 0),
            trim_trailing_run(self.high.octets(), 1),
        )
    }
}

fn bit_at(bytes: &[u8], i: usize) -> u8 {
    (bytes[i / 8] >> (7 - i % 8)) & 1
}

/// Keeps exactly `bits` significant bits of `bytes` and masks the
/// remaining low bits of the last octet used to zero, returning
/// (unused-bit-count, truncated-octets).
fn truncate_to_bits(bytes: &[u8], bits: usize) -> (u8, Vec<u8>) {
    let needed = (bits + 7) / 8;
    let unused = (needed * 8 - bits) as u8;
    let mut out = bytes[..needed].to_vec();
    if unused > 0 {
        if let Some(last) = out.last_mut() {
            *last &= !0u8 << unused;
        }
    }
    (unused, out)
}

/// Strips the trailing run of `run_bit` bits from `bytes`, returning the
/// DER `BIT STRING` representation of what remains.
fn trim_trailing_run(bytes: &[u8], run_bit: u8) -> (u8, Vec<u8>) {
    let total_bits = bytes.len() * 8;
    let mut significant = total_bits;
    while significant > 0 && bit_at(bytes, significant - 1) == run_bit {
        significant -= 1;
    }
    truncate_to_bits(bytes, significant)
}

/// Parses the CLI/config-file form `address/prefixlen`, e.g. `10.0.0.0/8`
/// or `2001:db8::/32`, grounded on the `RoaPrefix` `FromStr` impl in
/// `examples/other_examples/..._NLnetLabs-mkrpki__src-main.rs.rs`.
impl FromStr for IpPrefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| format!("invalid prefix '{}': expected address/prefixlen", s))?;
        let prefixlen: u8 = len
            .parse()
            .map_err(|_| format!("invalid prefix length '{}' in '{}'", len, s))?;
        let address = parse_ip_addr(addr, s)?;
        if prefixlen as usize > address.afi().addr_bits() {
            return Err(format!("prefix length {} out of range for '{}'", prefixlen, s));
        }
        Ok(IpPrefix::new(address, prefixlen))
    }
}

/// Parses the CLI/config-file form `low-high`, e.g.
/// `192.168.1.128-192.168.2.255`.
impl FromStr for IpRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid range '{}': expected low-high", s))?;
        let low = parse_ip_addr(low, s)?;
        let high = parse_ip_addr(high, s)?;
        if low.afi() != high.afi() {
            return Err(format!("range '{}' mixes address families", s));
        }
        Ok(IpRange::new(low, high))
    }
}

fn parse_ip_addr(s: &str, whole: &str) -> Result<IpAddr, String> {
    if let Ok(v4) = Ipv4Addr::from_str(s) {
        return Ok(IpAddr::from(v4));
    }
    Ipv6Addr::from_str(s)
        .map(IpAddr::from)
        .map_err(|_| format!("invalid address '{}' in '{}'", s, whole))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_10_0_0_0_slash_8_trims_to_one_byte() {
        let p = IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8);
        let (unused, bytes) = p.to_bit_string();
        assert_eq!(unused, 0);
        assert_eq!(bytes, vec![10]);
    }

    #[test]
    fn prefix_192_0_2_0_slash_24_encodes_without_trimming() {
        let p = IpPrefix::new(IpAddr::V4([192, 0, 2, 0]), 24);
        let (unused, bytes) = p.to_bit_string();
        assert_eq!(unused, 0);
        assert_eq!(bytes, vec![0xc0, 0x00, 0x02]);
    }

    #[test]
    fn range_trims_low_and_high_bounds_independently() {
        // 192.168.1.128-192.168.2.255
        let low = IpAddr::V4([192, 168, 1, 128]);
        let high = IpAddr::V4([192, 168, 2, 255]);
        let r = IpRange::new(low, high);
        let ((unused_lo, lo), (unused_hi, hi)) = r.to_bit_strings();
        // 25 significant bits in the low bound -> 4 bytes, 7 unused.
        assert_eq!(unused_lo, 7);
        assert_eq!(lo, vec![0xc0, 0xa8, 0x01, 0x80]);
        // The high bound's last octet (0xff) is entirely a trailing run
        // of ones, so 24 bits (3 whole octets, 0 unused) is the minimal
        // representation that still reconstructs 192.168.2.255 when the
        // stripped low-order bits are padded back in with ones; trimming
        // one bit further would change the recovered third octet from
        // 0x02 to 0x03.
        assert_eq!(unused_hi, 0);
        assert_eq!(hi, vec![0xc0, 0xa8, 0x02]);
    }

    #[test]
    fn parses_v4_prefix_from_cidr_notation() {
        let p: IpPrefix = "10.0.0.0/8".parse().unwrap();
        assert_eq!(p.address, IpAddr::V4([10, 0, 0, 0]));
        assert_eq!(p.prefixlen, 8);
    }

    #[test]
    fn parses_v6_prefix_from_cidr_notation() {
        let p: IpPrefix = "2001:db8::/32".parse().unwrap();
        assert_eq!(p.afi(), Afi::V6);
        assert_eq!(p.prefixlen, 32);
    }

    #[test]
    fn rejects_prefixlen_longer_than_the_family_allows() {
        assert!("10.0.0.0/33".parse::<IpPrefix>().is_err());
    }

    #[test]
    fn parses_range_from_low_high_notation() {
        let r: IpRange = "192.168.1.128-192.168.2.255".parse().unwrap();
        assert_eq!(r.low, IpAddr::V4([192, 168, 1, 128]));
        assert_eq!(r.high, IpAddr::V4([192, 168, 2, 255]));
    }
}
