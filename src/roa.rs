//! Route Origin Attestation `eContent` (RFC 6482).
//!
//! ```text
//! RouteOriginAttestation ::= SEQUENCE {
//!     version      [0] EXPLICIT INTEGER DEFAULT 0,
//!     asID             ASID,
//!     ipAddrBlocks     SEQUENCE OF ROAIPAddressFamily }
//! ROAIPAddressFamily ::= SEQUENCE {
//!     addressFamily    OCTET STRING (SIZE (2..3)),
//!     addresses        SEQUENCE OF ROAIPAddress }
//! ROAIPAddress ::= SEQUENCE {
//!     address          IPAddress,
//!     maxLength        INTEGER OPTIONAL }
//! ```
//!
//! `version` is DEFAULT 0 and this core never emits anything else, so
//! DER omits it (the same "default is absent" rule `manifest.rs`
//! follows for `manifestNumber`'s sibling field). Grounded on
//! `examples/original_source/rpkimancer/sigobj/roa.py` (the
//! `ip_address_blocks` grouping and `maxLength` presence rule) and
//! `examples/other_examples/..._NLnetLabs-mkrpki__src-main.rs.rs`'s
//! `Roa` subcommand for the field names.

use std::fmt;
use std::str::FromStr;

use crate::asn1::encode::{self, integer_u32, octet_string, Value};
use crate::asn1::OidRef;
use crate::oid;
use crate::resources::{Afi, IpEntry, IpPrefix, IpResources, ResourceSet};
use crate::sigobj::SignedObjectContent;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    InvalidMaxLength { prefixlen: u8, max_length: u8, max_prefixlen: u8 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidMaxLength { prefixlen, max_length, max_prefixlen } => write!(
                f,
                "maxLength {} out of range for prefix length {} (must satisfy {} <= maxLength <= {})",
                max_length, prefixlen, prefixlen, max_prefixlen
            ),
        }
    }
}

impl std::error::Error for Error {}

/// One `(prefix[, maxLength])` entry.
#[derive(Clone, Debug)]
pub struct RoaNetwork {
    pub prefix: IpPrefix,
    pub max_length: Option<u8>,
}

impl RoaNetwork {
    pub fn new(prefix: IpPrefix, max_length: Option<u8>) -> Result<Self, Error> {
        if let Some(max_length) = max_length {
            let max_prefixlen = prefix.afi().addr_bits() as u8;
            if max_length < prefix.prefixlen || max_length > max_prefixlen {
                return Err(Error::InvalidMaxLength {
                    prefixlen: prefix.prefixlen,
                    max_length,
                    max_prefixlen,
                });
            }
        }
        Ok(RoaNetwork { prefix, max_length })
    }

    fn encode(&self) -> encode::Constructed {
        let (unused, bytes) = self.prefix.to_bit_string();
        let address = encode::bit_string(unused, &bytes);
        let mut fields: Vec<Box<dyn Value>> = vec![Box::new(address)];
        if let Some(max_length) = self.max_length {
            fields.push(Box::new(integer_u32(max_length as u32)));
        }
        encode::sequence(fields)
    }
}

/// A complete Route Origin Attestation payload: one origin AS and the
/// set of prefixes it is authorized to originate.
pub struct Roa {
    pub as_id: u32,
    pub networks: Vec<RoaNetwork>,
}

impl Roa {
    pub fn new(as_id: u32, networks: Vec<RoaNetwork>) -> Self {
        Roa { as_id, networks }
    }

    fn family(&self, afi: Afi) -> Vec<&RoaNetwork> {
        self.networks.iter().filter(|n| n.prefix.afi() == afi).collect()
    }

    fn encode_family(&self, afi: Afi) -> Option<encode::Constructed> {
        let entries = self.family(afi);
        if entries.is_empty() {
            return None;
        }
        let addresses: Vec<Box<dyn Value>> =
            entries.iter().map(|n| Box::new(n.encode()) as Box<dyn Value>).collect();
        Some(encode::sequence(vec![
            Box::new(octet_string(afi.code().to_vec())),
            Box::new(encode::sequence(addresses)),
        ]))
    }
}

impl SignedObjectContent for Roa {
    fn content_type(&self) -> OidRef {
        oid::CT_ROUTE_ORIGIN_AUTHZ
    }

    fn to_der(&self) -> Vec<u8> {
        let mut families: Vec<Box<dyn Value>> = Vec::new();
        if let Some(v4) = self.encode_family(Afi::V4) {
            families.push(Box::new(v4));
        }
        if let Some(v6) = self.encode_family(Afi::V6) {
            families.push(Box::new(v6));
        }
        encode::sequence(vec![
            Box::new(integer_u32(self.as_id)),
            Box::new(encode::sequence(families)),
        ])
        .to_vec()
    }

    fn required_resources(&self) -> ResourceSet {
        let entries = self
            .networks
            .iter()
            .map(|n| (n.prefix.afi(), IpEntry::Prefix(n.prefix.clone())))
            .collect();
        let ip = IpResources::build(entries).expect("ROA prefixes never mix inherit with explicit");
        ResourceSet { ip, asn: None }
    }

    fn file_extension(&self) -> &'static str {
        "roa"
    }
}

/// Parses the CLI/config-file form `prefix` or `prefix-maxlen`, e.g.
/// `192.0.2.0/24` or `192.0.2.0/24-24`, grounded directly on the
/// `RoaPrefix: FromStr` impl in
/// `examples/other_examples/..._NLnetLabs-mkrpki__src-main.rs.rs`.
impl FromStr for RoaNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_part, max_length) = match s.split_once('-') {
            Some((prefix, max_length)) => {
                let max_length: u8 = max_length
                    .parse()
                    .map_err(|_| format!("invalid maxLength '{}' in '{}'", max_length, s))?;
                (prefix, Some(max_length))
            }
            None => (s, None),
        };
        let prefix: IpPrefix = prefix_part.parse()?;
        RoaNetwork::new(prefix, max_length).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::IpAddr;

    #[test]
    fn maxlength_out_of_range_is_rejected() {
        let prefix = IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 24);
        let err = RoaNetwork::new(prefix, Some(16)).unwrap_err();
        assert!(matches!(err, Error::InvalidMaxLength { .. }));
    }

    #[test]
    fn maxlength_24_encodes_c0_00_02() {
        // asID=65000, prefix=192.0.2.0/24, maxLength=24.
        let prefix = IpPrefix::new(IpAddr::V4([192, 0, 2, 0]), 24);
        let network = RoaNetwork::new(prefix, Some(24)).unwrap();
        let roa = Roa::new(65000, vec![network]);
        crate::oid::register_known_types();
        let der = roa.to_der();
        // asID INTEGER followed by one IPv4 ROAIPAddressFamily whose
        // single ROAIPAddress is (0-unused BIT STRING C0 00 02, maxLength 24).
        assert!(der.windows(3).any(|w| w == [0xc0, 0x00, 0x02]));
    }

    #[test]
    fn no_maxlength_omits_the_field() {
        let prefix = IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8);
        let network = RoaNetwork::new(prefix, None).unwrap();
        let roa = Roa::new(65000, vec![network]);
        let resources = roa.required_resources();
        assert!(!resources.ip.is_empty());
        assert!(resources.asn.is_none());
    }

    #[test]
    fn parses_network_with_maxlength_suffix() {
        let network: RoaNetwork = "192.0.2.0/24-24".parse().unwrap();
        assert_eq!(network.prefix.prefixlen, 24);
        assert_eq!(network.max_length, Some(24));
    }

    #[test]
    fn parses_network_without_maxlength_suffix() {
        let network: RoaNetwork = "10.0.0.0/8".parse().unwrap();
        assert_eq!(network.max_length, None);
    }

    #[test]
    fn rejects_out_of_range_maxlength_suffix() {
        assert!("192.0.2.0/24-16".parse::<RoaNetwork>().is_err());
    }
}
