//! `IPAddrBlocks` construction (RFC 3779 §2.2.3).
//!
//! ```text
//! IPAddrBlocks     ::= SEQUENCE OF IPAddressFamily
//! IPAddressFamily  ::= SEQUENCE {
//!     addressFamily    OCTET STRING (SIZE (2..3)),
//!     ipAddressChoice  IPAddressChoice
//! }
//! IPAddressChoice  ::= CHOICE {
//!     inherit             NULL,
//!     addressesOrRanges   SEQUENCE OF IPAddressOrRange
//! }
//! IPAddressOrRange ::= CHOICE {
//!     addressPrefix   IPAddress,
//!     addressRange    IPAddressRange
//! }
//! IPAddressRange   ::= SEQUENCE { min IPAddress, max IPAddress }
//! IPAddress        ::= BIT STRING
//! ```
//!
//! Grounded on `examples/original_source/rpkimancer/resources.py`
//! (per-family grouping, the `inherit` sentinel collapsing a whole
//! family) and the prototest `cacert.rs` example (exact `IPAddressFamily`
//! byte layout).

use std::str::FromStr;

use crate::asn1::encode::{self, null, octet_string, Constructed, Value};
use crate::asn1::tag::Tag;

use super::prefix::{Afi, IpPrefix, IpRange};
use super::Error;

/// One entry supplied by the caller for a given family: either the
/// `inherit` marker, an explicit prefix, or an explicit range.
#[derive(Clone, Debug)]
pub enum IpEntry {
    Inherit,
    Prefix(IpPrefix),
    Range(IpRange),
}

impl IpEntry {
    fn afi(&self, family: Afi) -> Afi {
        match self {
            IpEntry::Inherit => family,
            IpEntry::Prefix(p) => p.afi(),
            IpEntry::Range(r) => r.afi(),
        }
    }

    /// The family this entry is self-describing for, i.e. every variant
    /// except `Inherit` (which only has a family once a caller groups it
    /// under one). Used to pair a flat, config-file-supplied entry list
    /// with [`IpResources::build`] without the caller having to track
    /// family separately.
    pub fn family(&self) -> Option<Afi> {
        match self {
            IpEntry::Inherit => None,
            IpEntry::Prefix(p) => Some(p.afi()),
            IpEntry::Range(r) => Some(r.afi()),
        }
    }
}

/// Parses the CLI/config-file form of a resource entry: `inherit`, an
/// `address/prefixlen`, or a `low-high` range.
impl FromStr for IpEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("inherit") {
            return Ok(IpEntry::Inherit);
        }
        if s.contains('-') {
            return Ok(IpEntry::Range(s.parse()?));
        }
        Ok(IpEntry::Prefix(s.parse()?))
    }
}

/// The caller-supplied resource list for one address family, already
/// grouped. Use [`IpResources::build`] to validate and turn a flat list
/// of entries into this shape.
#[derive(Clone, Debug, Default)]
pub struct IpResources {
    pub v4: Vec<IpEntry>,
    pub v6: Vec<IpEntry>,
}

impl IpResources {
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// Groups a flat, caller-ordered list of `(family, entry)` pairs and
    /// validates it: entries must match the family they're grouped
    /// under, and a family may not mix `inherit` with explicit entries
    /// (RFC 3779 §2.2.3.6).
    pub fn build(entries: Vec<(Afi, IpEntry)>) -> Result<Self, Error> {
        let mut out = IpResources::default();
        for (family, entry) in entries {
            if entry.afi(family) != family {
                return Err(Error::FamilyMismatch);
            }
            match family {
                Afi::V4 => out.v4.push(entry),
                Afi::V6 => out.v6.push(entry),
            }
        }
        out.validate()?;
        Ok(out)
    }

    fn validate(&self) -> Result<(), Error> {
        for family in [&self.v4, &self.v6] {
            let has_inherit = family.iter().any(|e| matches!(e, IpEntry::Inherit));
            let has_explicit = family.iter().any(|e| !matches!(e, IpEntry::Inherit));
            if has_inherit && has_explicit {
                return Err(Error::MixedInheritAndExplicit);
            }
        }
        Ok(())
    }

    /// Encodes the whole `IPAddrBlocks` value, IPv4 before IPv6.
    /// Returns `EmptyResourceSet` if both families are
    /// empty -- a certificate carrying this extension must say something.
    pub fn encode(&self) -> Result<Constructed, Error> {
        if self.is_empty() {
            return Err(Error::EmptyResourceSet);
        }
        let mut families: Vec<Box<dyn Value>> = Vec::new();
        if !self.v4.is_empty() {
            families.push(Box::new(encode_family(Afi::V4, &self.v4)));
        }
        if !self.v6.is_empty() {
            families.push(Box::new(encode_family(Afi::V6, &self.v6)));
        }
        Ok(encode::sequence(families))
    }
}

fn encode_family(afi: Afi, entries: &[IpEntry]) -> Constructed {
    let choice: Box<dyn Value> = if entries.iter().any(|e| matches!(e, IpEntry::Inherit)) {
        Box::new(null())
    } else {
        let mut sorted = entries.to_vec();
        sort_entries(&mut sorted);
        let items: Vec<Box<dyn Value>> = sorted.iter().map(encode_entry).collect();
        Box::new(encode::sequence(items))
    };
    Constructed::new(
        Tag::SEQUENCE,
        &[&octet_string(afi.code().to_vec()) as &dyn Value, &*choice],
    )
}

/// Entries within a family are emitted in ascending numerical order.
fn sort_entries(entries: &mut [IpEntry]) {
    entries.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

fn sort_key(entry: &IpEntry) -> Vec<u8> {
    match entry {
        IpEntry::Inherit => Vec::new(),
        IpEntry::Prefix(p) => p.address.octets().to_vec(),
        IpEntry::Range(r) => r.low.octets().to_vec(),
    }
}

fn encode_entry(entry: &IpEntry) -> Box<dyn Value> {
    match entry {
        IpEntry::Inherit => unreachable!("inherit entries never reach encode_entry"),
        IpEntry::Prefix(p) => {
            let (unused, bytes) = p.to_bit_string();
            Box::new(encode::bit_string(unused, &bytes))
        }
        IpEntry::Range(r) => {
            let ((unused_min, min), (unused_max, max)) = r.to_bit_strings();
            let min_bs = encode::bit_string(unused_min, &min);
            let max_bs = encode::bit_string(unused_max, &max);
            Box::new(Constructed::new(
                Tag::SEQUENCE,
                &[&min_bs as &dyn Value, &max_bs],
            ))
        }
    }
}
