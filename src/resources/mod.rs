//! Typed resource sets: IPv4/IPv6 prefixes and ranges, AS ids and ranges,
//! and their RFC 3779 DER encodings.

pub mod asblocks;
pub mod ipblocks;
pub mod prefix;

pub use asblocks::{AsIdOrRange, AsResources};
pub use ipblocks::{IpEntry, IpResources};
pub use prefix::{Afi, IpAddr, IpPrefix, IpRange};

use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// A family's resource list mixed the `inherit` marker with explicit
    /// entries (RFC 3779 §2.2.3.6).
    MixedInheritAndExplicit,
    /// An entry was grouped under a family it doesn't belong to.
    FamilyMismatch,
    /// A resource extension would have nothing to say: neither `inherit`
    /// nor any entries for the families/branch it governs.
    EmptyResourceSet,
    /// An `ASRange`'s `min` exceeded its `max`.
    InvalidAsRange { min: u32, max: u32 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MixedInheritAndExplicit => {
                write!(f, "a resource family cannot mix 'inherit' with explicit entries")
            }
            Error::FamilyMismatch => write!(f, "resource entry does not match its declared family"),
            Error::EmptyResourceSet => write!(f, "resource set is empty"),
            Error::InvalidAsRange { min, max } => {
                write!(f, "AS range min {} exceeds max {}", min, max)
            }
        }
    }
}

impl std::error::Error for Error {}

/// A full resource set attached to a certificate: IP resources, AS
/// resources, or both (RFC 6487 §4.8.10/§4.8.11 require at least one
/// present when the governing extensions are emitted).
#[derive(Clone, Debug, Default)]
pub struct ResourceSet {
    pub ip: IpResources,
    pub asn: Option<AsResources>,
}

impl ResourceSet {
    pub fn is_empty(&self) -> bool {
        self.ip.is_empty() && self.asn.is_none()
    }
}
