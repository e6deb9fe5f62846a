//! Hand-rolled BER/DER codec (ITU-T X.690) and the two open-type
//! registries used to constrain `EncapsulatedContentInfo` and
//! certificate extensions.
//!
//! See `DESIGN.md` ("Dependency note: no `bcder`") for why this is our own
//! code rather than a wrapped third-party ASN.1 crate.

pub mod content_registry;
pub mod decode;
pub mod encode;
pub mod ext_registry;
pub mod tag;

pub use decode::{Reader, Tlv};
pub use encode::Value;
pub use tag::Tag;

use std::fmt;

/// Failure modes for this layer.
#[derive(Debug)]
pub enum Error {
    /// The input could not be parsed as well-formed DER.
    MalformedInput(decode::Error),
    /// An `EncapsulatedContentInfo` or extension named an OID with no
    /// entry in the relevant registry.
    UnknownContentType(String),
    /// A value was syntactically valid DER but violated a constraint the
    /// registry (or the caller) places on it.
    ConstraintViolation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedInput(e) => write!(f, "malformed input: {}", e),
            Error::UnknownContentType(oid) => write!(f, "unregistered content type {}", oid),
            Error::ConstraintViolation(msg) => write!(f, "constraint violation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<decode::Error> for Error {
    fn from(e: decode::Error) -> Self {
        Error::MalformedInput(e)
    }
}

/// A BER/DER object identifier, stored as its raw content octets (the
/// base-128 encoding of the arc values after the tag and length have
/// been stripped).
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Oid(pub Vec<u8>);

impl Oid {
    pub const fn from_static(bytes: &'static [u8]) -> OidRef {
        OidRef(bytes)
    }
}

impl encode::Value for Oid {
    fn encoded_len(&self) -> usize {
        encode::Primitive::new(Tag::OID, self.0.clone()).encoded_len()
    }
    fn write_encoded(&self, target: &mut dyn std::io::Write) -> std::io::Result<()> {
        encode::Primitive::new(Tag::OID, self.0.clone()).write_encoded(target)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// A `'static` OID constant, cheap to copy and compare; `.to_oid()` heap
/// allocates only when an owned `Oid` is actually needed (e.g. to key a
/// `HashMap` or to embed in a built value).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OidRef(pub &'static [u8]);

impl OidRef {
    pub fn to_oid(self) -> Oid {
        Oid(self.0.to_vec())
    }
}

impl encode::Value for OidRef {
    fn encoded_len(&self) -> usize {
        encode::Primitive::new(Tag::OID, self.0.to_vec()).encoded_len()
    }
    fn write_encoded(&self, target: &mut dyn std::io::Write) -> std::io::Result<()> {
        encode::Primitive::new(Tag::OID, self.0.to_vec()).write_encoded(target)
    }
}

impl PartialEq<Oid> for OidRef {
    fn eq(&self, other: &Oid) -> bool {
        self.0 == other.0.as_slice()
    }
}
