//! Resource certificates and CRLs.
//!
//! Grounded on krill's `util/test.rs` + the crypto/signing example for
//! the overall builder call shape, `examples/other_examples/..._NLnetLabs-mkrpki__src-main.rs.rs`
//! (the `Ta`/`Cert`/`Crl` subcommands drive the same construction steps
//! we reimplement here), and `examples/original_source/rpkimancer/cert/base.py`
//! for the field-by-field order (kept as RFC 6487 section references in
//! comments, matching that file's own style).

pub mod crl;
pub mod extensions;
pub mod tbscert;

pub use crl::{build_crl, CrlFields, RevokedCert};
pub use extensions::Extensions;
pub use tbscert::{build_certificate, CertFields, SubjectInfoAccess};

use std::fmt;

use crate::asn1::encode::{self, Constructed, Value};
use crate::asn1::OidRef;
use crate::oid;

#[derive(Debug)]
pub enum Error {
    Resources(crate::resources::Error),
    Signing(crate::signing::Error),
    /// A constructed extension violated the registry's criticality rule
    /// (programmer error: every extension this crate builds is
    /// registered in `oid::register_known_types`).
    Extension(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Resources(e) => write!(f, "{}", e),
            Error::Signing(e) => write!(f, "{}", e),
            Error::Extension(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::resources::Error> for Error {
    fn from(e: crate::resources::Error) -> Self {
        Error::Resources(e)
    }
}

impl From<crate::signing::Error> for Error {
    fn from(e: crate::signing::Error) -> Self {
        Error::Signing(e)
    }
}

/// `Name ::= SEQUENCE OF RelativeDistinguishedName`, here always a
/// single RDN with a single `commonName` attribute.
pub(crate) fn name(common_name: &str) -> Constructed {
    let atv = encode::sequence(vec![
        Box::new(oid::COMMON_NAME),
        Box::new(encode::printable_string(common_name)),
    ]);
    let rdn = encode::set_of(vec![atv.to_vec()]);
    encode::sequence(vec![Box::new(rdn)])
}

/// `AlgorithmIdentifier ::= SEQUENCE { algorithm OID, parameters ANY
/// OPTIONAL }` with parameters always absent, per RFC 7935's algorithm
/// profile: parameters MUST be absent, not NULL.
pub(crate) fn algorithm_identifier(algorithm: OidRef) -> Constructed {
    encode::sequence(vec![Box::new(algorithm)])
}

pub(crate) fn signature_algorithm() -> Constructed {
    algorithm_identifier(oid::SHA256_WITH_RSA_ENCRYPTION)
}
