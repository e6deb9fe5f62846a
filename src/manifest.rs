//! RPKI Manifest `eContent` (RFC 6486).
//!
//! ```text
//! Manifest ::= SEQUENCE {
//!     version        [0] EXPLICIT INTEGER DEFAULT 0,
//!     manifestNumber     INTEGER,
//!     thisUpdate         GeneralizedTime,
//!     nextUpdate         GeneralizedTime,
//!     fileHashAlg        OBJECT IDENTIFIER,
//!     fileList           SEQUENCE OF FileAndHash }
//! FileAndHash ::= SEQUENCE {
//!     file               IA5String,
//!     hash               BIT STRING }
//! ```
//!
//! `version` is DEFAULT 0 and omitted, same as `roa.rs`. Grounded on
//! `examples/original_source/rpkimancer/sigobj/mft.py` for the field
//! list and the `fileHashAlg`-is-a-bare-OID detail, and
//! `examples/other_examples/..._NLnetLabs-mkrpki__src-main.rs.rs`'s
//! `Manifest` subcommand for how the file list is assembled from
//! already-written sibling objects.

use crate::asn1::encode::{self, bit_string, ia5_string, integer_u64, Constructed, Value};
use crate::asn1::OidRef;
use crate::clock::GenTime;
use crate::oid;
use crate::resources::{AsResources, IpEntry, IpResources, ResourceSet};
use crate::signing;
use crate::sigobj::SignedObjectContent;

#[derive(Debug)]
pub enum Error {
    Digest(signing::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Digest(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

/// One `fileList` entry: a sibling file's name and the SHA-256 digest of
/// its already-written contents.
pub struct ManifestEntry {
    pub file: String,
    pub hash: [u8; 32],
}

impl ManifestEntry {
    pub fn new(file: impl Into<String>, contents: &[u8]) -> Result<Self, Error> {
        let hash = signing::sha256(contents).map_err(Error::Digest)?;
        Ok(ManifestEntry { file: file.into(), hash })
    }

    fn encode(&self) -> Constructed {
        encode::sequence(vec![
            Box::new(ia5_string(&self.file)),
            Box::new(bit_string(0, &self.hash)),
        ])
    }
}

/// A complete Manifest payload for one CA, enumerating every object in
/// its publication point: its own CRL and every EE/child-CA object.
pub struct Manifest {
    pub manifest_number: u64,
    pub this_update: GenTime,
    pub next_update: GenTime,
    pub entries: Vec<ManifestEntry>,
}

impl SignedObjectContent for Manifest {
    fn content_type(&self) -> OidRef {
        oid::CT_RPKI_MANIFEST
    }

    fn to_der(&self) -> Vec<u8> {
        let file_list: Vec<Box<dyn Value>> =
            self.entries.iter().map(|e| Box::new(e.encode()) as Box<dyn Value>).collect();
        encode::sequence(vec![
            Box::new(integer_u64(self.manifest_number)),
            Box::new(self.this_update.encode()),
            Box::new(self.next_update.encode()),
            Box::new(oid::SHA256),
            Box::new(encode::sequence(file_list)),
        ])
        .to_vec()
    }

    fn required_resources(&self) -> ResourceSet {
        ResourceSet {
            ip: IpResources::build(vec![(crate::resources::Afi::V4, IpEntry::Inherit), (crate::resources::Afi::V6, IpEntry::Inherit)])
                .expect("a pair of lone inherit markers never mixes with explicit entries"),
            asn: Some(AsResources::Inherit),
        }
    }

    fn file_extension(&self) -> &'static str {
        "mft"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn required_resources_are_both_inherit() {
        let manifest = Manifest {
            manifest_number: 1,
            this_update: GenTime::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0)),
            next_update: GenTime::new(Utc.ymd(2024, 1, 8).and_hms(0, 0, 0)),
            entries: vec![],
        };
        let resources = manifest.required_resources();
        assert!(matches!(resources.asn, Some(AsResources::Inherit)));
    }

    #[test]
    fn file_list_entries_carry_32_byte_hashes() {
        let entry = ManifestEntry::new("revoked.crl", b"crl-bytes").unwrap();
        assert_eq!(entry.hash.len(), 32);
        let der = entry.encode().to_vec();
        assert!(!der.is_empty());
    }

    #[test]
    fn manifest_to_der_omits_the_default_version_field() {
        crate::oid::register_known_types();
        let entry = ManifestEntry::new("revoked.crl", b"crl-bytes").unwrap();
        let manifest = Manifest {
            manifest_number: 3,
            this_update: GenTime::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0)),
            next_update: GenTime::new(Utc.ymd(2024, 1, 8).and_hms(0, 0, 0)),
            entries: vec![entry],
        };
        let der = manifest.to_der();
        // First field inside the top-level SEQUENCE is manifestNumber
        // (an INTEGER), not a [0] EXPLICIT version wrapper.
        assert_eq!(der[2], crate::asn1::tag::Tag::INTEGER.0);
    }
}
