//! Trust Anchor Locator emission (RFC 7730).
//!
//! ```text
//! <rsync-uri>
//!
//! <base64(SubjectPublicKeyInfo DER)>
//! ```
//!
//! Grounded on the `Ta::run` TAL-writing branch in
//! `examples/other_examples/..._NLnetLabs-mkrpki__src-main.rs.rs`
//! (`base64::encode` of the raw SPKI DER, two-line header) and
//! `examples/original_source/rpkimancer/cert/ca.py`'s TAL text layout
//! for the exact line breaks.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::ca::Ca;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Builds the TAL text body for a Trust Anchor whose own `.cer` is
/// published at `ta_cert_uri`.
pub fn build(ta_cert_uri: &str, spki_der: &[u8]) -> String {
    format!("{}\n\n{}\n", ta_cert_uri, base64::encode(spki_der))
}

/// Writes `<tal_dir>/<ta.common_name>.tal` for a sealed Trust Anchor
/// `Ca`, returning the path written.
pub fn write(ta: &Ca, tal_dir: &Path, common_name: &str) -> Result<PathBuf, Error> {
    fs::create_dir_all(tal_dir)?;
    let path = tal_dir.join(format!("{}.tal", common_name));
    let body = build(&ta.cert_uri(), ta.subject_public_key_info_der());
    fs::write(&path, body)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tal_body_is_uri_blank_line_base64_spki() {
        let body = build("rsync://rpki.example.net/rpki/TA.cer", b"fake-spki-der");
        let expected_header = "rsync://rpki.example.net/rpki/TA.cer\n\n";
        assert!(body.starts_with(expected_header));
        let b64_part = &body[expected_header.len()..];
        assert_eq!(b64_part, format!("{}\n", base64::encode(b"fake-spki-der")));
    }

    #[test]
    fn writes_tal_file_named_after_the_common_name() {
        use crate::ca::Validity;
        use crate::clock::FixedClock;
        use crate::resources::{Afi, IpAddr, IpEntry, IpPrefix, IpResources, ResourceSet};
        use crate::signing::OpenSslKeyGen;
        use chrono::{TimeZone, Utc};

        crate::oid::register_known_types();
        let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
        let keygen = OpenSslKeyGen;
        let resources = ResourceSet {
            ip: IpResources::build(vec![(Afi::V4, IpEntry::Prefix(IpPrefix::new(IpAddr::V4([0, 0, 0, 0]), 0)))]).unwrap(),
            asn: None,
        };
        let validity = Validity { cert_days: 365, crl_days: 7, mft_days: 7 };
        let ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", resources, validity, &clock, &keygen).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = write(&ta, dir.path(), "TA").unwrap();
        assert_eq!(path, dir.path().join("TA.tal"));
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("rsync://rpki.example.net/rpki/TA.cer\n\n"));
    }
}
