//! Publication layout planner.
//!
//! Materializes a sealed [`Ca`] tree as files on disk. Grounded on
//! krill's `remote/responder.rs` (`fs::create_dir_all` before
//! `fs::write`, one directory per logical unit) for the filesystem
//! side, and on a directory-mapping rule for how a
//! logical `rsync://` URI becomes a path: given `base_uri =
//! <scheme>://<host>/<path>`, the root publication directory is
//! `<pub-root>/<host>/<path>`. Every URI this crate hands out (`Ca`
//! certificate/CRL/manifest/object URIs) is already rooted at the same
//! `base_uri`, so writing an object only ever needs the URI and the
//! `pub-root` -- there is no separate base-URI bookkeeping here.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::ca::Ca;

#[derive(Debug)]
pub enum Error {
    /// A URI handed to the planner was not an `rsync://` URI.
    NotRsync(String),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotRsync(uri) => write!(f, "not an rsync URI: {}", uri),
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

const SCHEME: &str = "rsync://";

/// Maps an `rsync://<host>/<path...>` URI onto `<pub_root>/<host>/<path...>`.
fn disk_path(pub_root: &Path, uri: &str) -> Result<PathBuf, Error> {
    let rest = uri.strip_prefix(SCHEME).ok_or_else(|| Error::NotRsync(uri.to_string()))?;
    let mut path = pub_root.to_path_buf();
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    Ok(path)
}

/// An `rsync://` base URI, parsed once and reused to locate the root of
/// a publication tree (e.g. to place the TAL's line-1 URI, or to derive
/// `pub_root` from a configured `base_uri` plus `output_root`).
pub struct RsyncBaseUri {
    uri: String,
}

impl RsyncBaseUri {
    pub fn parse(uri: impl Into<String>) -> Result<Self, Error> {
        let uri = uri.into();
        if !uri.starts_with(SCHEME) {
            return Err(Error::NotRsync(uri));
        }
        Ok(RsyncBaseUri { uri })
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// The root publication directory this base URI maps to.
    pub fn root_dir(&self, pub_root: &Path) -> Result<PathBuf, Error> {
        disk_path(pub_root, &self.uri)
    }
}

fn write_object(pub_root: &Path, uri: &str, der: &[u8]) -> Result<PathBuf, Error> {
    let path = disk_path(pub_root, uri)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, der)?;
    Ok(path)
}

/// Writes one CA's own certificate, CRL, manifest and published EE
/// objects, then recurses into its children, applied post-order since
/// `seal` has already computed every
/// manifest bottom-up by the time `publish` walks the tree top-down).
fn write_ca(ca: &Ca, pub_root: &Path, written: &mut Vec<PathBuf>) -> Result<(), Error> {
    written.push(write_object(pub_root, &ca.cert_uri(), &ca.cert_der)?);
    written.push(write_object(pub_root, &ca.crl_uri(), &ca.last_crl_der)?);
    if let Some(manifest_der) = &ca.last_manifest_der {
        written.push(write_object(pub_root, &ca.manifest_uri(), manifest_der)?);
    }
    for object in &ca.objects {
        let uri = format!("{}/{}", ca.repo_uri, object.filename);
        written.push(write_object(pub_root, &uri, &object.der)?);
    }
    for child in &ca.children {
        write_ca(child, pub_root, written)?;
    }
    Ok(())
}

/// Materializes a sealed `Ca` tree under `pub_root`, returning every
/// path written. `ta` must already have
/// been [`Ca::seal`]ed -- `publish` only writes what is already in
/// memory, it never computes a CRL or manifest itself.
pub fn publish(ta: &Ca, pub_root: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut written = Vec::new();
    write_ca(ta, pub_root, &mut written)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::Validity;
    use crate::clock::FixedClock;
    use crate::resources::{AsIdOrRange, AsResources, Afi, IpAddr, IpEntry, IpPrefix, IpResources, ResourceSet};
    use crate::roa::Roa;
    use crate::signing::OpenSslKeyGen;
    use chrono::{TimeZone, Utc};

    fn whole_world() -> ResourceSet {
        ResourceSet {
            ip: IpResources::build(vec![
                (Afi::V4, IpEntry::Prefix(IpPrefix::new(IpAddr::V4([0, 0, 0, 0]), 0))),
                (Afi::V6, IpEntry::Prefix(IpPrefix::new(IpAddr::V6([0; 16]), 0))),
            ])
            .unwrap(),
            asn: Some(AsResources::Entries(vec![AsIdOrRange::Range(0, u32::MAX)])),
        }
    }

    #[test]
    fn minimal_repo_layout_matches_rsync_uris() {
        crate::oid::register_known_types();
        let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
        let keygen = OpenSslKeyGen;
        let validity = Validity { cert_days: 365, crl_days: 7, mft_days: 7 };

        let mut ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", whole_world(), validity, &clock, &keygen).unwrap();
        let ca_resources = ResourceSet {
            ip: IpResources::build(vec![(Afi::V4, IpEntry::Prefix(IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8)))]).unwrap(),
            asn: Some(AsResources::Entries(vec![AsIdOrRange::Id(65000)])),
        };
        let idx = ta.issue_ca("CA", ca_resources, &clock, &keygen).unwrap();
        let roa = Roa::new(65000, vec![crate::roa::RoaNetwork::new(IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8), None).unwrap()]);
        ta.children[idx].issue_roa(roa, &clock, &keygen).unwrap();
        ta.seal(&clock, &keygen).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = publish(&ta, dir.path()).unwrap();

        let root = dir.path().join("rpki.example.net").join("rpki");
        assert!(written.contains(&root.join("TA.cer")));
        assert!(written.contains(&root.join("TA").join("revoked.crl")));
        assert!(written.contains(&root.join("TA").join("manifest.mft")));
        assert!(written.contains(&root.join("TA").join("CA.cer")));
        assert!(written.contains(&root.join("TA").join("CA").join("revoked.crl")));
        assert!(written.contains(&root.join("TA").join("CA").join("manifest.mft")));
        assert_eq!(
            fs::read(root.join("TA").join("CA.cer")).unwrap(),
            ta.children[idx].cert_der
        );
    }

    #[test]
    fn non_rsync_uri_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = disk_path(dir.path(), "https://example.net/x").unwrap_err();
        assert!(matches!(err, Error::NotRsync(_)));
    }
}
