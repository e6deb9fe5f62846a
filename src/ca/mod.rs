//! The Certificate Authority state machine.
//!
//! Grounded on `examples/original_source/rpkimancer/cert/ca.py` for the
//! `fresh -> self-issued -> operational` lifecycle and the counter
//! names (`next_serial_number`, `next_crl_number`, `next_manifest_number`),
//! and on krill's `CertifiedKey`/issuance call shapes for how a CA's
//! counters and issued-object list are threaded through one mutable
//! struct rather than a database. The parent/child ownership cycle a
//! mutable tree naturally wants is resolved here by having a CA own its
//! children by value (`Vec<Ca>`)
//! with no back-reference; everything a child needs from its issuer (CN,
//! URIs, serial) is computed once, at issuance time, and baked into the
//! child.

use std::fmt;

use crate::cert::{self, CertFields, CrlFields, RevokedCert, SubjectInfoAccess};
use crate::clock::{Clock, GenTime, Time};
use crate::error::Warning;
use crate::ghostbusters::Ghostbusters;
use crate::manifest::{Manifest, ManifestEntry};
use crate::resources::{AsIdOrRange, AsResources, IpEntry, ResourceSet};
use crate::roa::Roa;
use crate::signing::{KeyGen, KeyPair};
use crate::sigobj::{self, IssuerContext, SignedObjectContent};

#[derive(Debug)]
pub enum Error {
    Cert(cert::Error),
    SignedObject(sigobj::Error),
    Manifest(crate::manifest::Error),
    /// A child CA or EE object declared resources the issuer does not
    /// hold (RFC 3779 §4: resource extension inheritance/containment).
    OutOfResources,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Cert(e) => write!(f, "{}", e),
            Error::SignedObject(e) => write!(f, "{}", e),
            Error::Manifest(e) => write!(f, "{}", e),
            Error::OutOfResources => write!(f, "declared resources are not a subset of the issuer's"),
        }
    }
}

impl std::error::Error for Error {}

impl From<cert::Error> for Error {
    fn from(e: cert::Error) -> Self {
        Error::Cert(e)
    }
}

impl From<sigobj::Error> for Error {
    fn from(e: sigobj::Error) -> Self {
        Error::SignedObject(e)
    }
}

impl From<crate::manifest::Error> for Error {
    fn from(e: crate::manifest::Error) -> Self {
        Error::Manifest(e)
    }
}

/// One already-signed EE object awaiting publication in its issuing
/// CA's directory.
pub struct PublishedObject {
    pub filename: String,
    pub der: Vec<u8>,
}

/// Validity windows shared by every certificate/CRL/manifest a CA tree
/// issues.
#[derive(Clone, Copy, Debug)]
pub struct Validity {
    pub cert_days: i64,
    pub crl_days: i64,
    pub mft_days: i64,
}

pub struct Ca {
    pub common_name: String,
    pub cert_der: Vec<u8>,
    /// This CA's own publication directory, e.g.
    /// `rsync://host/path/TA` or `.../TA/CA1`. CRL, manifest and issued
    /// EE objects live here; the CA's own `.cer` lives one level up, in
    /// the issuer's directory.
    pub repo_uri: String,
    resources: ResourceSet,
    validity: Validity,
    key: KeyPair,
    next_serial: u64,
    next_crl_number: u64,
    next_manifest_number: u64,
    revoked: Vec<RevokedCert>,
    pub last_crl_der: Vec<u8>,
    pub last_manifest_der: Option<Vec<u8>>,
    pub children: Vec<Ca>,
    pub objects: Vec<PublishedObject>,
}

fn crl_uri(repo_uri: &str) -> String {
    format!("{}/revoked.crl", repo_uri)
}

fn manifest_uri(repo_uri: &str) -> String {
    format!("{}/manifest.mft", repo_uri)
}

/// Checks that every entry of `child` is covered by some entry of
/// `issuer`, per RFC 3779 §4's resource-extension containment rule: a
/// certificate's resources must be a subset of its issuer's. `inherit`
/// entries are always covered -- they denote "the same resources as the
/// issuer", which is true by construction for Manifest/Ghostbusters EE
/// content.
fn resources_contained(child: &ResourceSet, issuer: &ResourceSet) -> bool {
    ip_family_contained(&child.ip.v4, &issuer.ip.v4)
        && ip_family_contained(&child.ip.v6, &issuer.ip.v6)
        && as_contained(&child.asn, &issuer.asn)
}

fn ip_family_contained(child: &[IpEntry], issuer: &[IpEntry]) -> bool {
    child.iter().all(|entry| match entry {
        IpEntry::Inherit => true,
        _ => {
            let (low, high) = match ip_entry_bounds(entry) {
                Some(bounds) => bounds,
                None => return true,
            };
            issuer.iter().any(|candidate| match ip_entry_bounds(candidate) {
                Some((issuer_low, issuer_high)) => issuer_low <= low && high <= issuer_high,
                None => matches!(candidate, IpEntry::Inherit),
            })
        }
    })
}

fn ip_entry_bounds(entry: &IpEntry) -> Option<(u128, u128)> {
    use crate::resources::{IpAddr, IpPrefix, IpRange};

    fn value(addr: &IpAddr) -> u128 {
        let octets = addr.octets();
        let mut buf = [0u8; 16];
        buf[16 - octets.len()..].copy_from_slice(octets);
        u128::from_be_bytes(buf)
    }

    fn prefix_bounds(p: &IpPrefix) -> (u128, u128) {
        let base = value(&p.address);
        let total_bits = p.afi().addr_bits() as u32;
        let host_bits = total_bits - p.prefixlen as u32;
        let span = if host_bits == 0 { 0 } else { (1u128 << host_bits) - 1 };
        (base, base + span)
    }

    fn range_bounds(r: &IpRange) -> (u128, u128) {
        (value(&r.low), value(&r.high))
    }

    match entry {
        IpEntry::Inherit => None,
        IpEntry::Prefix(p) => Some(prefix_bounds(p)),
        IpEntry::Range(r) => Some(range_bounds(r)),
    }
}

fn as_contained(child: &Option<AsResources>, issuer: &Option<AsResources>) -> bool {
    let child_entries = match child {
        None => return true,
        Some(AsResources::Inherit) => return true,
        Some(AsResources::Entries(entries)) => entries,
    };
    let issuer_entries = match issuer {
        Some(AsResources::Entries(entries)) => entries,
        _ => return child_entries.is_empty(),
    };
    child_entries.iter().all(|entry| {
        let (lo, hi) = match entry {
            AsIdOrRange::Id(id) => (*id, *id),
            AsIdOrRange::Range(min, max) => (*min, *max),
        };
        issuer_entries.iter().any(|candidate| match candidate {
            AsIdOrRange::Id(id) => lo == *id && hi == *id,
            AsIdOrRange::Range(min, max) => *min <= lo && hi <= *max,
        })
    })
}

impl Ca {
    /// Creates a Trust Anchor: a self-signed CA certificate, followed
    /// immediately by an initial empty CRL (the `fresh -> self-issued`
    /// transition).
    pub fn new_ta(
        common_name: impl Into<String>,
        base_uri: &str,
        resources: ResourceSet,
        validity: Validity,
        clock: &dyn Clock,
        keygen: &dyn KeyGen,
    ) -> Result<Ca, Error> {
        let common_name = common_name.into();
        let key = keygen.generate().map_err(cert::Error::from)?;
        let repo_uri = format!("{}/{}", base_uri, common_name);
        let not_before = Time::now(clock);
        let not_after = not_before.plus_days(validity.cert_days);

        let fields = CertFields {
            serial: 1,
            issuer_cn: &common_name,
            subject_cn: &common_name,
            not_before,
            not_after,
            subject_key: &key,
            issuer_key: None,
            is_ca: true,
            resources: &resources,
            sia: SubjectInfoAccess::Ca {
                repository: &repo_uri,
                manifest: &manifest_uri(&repo_uri),
            },
            aia_crldp: None,
        };
        let cert_der = cert::build_certificate(&fields, &key)?;

        let mut ca = Ca {
            common_name,
            cert_der,
            repo_uri,
            resources,
            validity,
            key,
            next_serial: 2,
            next_crl_number: 0,
            next_manifest_number: 0,
            revoked: Vec::new(),
            last_crl_der: Vec::new(),
            last_manifest_der: None,
            children: Vec::new(),
            objects: Vec::new(),
        };
        ca.reissue_crl(clock);
        Ok(ca)
    }

    /// Issues a subordinate CA certificate and gives it an initial empty
    /// CRL, appending it to `self.children`. Returns the child's index.
    pub fn issue_ca(
        &mut self,
        common_name: impl Into<String>,
        resources: ResourceSet,
        clock: &dyn Clock,
        keygen: &dyn KeyGen,
    ) -> Result<usize, Error> {
        if !resources_contained(&resources, &self.resources) {
            return Err(Error::OutOfResources);
        }
        let common_name = common_name.into();
        let key = keygen.generate().map_err(cert::Error::from)?;
        let serial = self.next_serial;
        self.next_serial += 1;

        let repo_uri = format!("{}/{}", self.repo_uri, common_name);
        let not_before = Time::now(clock);
        let not_after = not_before.plus_days(self.validity.cert_days);

        let fields = CertFields {
            serial,
            issuer_cn: &self.common_name,
            subject_cn: &common_name,
            not_before,
            not_after,
            subject_key: &key,
            issuer_key: Some(&self.key),
            is_ca: true,
            resources: &resources,
            sia: SubjectInfoAccess::Ca {
                repository: &repo_uri,
                manifest: &manifest_uri(&repo_uri),
            },
            aia_crldp: Some((&crl_uri(&self.repo_uri), &self.cert_uri())),
        };
        let cert_der = cert::build_certificate(&fields, &self.key)?;

        let mut child = Ca {
            common_name,
            cert_der,
            repo_uri,
            resources,
            validity: self.validity,
            key,
            next_serial: 1,
            next_crl_number: 0,
            next_manifest_number: 0,
            revoked: Vec::new(),
            last_crl_der: Vec::new(),
            last_manifest_der: None,
            children: Vec::new(),
            objects: Vec::new(),
        };
        child.reissue_crl(clock);
        self.children.push(child);
        Ok(self.children.len() - 1)
    }

    /// The URI of this CA's own `.cer` file, as seen from its parent's
    /// (or, for a TA, the base URI's) directory.
    pub fn cert_uri(&self) -> String {
        format!("{}.cer", self.repo_uri)
    }

    fn signed_object_uri(&self, filename: &str) -> String {
        format!("{}/{}", self.repo_uri, filename)
    }

    /// The DER encoding of this CA's `SubjectPublicKeyInfo`, needed by
    /// [`crate::tal`] to emit a Trust Anchor Locator for a TA `Ca`.
    pub fn subject_public_key_info_der(&self) -> &[u8] {
        self.key.subject_public_key_info_der()
    }

    /// The URI of this CA's CRL, as published inside its own directory.
    pub fn crl_uri(&self) -> String {
        crl_uri(&self.repo_uri)
    }

    /// The URI of this CA's manifest, as published inside its own directory.
    pub fn manifest_uri(&self) -> String {
        manifest_uri(&self.repo_uri)
    }

    /// Issues a signed object whose destination filename is already
    /// known (a fixed name, for a Manifest; precomputed from the
    /// content's own digest, for a ROA/Ghostbusters Record -- see
    /// [`subject_common_name`]). The SIA `signedObject` URI embedded in
    /// the EE certificate must name the file the object actually ends
    /// up at, so the filename has to be settled before `assemble` runs.
    fn issue_signed_object(
        &mut self,
        content: &dyn SignedObjectContent,
        filename: &str,
        clock: &dyn Clock,
        keygen: &dyn KeyGen,
    ) -> Result<sigobj::Assembled, Error> {
        let resources = content.required_resources();
        if !resources_contained(&resources, &self.resources) {
            return Err(Error::OutOfResources);
        }
        let ee_key = keygen.generate().map_err(cert::Error::from)?;
        let serial = self.next_serial;
        self.next_serial += 1;
        let not_before = Time::now(clock);
        let not_after = not_before.plus_days(self.validity.cert_days);
        let crl_uri = crl_uri(&self.repo_uri);
        let issuer_cert_uri = self.cert_uri();
        let signed_object_uri = self.signed_object_uri(filename);
        let issuer = IssuerContext {
            issuer_cn: &self.common_name,
            issuer_key: &self.key,
            serial,
            crl_uri: &crl_uri,
            issuer_cert_uri: &issuer_cert_uri,
            not_before,
            not_after,
            signed_object_uri: &signed_object_uri,
        };
        Ok(sigobj::assemble(content, &issuer, &ee_key)?)
    }

    /// Issues a Route Origin Attestation, publishing it under a filename
    /// derived from the EE certificate's common name.
    pub fn issue_roa(&mut self, roa: Roa, clock: &dyn Clock, keygen: &dyn KeyGen) -> Result<(), Error> {
        let cn = sigobj::subject_common_name(&roa)?;
        let filename = format!("{}.{}", cn, roa.file_extension());
        let assembled = self.issue_signed_object(&roa, &filename, clock, keygen)?;
        self.objects.push(PublishedObject { filename, der: assembled.der });
        Ok(())
    }

    /// Issues a Ghostbusters Record the same way as a ROA.
    pub fn issue_ghostbusters(&mut self, gbr: Ghostbusters, clock: &dyn Clock, keygen: &dyn KeyGen) -> Result<(), Error> {
        let cn = sigobj::subject_common_name(&gbr)?;
        let filename = format!("{}.{}", cn, gbr.file_extension());
        let assembled = self.issue_signed_object(&gbr, &filename, clock, keygen)?;
        self.objects.push(PublishedObject { filename, der: assembled.der });
        Ok(())
    }

    /// Rebuilds the CRL, pruning entries whose validity window has
    /// lapsed and recording a `Warning` for each one.
    fn reissue_crl(&mut self, clock: &dyn Clock) -> Vec<Warning> {
        let now = clock.now();
        let crl_days = self.validity.crl_days;
        let mut warnings = Vec::new();
        let (kept, pruned): (Vec<_>, Vec<_>) = self
            .revoked
            .drain(..)
            .partition(|r| r.revocation_date.inner() + chrono::Duration::days(crl_days) > now);
        self.revoked = kept;
        for entry in pruned {
            warnings.push(Warning::new(
                self.common_name.clone(),
                format!("pruned expired CRL entry for serial {}", entry.serial),
            ));
        }

        let this_update = Time::now(clock);
        let next_update = this_update.plus_days(crl_days);
        let fields = CrlFields {
            issuer_cn: &self.common_name,
            this_update,
            next_update,
            revoked: &self.revoked,
            crl_number: self.next_crl_number,
            issuer_key: &self.key,
        };
        self.next_crl_number += 1;
        // CRL construction never fails for a self-consistent CA: every
        // extension it emits is registered at process start.
        self.last_crl_der = cert::build_crl(&fields).expect("CRL construction is infallible for a registered extension set");
        warnings
    }

    /// Marks a previously-issued serial as revoked; takes effect on the
    /// next CRL reissuance during `seal`.
    pub fn revoke(&mut self, serial: u64, clock: &dyn Clock) {
        self.revoked.push(RevokedCert {
            serial,
            revocation_date: Time::now(clock),
        });
    }

    fn issue_manifest(&mut self, clock: &dyn Clock, keygen: &dyn KeyGen) -> Result<(), Error> {
        let mut entries = vec![ManifestEntry::new("revoked.crl", &self.last_crl_der)?];
        for child in &self.children {
            let filename = format!("{}.cer", child.common_name);
            entries.push(ManifestEntry::new(filename, &child.cert_der)?);
        }
        for object in &self.objects {
            entries.push(ManifestEntry::new(object.filename.clone(), &object.der)?);
        }

        let manifest = Manifest {
            manifest_number: self.next_manifest_number,
            this_update: GenTime::now(clock),
            next_update: GenTime::now(clock).plus_days(self.validity.mft_days),
            entries,
        };
        self.next_manifest_number += 1;
        let assembled = self.issue_signed_object(&manifest, "manifest.mft", clock, keygen)?;
        self.last_manifest_der = Some(assembled.der);
        Ok(())
    }

    /// Recursively finalizes this CA and every descendant: reissues the
    /// CRL (pruning expired entries), then issues a fresh manifest
    /// covering every sibling artifact. Bottom-up: children are sealed
    /// before their parent's manifest is built, since the manifest must
    /// enumerate each child's already-final `.cer`.
    pub fn seal(&mut self, clock: &dyn Clock, keygen: &dyn KeyGen) -> Result<Vec<Warning>, Error> {
        let mut warnings = Vec::new();
        for child in &mut self.children {
            warnings.extend(child.seal(clock, keygen)?);
        }
        warnings.extend(self.reissue_crl(clock));
        self.issue_manifest(clock, keygen)?;
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::resources::{Afi, IpAddr, IpPrefix, IpResources};
    use crate::signing::OpenSslKeyGen;
    use chrono::{TimeZone, Utc};

    fn validity() -> Validity {
        Validity { cert_days: 365, crl_days: 7, mft_days: 7 }
    }

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
    fn ta_then_subordinate_ca_then_roa_seal_succeeds() {
        crate::oid::register_known_types();
        let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
        let keygen = OpenSslKeyGen;
        let mut ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", whole_world(), validity(), &clock, &keygen).unwrap();

        let ca_resources = ResourceSet {
            ip: IpResources::build(vec![(Afi::V4, IpEntry::Prefix(IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8)))]).unwrap(),
            asn: Some(AsResources::Entries(vec![AsIdOrRange::Id(65000)])),
        };
        let idx = ta.issue_ca("CA", ca_resources, &clock, &keygen).unwrap();

        let roa = Roa::new(65000, vec![crate::roa::RoaNetwork::new(IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8), None).unwrap()]);
        ta.children[idx].issue_roa(roa, &clock, &keygen).unwrap();

        let warnings = ta.seal(&clock, &keygen).unwrap();
        assert!(warnings.is_empty());
        assert!(ta.last_manifest_der.is_some());
        assert_eq!(ta.children[idx].objects.len(), 1);
    }

    #[test]
    fn roa_resources_outside_ca_are_rejected() {
        crate::oid::register_known_types();
        let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
        let keygen = OpenSslKeyGen;
        let mut ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", whole_world(), validity(), &clock, &keygen).unwrap();

        let ca_resources = ResourceSet {
            ip: IpResources::build(vec![(Afi::V4, IpEntry::Prefix(IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8)))]).unwrap(),
            asn: Some(AsResources::Entries(vec![AsIdOrRange::Id(65000)])),
        };
        let idx = ta.issue_ca("CA", ca_resources, &clock, &keygen).unwrap();

        let roa = Roa::new(65000, vec![crate::roa::RoaNetwork::new(IpPrefix::new(IpAddr::V4([192, 0, 2, 0]), 24), None).unwrap()]);
        let err = ta.children[idx].issue_roa(roa, &clock, &keygen).unwrap_err();
        assert!(matches!(err, Error::OutOfResources));
    }

    #[test]
    fn crl_entries_past_their_validity_window_are_pruned_with_a_warning() {
        crate::oid::register_known_types();
        let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
        let keygen = OpenSslKeyGen;
        let mut ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", whole_world(), validity(), &clock, &keygen).unwrap();
        ta.revoked.push(RevokedCert {
            serial: 99,
            revocation_date: Time::new(Utc.ymd(2023, 1, 1).and_hms(0, 0, 0)),
        });
        let warnings = ta.reissue_crl(&clock);
        assert_eq!(warnings.len(), 1);
        assert!(ta.revoked.is_empty());
    }
}
