//! `TBSCertificate`/`Certificate` assembly.
//!
//! The field order here is the real RFC 5280 §4.1 wire order
//! (version, serialNumber, signature, issuer, validity, subject, SPKI,
//! extensions) -- a validator parses the DER structure, not the order
//! a builder happened to assemble fields in (see DESIGN.md, Open
//! Questions).

use crate::asn1::encode::{self, explicit, integer_u64, Captured, Constructed, Value};
use crate::clock::Time;
use crate::resources::ResourceSet;
use crate::signing::KeyPair;

use super::extensions::{self, Extensions};
use super::{algorithm_identifier, name, signature_algorithm, Error};

/// Everything the builder needs to know about one certificate, whether
/// it's a self-signed TA cert, a subordinate CA cert, or an EE cert.
pub struct CertFields<'a> {
    pub serial: u64,
    pub issuer_cn: &'a str,
    pub subject_cn: &'a str,
    pub not_before: Time,
    pub not_after: Time,
    pub subject_key: &'a KeyPair,
    /// `None` for a self-signed TA certificate (RFC 6487 §4.8.3:
    /// AKI MUST be omitted when it would equal the SKI).
    pub issuer_key: Option<&'a KeyPair>,
    pub is_ca: bool,
    pub resources: &'a ResourceSet,
    /// `caRepository`/`rpkiManifest` publication point URIs for a CA
    /// cert, or the `signedObject` URI for an EE cert.
    pub sia: SubjectInfoAccess<'a>,
    /// Absent only for the TA certificate: a self-signed certificate has
    /// no issuer to point CRLDP/AIA at.
    pub aia_crldp: Option<(&'a str, &'a str)>,
}

pub enum SubjectInfoAccess<'a> {
    Ca { repository: &'a str, manifest: &'a str },
    Ee { signed_object: &'a str },
}

fn build_extensions(fields: &CertFields) -> Result<Extensions, Error> {
    let mut exts = Vec::new();
    if fields.is_ca {
        exts.push(extensions::basic_constraints_ca()?);
    }
    exts.push(extensions::subject_key_identifier(
        &fields.subject_key.key_identifier(),
    )?);
    if let Some(issuer_key) = fields.issuer_key {
        exts.push(extensions::authority_key_identifier(
            &issuer_key.key_identifier(),
        )?);
    }
    exts.push(if fields.is_ca {
        extensions::key_usage_ca()?
    } else {
        extensions::key_usage_ee()?
    });
    if let Some((crl_uri, ca_issuer_uri)) = fields.aia_crldp {
        exts.push(extensions::crl_distribution_points(crl_uri)?);
        exts.push(extensions::authority_info_access(ca_issuer_uri)?);
    }
    match &fields.sia {
        SubjectInfoAccess::Ca { repository, manifest } => {
            exts.push(extensions::subject_info_access_ca(repository, manifest)?);
        }
        SubjectInfoAccess::Ee { signed_object } => {
            exts.push(extensions::subject_info_access_ee(signed_object)?);
        }
    }
    exts.push(extensions::certificate_policies()?);
    if !fields.resources.ip.is_empty() {
        exts.push(extensions::ip_resources(&fields.resources.ip)?);
    }
    if let Some(asn) = &fields.resources.asn {
        exts.push(extensions::as_resources(asn)?);
    }
    Ok(Extensions(exts))
}

fn build_tbs_certificate(fields: &CertFields) -> Result<Constructed, Error> {
    let version: Box<dyn Value> = Box::new(explicit(0, integer_u64(2))); // v3
    let serial_number: Box<dyn Value> = Box::new(integer_u64(fields.serial));
    let signature: Box<dyn Value> = Box::new(signature_algorithm());
    let issuer: Box<dyn Value> = Box::new(name(fields.issuer_cn));
    let validity: Box<dyn Value> = Box::new(encode::sequence(vec![
        Box::new(fields.not_before.encode()),
        Box::new(fields.not_after.encode()),
    ]));
    let subject: Box<dyn Value> = Box::new(name(fields.subject_cn));
    let subject_public_key_info: Box<dyn Value> = Box::new(Captured(
        fields.subject_key.subject_public_key_info_der().to_vec(),
    ));
    let extensions: Box<dyn Value> = Box::new(build_extensions(fields)?.encode());

    Ok(encode::sequence(vec![
        version,
        serial_number,
        signature,
        issuer,
        validity,
        subject,
        subject_public_key_info,
        extensions,
    ]))
}

/// Builds, signs and encodes one `Certificate`. `signer` is the issuer's
/// key pair (the subject's own key pair for a self-signed TA
/// certificate).
pub fn build_certificate(fields: &CertFields, signer: &KeyPair) -> Result<Vec<u8>, Error> {
    let tbs = build_tbs_certificate(fields)?;
    let tbs_der = tbs.to_vec();
    let signature_value = signer.sign(&tbs_der)?;

    let cert = encode::sequence(vec![
        Box::new(Captured(tbs_der)),
        Box::new(signature_algorithm()),
        Box::new(encode::bit_string(0, &signature_value)),
    ]);
    Ok(cert.to_vec())
}
