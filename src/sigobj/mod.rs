//! The CMS `ContentInfo(SignedData)` assembler (RFC 5652 §5, RFC 6488).
//!
//! Grounded on `examples/original_source/rpkimancer/sigobj/base.py`
//! (`SignedObject.__init__`'s field-by-field CMS dict -- followed here
//! for field order and omissions) and
//! `examples/other_examples/..._fc2afb83_zenc234-rpki-rs__src-remote-idcert.rs.rs`
//! for the overall `SignedData`/`encode::Values` call shape. The
//! `signedAttrs` double-encoding (SET tag for the to-be-signed bytes,
//! `[0] IMPLICIT` for the wire form) follows RFC 5652 §5.4 exactly,
//! since rpkimancer's own ASN.1 library hides that distinction from the
//! Python source.

pub mod content;

pub use content::SignedObjectContent;

use std::fmt;

use crate::asn1::content_registry;
use crate::asn1::encode::{self, explicit, integer_u64, octet_string, Primitive, Value};
use crate::asn1::tag::Tag;
use crate::asn1::Error as Asn1Error;
use crate::cert::{self, CertFields, Error as CertError, SubjectInfoAccess};
use crate::clock::Time;
use crate::oid;
use crate::signing::{self, Error as SigningError, KeyPair};

#[derive(Debug)]
pub enum Error {
    Cert(CertError),
    Signing(SigningError),
    Asn1(Asn1Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Cert(e) => write!(f, "{}", e),
            Error::Signing(e) => write!(f, "{}", e),
            Error::Asn1(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<CertError> for Error {
    fn from(e: CertError) -> Self {
        Error::Cert(e)
    }
}

impl From<SigningError> for Error {
    fn from(e: SigningError) -> Self {
        Error::Signing(e)
    }
}

impl From<Asn1Error> for Error {
    fn from(e: Asn1Error) -> Self {
        Error::Asn1(e)
    }
}

/// Everything the assembler needs from the issuing CA, without needing
/// to know about `ca::Ca` itself -- the assembler consumes the
/// capability set, never the concrete variant, applied here one level
/// up, to the issuer too.
pub struct IssuerContext<'a> {
    pub issuer_cn: &'a str,
    pub issuer_key: &'a KeyPair,
    pub serial: u64,
    pub crl_uri: &'a str,
    pub issuer_cert_uri: &'a str,
    pub not_before: Time,
    pub not_after: Time,
    pub signed_object_uri: &'a str,
}

/// Result of assembling one signed object: the finished `ContentInfo`
/// DER and the EE certificate's key identifier (recorded nowhere else,
/// needed only if a caller wants to cross-check SIA/AKI coherence).
pub struct Assembled {
    pub der: Vec<u8>,
    pub ee_key_id: [u8; 20],
    /// The EE certificate's common name (the lowercase hex digest of
    /// `signedAttrs`), reused by callers that derive a published
    /// object's filename from it (ROA/Ghostbusters; a Manifest keeps
    /// its fixed `manifest.mft` name instead).
    pub ee_common_name: String,
}

fn attribute(attr_type: crate::asn1::OidRef, value: &dyn Value) -> Vec<u8> {
    let values = encode::set_of(vec![value.to_vec()]);
    encode::sequence(vec![Box::new(attr_type), Box::new(values)]).to_vec()
}

/// Concatenates attribute DERs in DER `SET OF` sort order, without the
/// enclosing tag -- the shared content octets behind both the `[0]
/// IMPLICIT` wire form and the `SET` form used to compute the digest
/// and signature (RFC 5652 §5.4).
fn sorted_attrs_content(mut attrs: Vec<Vec<u8>>) -> Vec<u8> {
    attrs.sort();
    attrs.concat()
}

struct SignedAttrs {
    content_der: Vec<u8>,
    for_digest: Vec<u8>,
    field: Primitive,
    subject_cn: String,
}

/// Encodes the content, builds `signedAttrs`, and derives the EE
/// subject common name from it. Pure and
/// key-independent, so a caller can learn the eventual filename
/// (ROA/Ghostbusters are named after this CN) before committing to the
/// SIA URI it must appear in.
fn build_signed_attrs(content: &dyn SignedObjectContent) -> Result<SignedAttrs, Error> {
    let content_der = content.to_der();
    let message_digest = signing::sha256(&content_der)?;

    let content_type_attr = attribute(content.content_type(), &content.content_type());
    let message_digest_attr = attribute(oid::AT_MESSAGE_DIGEST, &octet_string(message_digest.to_vec()));
    let attrs_content = sorted_attrs_content(vec![content_type_attr, message_digest_attr]);
    let for_digest = Primitive::new(Tag::SET, attrs_content.clone()).to_vec();
    let field = Primitive::new(Tag::ctx_constructed(0), attrs_content);
    let subject_cn = hex::encode(signing::sha256(&for_digest)?);

    Ok(SignedAttrs { content_der, for_digest, field, subject_cn })
}

/// Computes the EE common name a signed object built from `content`
/// would get (the lowercase hex of `SHA256(signedAttrs)`),
/// without generating a key or issuing anything. Used to compute a
/// ROA/Ghostbusters object's destination filename ahead of calling
/// [`assemble`], which needs that filename as the EE's SIA URI.
pub fn subject_common_name(content: &dyn SignedObjectContent) -> Result<String, Error> {
    Ok(build_signed_attrs(content)?.subject_cn)
}

/// Builds, signs and DER-encodes the CMS wrapper around `content`,
/// issuing a fresh one-shot EE certificate along the way (RFC 5652 §5.4).
pub fn assemble(
    content: &dyn SignedObjectContent,
    issuer: &IssuerContext,
    ee_key: &KeyPair,
) -> Result<Assembled, Error> {
    let content_type_oid = content.content_type().to_oid();
    if !content_registry::is_registered_content_type(&content_type_oid) {
        return Err(Asn1Error::UnknownContentType(content_type_oid.to_string()).into());
    }

    let SignedAttrs { content_der, for_digest: signed_attrs_for_digest, field: signed_attrs_field, subject_cn } =
        build_signed_attrs(content)?;

    // Step 4: issue the EE certificate.
    let resources = content.required_resources();
    let fields = CertFields {
        serial: issuer.serial,
        issuer_cn: issuer.issuer_cn,
        subject_cn: &subject_cn,
        not_before: issuer.not_before,
        not_after: issuer.not_after,
        subject_key: ee_key,
        issuer_key: Some(issuer.issuer_key),
        is_ca: false,
        resources: &resources,
        sia: SubjectInfoAccess::Ee {
            signed_object: issuer.signed_object_uri,
        },
        aia_crldp: Some((issuer.crl_uri, issuer.issuer_cert_uri)),
    };
    let ee_cert_der = cert::build_certificate(&fields, issuer.issuer_key)?;

    // Step 5: signature over signedAttrs under the EE private key.
    let signature_value = ee_key.sign(&signed_attrs_for_digest)?;

    // Step 6-7: assemble SignedData and wrap as ContentInfo.
    let digest_algorithms = encode::set_of(vec![cert::algorithm_identifier(oid::SHA256).to_vec()]);
    let encap_content_info = encode::sequence(vec![
        Box::new(content.content_type()),
        Box::new(explicit(0, octet_string(content_der))),
    ]);
    let certificates = Primitive::new(Tag::ctx_constructed(0), ee_cert_der);
    let signer_info = encode::sequence(vec![
        Box::new(integer_u64(3)),
        Box::new(Primitive::new(Tag::ctx(0), ee_key.key_identifier().to_vec())),
        Box::new(cert::algorithm_identifier(oid::SHA256)),
        Box::new(signed_attrs_field),
        Box::new(cert::algorithm_identifier(oid::RSA_ENCRYPTION)),
        Box::new(octet_string(signature_value)),
    ]);
    let signer_infos = encode::set_of(vec![signer_info.to_vec()]);

    let signed_data = encode::sequence(vec![
        Box::new(integer_u64(3)),
        Box::new(digest_algorithms),
        Box::new(encap_content_info),
        Box::new(certificates),
        Box::new(signer_infos),
    ]);

    let content_info = encode::sequence(vec![
        Box::new(oid::ID_SIGNED_DATA),
        Box::new(explicit(0, signed_data)),
    ]);

    Ok(Assembled {
        der: content_info.to_vec(),
        ee_key_id: ee_key.key_identifier(),
        ee_common_name: subject_cn,
    })
}
