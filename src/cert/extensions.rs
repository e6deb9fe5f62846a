//! The fixed X.509 extension set for RPKI resource certificates (RFC
//! 6487 §4.8).
//!
//! Grounded on the prototest `cacert.rs` example for the exact nested
//! tag shapes (`[0] EXPLICIT` wrapping `[0] IMPLICIT GeneralNames` for
//! CRLDP, `[0] IMPLICIT KeyIdentifier` for AKI) and on
//! `examples/original_source/rpkimancer/cert/base.py` for which
//! extensions are present/critical/omitted and in what order.

use crate::asn1::encode::{self, boolean, explicit, octet_string, Constructed, Value};
use crate::asn1::ext_registry::check_criticality;
use crate::asn1::tag::Tag;
use crate::asn1::OidRef;
use crate::oid;
use crate::resources::{AsResources, IpResources};

use super::Error;

/// One `Extension { extnID, critical, extnValue }`, kept unencoded until
/// [`Extensions::encode`] so the full set can be validated together.
pub struct Extension {
    oid: OidRef,
    critical: bool,
    value: Vec<u8>,
}

impl Extension {
    fn new(oid: OidRef, critical: bool, value: impl Value) -> Result<Self, Error> {
        check_criticality(&oid.to_oid(), critical).map_err(Error::Extension)?;
        Ok(Extension {
            oid,
            critical,
            value: value.to_vec(),
        })
    }

    fn encode(&self) -> Constructed {
        let mut fields: Vec<Box<dyn Value>> = vec![Box::new(self.oid)];
        if self.critical {
            fields.push(Box::new(boolean(true)));
        }
        fields.push(Box::new(octet_string(self.value.clone())));
        encode::sequence(fields)
    }
}

/// `extensions [3] EXPLICIT Extensions OPTIONAL`, `Extensions ::=
/// SEQUENCE OF Extension`.
pub struct Extensions(pub Vec<Extension>);

impl Extensions {
    pub fn encode(&self) -> Constructed {
        let items: Vec<Box<dyn Value>> = self.0.iter().map(|e| Box::new(e.encode()) as Box<dyn Value>).collect();
        explicit(3, encode::sequence(items))
    }
}

pub fn basic_constraints_ca() -> Result<Extension, Error> {
    let content = encode::sequence(vec![Box::new(boolean(true))]);
    Extension::new(oid::CE_BASIC_CONSTRAINTS, true, content)
}

pub fn subject_key_identifier(key_id: &[u8]) -> Result<Extension, Error> {
    Extension::new(
        oid::CE_SUBJECT_KEY_IDENTIFIER,
        false,
        octet_string(key_id.to_vec()),
    )
}

/// `AuthorityKeyIdentifier ::= SEQUENCE { keyIdentifier [0] IMPLICIT
/// KeyIdentifier OPTIONAL, ... }`; only the `keyIdentifier` field is
/// ever populated here.
pub fn authority_key_identifier(issuer_key_id: &[u8]) -> Result<Extension, Error> {
    let key_id_field = encode::Primitive::new(Tag::ctx(0), issuer_key_id.to_vec());
    let content = encode::sequence(vec![Box::new(key_id_field)]);
    Extension::new(oid::CE_AUTHORITY_KEY_IDENTIFIER, false, content)
}

/// `KeyUsage ::= BIT STRING`, minimally trimmed, bit 0 = most
/// significant bit of the first octet (X.509 §4.2.1.3).
fn key_usage_bit_string(bit_numbers: &[u8]) -> encode::Primitive {
    let max_bit = *bit_numbers.iter().max().expect("at least one bit");
    let total_bits = max_bit as usize + 1;
    let nbytes = (total_bits + 7) / 8;
    let mut bytes = vec![0u8; nbytes];
    for &bit in bit_numbers {
        bytes[bit as usize / 8] |= 0x80u8 >> (bit % 8);
    }
    let unused = (nbytes * 8 - total_bits) as u8;
    encode::bit_string(unused, &bytes)
}

/// `keyCertSign | cRLSign`, for CA certificates.
pub fn key_usage_ca() -> Result<Extension, Error> {
    Extension::new(oid::CE_KEY_USAGE, true, key_usage_bit_string(&[5, 6]))
}

/// `digitalSignature`, for EE certificates.
pub fn key_usage_ee() -> Result<Extension, Error> {
    Extension::new(oid::CE_KEY_USAGE, true, key_usage_bit_string(&[0]))
}

/// `[6] IA5String` inside a `GeneralName` CHOICE: implicit tagging
/// applies directly since `IA5String` is a primitive type, not a CHOICE.
fn general_name_uri(uri: &str) -> encode::Primitive {
    encode::Primitive::new(Tag::ctx(6), uri.as_bytes().to_vec())
}

fn access_description(method: OidRef, uri: &str) -> Constructed {
    encode::sequence(vec![Box::new(method), Box::new(general_name_uri(uri))])
}

pub fn crl_distribution_points(crl_uri: &str) -> Result<Extension, Error> {
    // DistributionPoint { distributionPoint [0] EXPLICIT { fullName [0]
    // IMPLICIT GeneralNames } }. Two nested context-0 constructed tags:
    // the outer is EXPLICIT because DistributionPointName is a CHOICE,
    // the inner is IMPLICIT because GeneralNames is a plain SEQUENCE OF.
    let general_names = Constructed::new(
        Tag::ctx_constructed(0),
        &[&general_name_uri(crl_uri) as &dyn Value],
    );
    let distribution_point_name = explicit(0, general_names);
    let distribution_point = encode::sequence(vec![Box::new(distribution_point_name)]);
    let content = encode::sequence(vec![Box::new(distribution_point)]);
    Extension::new(oid::CE_CRL_DISTRIBUTION_POINTS, false, content)
}

pub fn authority_info_access(ca_issuer_cert_uri: &str) -> Result<Extension, Error> {
    let content = encode::sequence(vec![Box::new(access_description(
        oid::AD_CA_ISSUERS,
        ca_issuer_cert_uri,
    ))]);
    Extension::new(oid::PE_AUTHORITY_INFO_ACCESS, false, content)
}

pub fn subject_info_access_ca(ca_repository_uri: &str, manifest_uri: &str) -> Result<Extension, Error> {
    let content = encode::sequence(vec![
        Box::new(access_description(oid::AD_CA_REPOSITORY, ca_repository_uri)),
        Box::new(access_description(oid::AD_RPKI_MANIFEST, manifest_uri)),
    ]);
    Extension::new(oid::PE_SUBJECT_INFO_ACCESS, false, content)
}

pub fn subject_info_access_ee(signed_object_uri: &str) -> Result<Extension, Error> {
    let content = encode::sequence(vec![Box::new(access_description(
        oid::AD_SIGNED_OBJECT,
        signed_object_uri,
    ))]);
    Extension::new(oid::PE_SUBJECT_INFO_ACCESS, false, content)
}

/// The single RPKI certificate policy, `id-cp-ipAddr-asNumber`, no
/// qualifiers.
pub fn certificate_policies() -> Result<Extension, Error> {
    let policy_information = encode::sequence(vec![Box::new(oid::RPKI_CERT_POLICY)]);
    let content = encode::sequence(vec![Box::new(policy_information)]);
    Extension::new(oid::CE_CERTIFICATE_POLICIES, true, content)
}

pub fn ip_resources(ip: &IpResources) -> Result<Extension, Error> {
    let content = ip.encode()?;
    Extension::new(oid::PE_IP_ADDR_BLOCKS, true, content)
}

pub fn as_resources(asn: &AsResources) -> Result<Extension, Error> {
    Extension::new(oid::PE_AUTONOMOUS_SYS_IDS, true, asn.encode())
}
