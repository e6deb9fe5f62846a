//! `CertificateList` (X.509 v2 CRL) assembly.
//!
//! Field order follows RFC 5280 §5.1: version, signature, issuer,
//! thisUpdate, nextUpdate, revokedCertificates, crlExtensions. Grounded
//! on the `mkrpki` `Crl` subcommand (`TbsCertList::new(signature, issuer,
//! this_update, next_update, revoked_certs, aki, crl_number)`) for the
//! field list and on `tbscert.rs` for how we capture the TBS bytes to
//! sign.

use crate::asn1::encode::{self, explicit, integer_u64, octet_string, Captured, Constructed, Value};
use crate::asn1::ext_registry::check_criticality;
use crate::asn1::tag::Tag;
use crate::clock::Time;
use crate::oid;
use crate::signing::KeyPair;

use super::{name, signature_algorithm, Error};

/// One entry in `revokedCertificates`: a serial number and the instant
/// it was revoked.
#[derive(Clone, Copy, Debug)]
pub struct RevokedCert {
    pub serial: u64,
    pub revocation_date: Time,
}

impl RevokedCert {
    fn encode(self) -> Constructed {
        encode::sequence(vec![
            Box::new(integer_u64(self.serial)),
            Box::new(self.revocation_date.encode()),
        ])
    }
}

pub struct CrlFields<'a> {
    pub issuer_cn: &'a str,
    pub this_update: Time,
    pub next_update: Time,
    pub revoked: &'a [RevokedCert],
    pub crl_number: u64,
    pub issuer_key: &'a KeyPair,
}

fn crl_number_extension(n: u64) -> Result<(crate::asn1::Oid, bool, encode::Primitive), Error> {
    let oid = oid::CE_CRL_NUMBER.to_oid();
    check_criticality(&oid, false).map_err(Error::Extension)?;
    Ok((oid, false, integer_u64(n)))
}

fn build_tbs_cert_list(fields: &CrlFields) -> Result<Constructed, Error> {
    let version: Box<dyn Value> = Box::new(integer_u64(1)); // v2
    let signature: Box<dyn Value> = Box::new(signature_algorithm());
    let issuer: Box<dyn Value> = Box::new(name(fields.issuer_cn));
    let this_update: Box<dyn Value> = Box::new(fields.this_update.encode());
    let next_update: Box<dyn Value> = Box::new(fields.next_update.encode());

    // RFC 5280 §5.1.2.6: `revokedCertificates` is OPTIONAL and MUST be
    // absent -- not an empty SEQUENCE -- when there are no entries.
    let revoked: Box<dyn Value> = if fields.revoked.is_empty() {
        Box::new(encode::Captured(Vec::new()))
    } else {
        let entries: Vec<Box<dyn Value>> = fields
            .revoked
            .iter()
            .map(|r| Box::new(r.encode()) as Box<dyn Value>)
            .collect();
        Box::new(encode::sequence(entries))
    };

    let aki_oid = oid::CE_AUTHORITY_KEY_IDENTIFIER;
    check_criticality(&aki_oid.to_oid(), false).map_err(Error::Extension)?;
    let aki_content = encode::sequence(vec![Box::new(encode::Primitive::new(
        Tag::ctx(0),
        fields.issuer_key.key_identifier().to_vec(),
    ))]);
    let aki_ext = encode::sequence(vec![
        Box::new(aki_oid),
        Box::new(octet_string(aki_content.to_vec())),
    ]);

    let (crl_number_oid, _critical, crl_number_value) = crl_number_extension(fields.crl_number)?;
    let crl_number_ext = encode::sequence(vec![
        Box::new(crl_number_oid),
        Box::new(octet_string(crl_number_value.to_vec())),
    ]);

    let crl_extensions: Box<dyn Value> = Box::new(explicit(
        0,
        encode::sequence(vec![Box::new(aki_ext), Box::new(crl_number_ext)]),
    ));

    Ok(encode::sequence(vec![
        version,
        signature,
        issuer,
        this_update,
        next_update,
        revoked,
        crl_extensions,
    ]))
}

/// Builds, signs and encodes one `CertificateList`.
pub fn build_crl(fields: &CrlFields) -> Result<Vec<u8>, Error> {
    let tbs = build_tbs_cert_list(fields)?;
    let tbs_der = tbs.to_vec();
    let signature_value = fields.issuer_key.sign(&tbs_der)?;

    let crl = encode::sequence(vec![
        Box::new(Captured(tbs_der)),
        Box::new(signature_algorithm()),
        Box::new(encode::bit_string(0, &signature_value)),
    ]);
    Ok(crl.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::OpenSslKeyGen;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_crl_encodes_with_no_revoked_entries() {
        let key = OpenSslKeyGen.generate().unwrap();
        crate::oid::register_known_types();
        let fields = CrlFields {
            issuer_cn: "TA",
            this_update: Time::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0)),
            next_update: Time::new(Utc.ymd(2024, 1, 8).and_hms(0, 0, 0)),
            revoked: &[],
            crl_number: 0,
            issuer_key: &key,
        };
        let der = build_crl(&fields).unwrap();
        assert_eq!(der[0], Tag::SEQUENCE.0);
    }

    #[test]
    fn empty_crl_omits_revoked_certificates_field_entirely() {
        // RFC 5280 §5.1.2.6: an empty `revokedCertificates` is OPTIONAL
        // and absent, not an empty `SEQUENCE OF` (tag 0x30 len 0x00).
        let key = OpenSslKeyGen.generate().unwrap();
        crate::oid::register_known_types();
        let fields = CrlFields {
            issuer_cn: "TA",
            this_update: Time::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0)),
            next_update: Time::new(Utc.ymd(2024, 1, 8).and_hms(0, 0, 0)),
            revoked: &[],
            crl_number: 0,
            issuer_key: &key,
        };
        let tbs = build_tbs_cert_list(&fields).unwrap().to_vec();
        assert!(!tbs.windows(2).any(|w| w == [0x30, 0x00]));
    }

    #[test]
    fn revoked_entry_round_trips_serial() {
        let key = OpenSslKeyGen.generate().unwrap();
        crate::oid::register_known_types();
        let revoked = vec![RevokedCert {
            serial: 7,
            revocation_date: Time::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0)),
        }];
        let fields = CrlFields {
            issuer_cn: "TA",
            this_update: Time::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0)),
            next_update: Time::new(Utc.ymd(2024, 1, 8).and_hms(0, 0, 0)),
            revoked: &revoked,
            crl_number: 1,
            issuer_key: &key,
        };
        let der = build_crl(&fields).unwrap();
        assert!(!der.is_empty());
    }
}
