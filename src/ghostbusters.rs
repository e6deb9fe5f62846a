//! Ghostbusters Record `eContent` (RFC 6493).
//!
//! The payload is a vCard 4.0 text body, CRLF-terminated, with `FN`
//! required and `ORG`/`ADR`/`TEL`/`EMAIL` optional. Grounded on
//! `examples/original_source/rpkimancer/sigobj/gbr.py` for the field
//! order and the `TEL;VALUE=uri:tel:…` parameter shape.

use crate::asn1::OidRef;
use crate::oid;
use crate::resources::{AsResources, IpEntry, IpResources, ResourceSet};
use crate::sigobj::SignedObjectContent;

/// Contact fields for one Ghostbusters Record. `full_name` is the only
/// required field (RFC 6493's `FN` property).
pub struct Ghostbusters {
    pub full_name: String,
    pub org: Option<String>,
    pub address: Option<String>,
    pub tel: Option<String>,
    pub email: Option<String>,
}

impl Ghostbusters {
    pub fn new(full_name: impl Into<String>) -> Self {
        Ghostbusters {
            full_name: full_name.into(),
            org: None,
            address: None,
            tel: None,
            email: None,
        }
    }

    fn vcard(&self) -> String {
        let mut lines = vec!["BEGIN:VCARD".to_string(), "VERSION:4.0".to_string()];
        lines.push(format!("FN:{}", self.full_name));
        if let Some(org) = &self.org {
            lines.push(format!("ORG:{}", org));
        }
        if let Some(address) = &self.address {
            lines.push(format!("ADR:{}", address));
        }
        if let Some(tel) = &self.tel {
            lines.push(format!("TEL;VALUE=uri:tel:{}", tel));
        }
        if let Some(email) = &self.email {
            lines.push(format!("EMAIL:{}", email));
        }
        lines.push("END:VCARD".to_string());
        lines.join("\r\n")
    }
}

impl SignedObjectContent for Ghostbusters {
    fn content_type(&self) -> OidRef {
        oid::CT_RPKI_GHOSTBUSTERS
    }

    fn to_der(&self) -> Vec<u8> {
        // eContent for a Ghostbusters Record is the raw vCard bytes
        // themselves, not wrapped in any further ASN.1 structure --
        // the OCTET STRING wrapping happens one level up, in
        // `sigobj::assemble`'s `encapContentInfo`.
        self.vcard().into_bytes()
    }

    fn required_resources(&self) -> ResourceSet {
        ResourceSet {
            ip: IpResources::build(vec![
                (crate::resources::Afi::V4, IpEntry::Inherit),
                (crate::resources::Afi::V6, IpEntry::Inherit),
            ])
            .expect("a pair of lone inherit markers never mixes with explicit entries"),
            asn: Some(AsResources::Inherit),
        }
    }

    fn file_extension(&self) -> &'static str {
        "gbr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_record_emits_fn_only() {
        let gbr = Ghostbusters::new("Jane Doe");
        let der = gbr.to_der();
        let body = String::from_utf8(der).unwrap();
        assert_eq!(body, "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Jane Doe\r\nEND:VCARD");
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let gbr = Ghostbusters::new("Jane Doe");
        let body = gbr.vcard();
        assert!(!body.contains("ORG:"));
        assert!(!body.contains("TEL;"));
    }

    #[test]
    fn tel_field_carries_the_uri_tel_parameter() {
        let mut gbr = Ghostbusters::new("Jane Doe");
        gbr.tel = Some("+1-555-0100".to_string());
        let body = gbr.vcard();
        assert!(body.contains("TEL;VALUE=uri:tel:+1-555-0100"));
    }

    #[test]
    fn required_resources_are_both_inherit() {
        let gbr = Ghostbusters::new("Jane Doe");
        let resources = gbr.required_resources();
        assert!(matches!(resources.asn, Some(AsResources::Inherit)));
    }
}
