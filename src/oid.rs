//! Object identifiers used throughout the core.
//!
//! RPKI reuses a small, fixed set of OIDs from PKIX, CMS and the RPKI
//! extensions themselves. We hard-code their DER content octets rather
//! than building them from arc lists at runtime -- they never change and
//! the byte form is what actually ends up on the wire.

use crate::asn1::content_registry::register_content_type;
use crate::asn1::ext_registry::register_extension;
use crate::asn1::OidRef;

/// Declares a `'static` OID constant from its DER content octets.
macro_rules! oid {
    ($name:ident, $bytes:expr) => {
        pub const $name: OidRef = OidRef($bytes);
    };
}

// --- algorithms (RFC 7935) ---------------------------------------------

oid!(SHA256, &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01]);
oid!(RSA_ENCRYPTION, &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01]);
oid!(
    SHA256_WITH_RSA_ENCRYPTION,
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b]
);

// --- naming ---------------------------------------------------------------

oid!(COMMON_NAME, &[0x55, 0x04, 0x03]);

// --- X.509 extensions (RFC 5280 / RFC 6487) -------------------------------

oid!(CE_BASIC_CONSTRAINTS, &[0x55, 0x1d, 0x13]);
oid!(CE_SUBJECT_KEY_IDENTIFIER, &[0x55, 0x1d, 0x0e]);
oid!(CE_AUTHORITY_KEY_IDENTIFIER, &[0x55, 0x1d, 0x23]);
oid!(CE_KEY_USAGE, &[0x55, 0x1d, 0x0f]);
oid!(CE_CRL_DISTRIBUTION_POINTS, &[0x55, 0x1d, 0x1f]);
oid!(CE_CERTIFICATE_POLICIES, &[0x55, 0x1d, 0x20]);
/// CRL entry extension, used on the `TBSCertList` itself (RFC 5280 §5.2.3).
oid!(CE_CRL_NUMBER, &[0x55, 0x1d, 0x14]);
oid!(
    PE_AUTHORITY_INFO_ACCESS,
    &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x01]
);
oid!(
    PE_SUBJECT_INFO_ACCESS,
    &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x0b]
);
oid!(
    PE_IP_ADDR_BLOCKS,
    &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x07]
);
oid!(
    PE_AUTONOMOUS_SYS_IDS,
    &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x01, 0x08]
);

/// The single RPKI certificate policy, id-cp-ipAddr-asNumber.
oid!(
    RPKI_CERT_POLICY,
    &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x0e, 0x02]
);

// --- SIA/AIA access method OIDs -------------------------------------------

oid!(AD_CA_ISSUERS, &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x02]);
oid!(AD_CA_REPOSITORY, &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x05]);
oid!(AD_RPKI_MANIFEST, &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x0a]);
oid!(AD_SIGNED_OBJECT, &[0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x0b]);

// --- CMS (RFC 5652 / RFC 6488) ---------------------------------------------

oid!(ID_SIGNED_DATA, &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02]);
oid!(
    AT_CONTENT_TYPE,
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x03]
);
oid!(
    AT_MESSAGE_DIGEST,
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x04]
);

// --- RPKI signed object content types (RFC 6482/6486/6493) -----------------

oid!(
    CT_ROUTE_ORIGIN_AUTHZ,
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x10, 0x01, 0x18]
);
oid!(
    CT_RPKI_MANIFEST,
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x10, 0x01, 0x1a]
);
oid!(
    CT_RPKI_GHOSTBUSTERS,
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x10, 0x01, 0x23]
);

/// Placeholder used only to demonstrate `register_content_type` (see
/// `asn1::content_registry`); never produced by this crate.
oid!(
    CT_SIGNED_CHECKLIST_DEMO,
    &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x10, 0x01, 0x3e]
);

/// Populates the content-type and extension registries with everything
/// this crate knows about. Called once from `crate::init` (see
/// `lib.rs`); idempotent, since re-registering an OID just overwrites
/// its entry.
pub fn register_known_types() {
    register_content_type(CT_ROUTE_ORIGIN_AUTHZ.to_oid(), "routeOriginAuthz");
    register_content_type(CT_RPKI_MANIFEST.to_oid(), "rpkiManifest");
    register_content_type(CT_RPKI_GHOSTBUSTERS.to_oid(), "rpkiGhostbusters");
    register_content_type(CT_SIGNED_CHECKLIST_DEMO.to_oid(), "signedChecklist (demo, unused)");

    register_extension(CE_BASIC_CONSTRAINTS.to_oid(), "basicConstraints", true);
    register_extension(CE_SUBJECT_KEY_IDENTIFIER.to_oid(), "subjectKeyIdentifier", false);
    register_extension(CE_AUTHORITY_KEY_IDENTIFIER.to_oid(), "authorityKeyIdentifier", false);
    register_extension(CE_KEY_USAGE.to_oid(), "keyUsage", true);
    register_extension(CE_CRL_DISTRIBUTION_POINTS.to_oid(), "cRLDistributionPoints", false);
    register_extension(CE_CERTIFICATE_POLICIES.to_oid(), "certificatePolicies", true);
    register_extension(CE_CRL_NUMBER.to_oid(), "cRLNumber", false);
    register_extension(PE_AUTHORITY_INFO_ACCESS.to_oid(), "authorityInfoAccess", false);
    register_extension(PE_SUBJECT_INFO_ACCESS.to_oid(), "subjectInfoAccess", false);
    register_extension(PE_IP_ADDR_BLOCKS.to_oid(), "ipAddrBlocks", true);
    register_extension(PE_AUTONOMOUS_SYS_IDS.to_oid(), "autonomousSysIds", true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_idempotent() {
        register_known_types();
        register_known_types();
        assert!(crate::asn1::content_registry::is_registered_content_type(
            &CT_ROUTE_ORIGIN_AUTHZ.to_oid()
        ));
    }
}
