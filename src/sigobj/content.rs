//! The `SignedObjectContent` capability set.
//!
//! Every concrete `eContent` payload (ROA, Manifest, Ghostbusters Record)
//! implements this instead of the assembler matching on a variant type,
//! so a fourth content type (e.g. a Signed Checklist) plugs in without
//! touching `sigobj::assemble`.

use crate::asn1::OidRef;
use crate::resources::ResourceSet;

pub trait SignedObjectContent {
    /// The `eContentType` OID (also the `contentType` signed attribute).
    fn content_type(&self) -> OidRef;

    /// DER encoding of the `eContent` payload.
    fn to_der(&self) -> Vec<u8>;

    /// The resources the EE certificate binding this content must carry:
    /// `AS_inherit`/`IP_inherit` for Manifests and Ghostbusters Records,
    /// explicit IP resources for a ROA.
    fn required_resources(&self) -> ResourceSet;

    /// File extension used for the published object's filename
    /// (`roa`, `mft`, `gbr`).
    fn file_extension(&self) -> &'static str;
}
