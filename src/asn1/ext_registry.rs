//! The certificate-extension registry.
//!
//! X.509 extensions are RFC 5280's own open type: `Extension` carries an
//! `extnID`, a `critical` flag, and an `extnValue` OCTET STRING whose
//! content is defined per-OID. We register the fixed extension set RFC
//! 6487 §4.8 mandates so the certificate builder can
//! assert it only ever writes extensions it knows about, and so it knows
//! each extension's mandated criticality without a hardcoded `match` at
//! the call site.

use std::collections::HashMap;
use std::sync::RwLock;

use lazy_static::lazy_static;

use super::Oid;

#[derive(Clone, Copy, Debug)]
pub struct ExtensionInfo {
    pub name: &'static str,
    pub critical: bool,
}

lazy_static! {
    static ref EXTENSIONS: RwLock<HashMap<Oid, ExtensionInfo>> = RwLock::new(HashMap::new());
}

pub fn register_extension(oid: Oid, name: &'static str, critical: bool) {
    EXTENSIONS
        .write()
        .expect("extension registry lock poisoned")
        .insert(oid, ExtensionInfo { name, critical });
}

pub fn lookup_extension(oid: &Oid) -> Option<ExtensionInfo> {
    EXTENSIONS
        .read()
        .expect("extension registry lock poisoned")
        .get(oid)
        .copied()
}

/// Asserts `critical` matches what the registry mandates for `oid`.
/// Returns `Err` with a description on mismatch or if `oid` is
/// unregistered; the certificate builder treats either as a bug.
pub fn check_criticality(oid: &Oid, critical: bool) -> Result<(), String> {
    match lookup_extension(oid) {
        Some(info) if info.critical == critical => Ok(()),
        Some(info) => Err(format!(
            "extension {} ({}) must be {}critical",
            oid,
            info.name,
            if info.critical { "" } else { "non-" }
        )),
        None => Err(format!("extension {} is not registered", oid)),
    }
}
