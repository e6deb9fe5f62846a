//! The `EncapsulatedContentInfo` content-type registry.
//!
//! RFC 6488 models the CMS `eContentType`/`eContent` pair as an open type:
//! any OID may appear there, and what the octets mean is defined
//! elsewhere. A validator (or, here, a builder) that wants to know "is
//! this OID one I understand" consults a registry rather than hardcoding
//! a fixed `match`. We follow krill's habit of keeping such process-wide
//! tables behind `lazy_static` + a lock (see e.g. its key store statics).

use std::collections::HashMap;
use std::sync::RwLock;

use lazy_static::lazy_static;

use super::Oid;

/// What a registered content type tells callers about itself. We don't
/// need a decode dispatcher (each `SignedObjectContent` impl parses its
/// own `eContent`), just membership plus a human-readable name for
/// logging and error messages.
#[derive(Clone, Debug)]
pub struct ContentTypeInfo {
    pub name: &'static str,
}

lazy_static! {
    static ref CONTENT_TYPES: RwLock<HashMap<Oid, ContentTypeInfo>> = RwLock::new(HashMap::new());
}

/// Registers a content type OID. Called once per type at process start
/// (see `crate::oid::register_known_content_types`); re-registering the
/// same OID overwrites the previous entry.
pub fn register_content_type(oid: Oid, name: &'static str) {
    CONTENT_TYPES
        .write()
        .expect("content type registry lock poisoned")
        .insert(oid, ContentTypeInfo { name });
}

pub fn lookup_content_type(oid: &Oid) -> Option<ContentTypeInfo> {
    CONTENT_TYPES
        .read()
        .expect("content type registry lock poisoned")
        .get(oid)
        .cloned()
}

pub fn is_registered_content_type(oid: &Oid) -> bool {
    CONTENT_TYPES
        .read()
        .expect("content type registry lock poisoned")
        .contains_key(oid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup() {
        let oid = Oid(vec![0x2a, 0x03]);
        register_content_type(oid.clone(), "test-content-type");
        assert!(is_registered_content_type(&oid));
        assert_eq!(lookup_content_type(&oid).unwrap().name, "test-content-type");
    }

    #[test]
    fn unregistered_oid_is_absent() {
        let oid = Oid(vec![0x2a, 0x99, 0x01]);
        assert!(!is_registered_content_type(&oid));
    }
}
