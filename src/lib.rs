//! Synthesizes validator-ready RPKI publication points: a Trust Anchor,
//! a tree of subordinate CAs, their CRLs and manifests, and the ROA/
//! Ghostbusters Record EE objects they publish, plus a Trust Anchor
//! Locator for the root.
//!
//! The module layout mirrors the component design: [`asn1`] is the DER
//! codec, [`resources`] models RFC 3779 resource sets, [`cert`] builds
//! certificates and CRLs, [`sigobj`] assembles CMS-signed objects,
//! [`roa`]/[`manifest`]/[`ghostbusters`] are the three concrete signed
//! payload types, [`ca`] is the issuer state machine, and
//! [`publication`] materializes a sealed CA tree on disk. [`tal`] emits
//! the one file the codec layer never touches. [`clock`] and
//! [`signing`] are the injected time/key services every other module
//! takes as a dependency rather than reaching for globals.

pub mod asn1;
pub mod ca;
pub mod cert;
pub mod clock;
pub mod config;
pub mod error;
pub mod ghostbusters;
pub mod manifest;
pub mod oid;
pub mod publication;
pub mod resources;
pub mod roa;
pub mod signing;
pub mod sigobj;
pub mod tal;
pub mod util;

pub use error::{Error, Warning};

/// Populates the ASN.1 open-type registries (content types and
/// extensions). Must run once before any encoding happens; idempotent,
/// so callers that already called it (e.g. a prior test in the same
/// process) pay nothing extra.
pub fn init() {
    oid::register_known_types();
}
