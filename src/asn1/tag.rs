//! Identifier octets ("tags") for DER values.
//!
//! Grounded on `examples/NLnetLabs-routinator/src/ber/tag.rs`: same
//! constant layout (universal class tags, the constructed bit, the
//! context-specific class used for X.509's implicit `[n]` fields),
//! cleaned up so each `CTX_n`/`CTX_CON_n` constant actually carries its
//! own tag number (the routinator source has a copy-paste bug where
//! `CTX_1`..`CTX_3` all alias `CTX_0`; we don't reproduce that).

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tag(pub u8);

impl Tag {
    const CONSTRUCTED: u8 = 0x20;
    const CONTEXT_SPECIFIC: u8 = 0x80;

    pub const BOOLEAN: Tag = Tag(0x01);
    pub const INTEGER: Tag = Tag(0x02);
    pub const BIT_STRING: Tag = Tag(0x03);
    pub const OCTET_STRING: Tag = Tag(0x04);
    pub const NULL: Tag = Tag(0x05);
    pub const OID: Tag = Tag(0x06);
    pub const PRINTABLE_STRING: Tag = Tag(0x13);
    pub const IA5_STRING: Tag = Tag(0x16);
    pub const UTC_TIME: Tag = Tag(0x17);
    pub const GENERALIZED_TIME: Tag = Tag(0x18);
    pub const SEQUENCE: Tag = Tag(Tag::CONSTRUCTED | 0x10);
    pub const SET: Tag = Tag(Tag::CONSTRUCTED | 0x11);

    /// Context-specific, primitive, tag number `n` (`[n] IMPLICIT ...`).
    pub const fn ctx(n: u8) -> Tag {
        Tag(Tag::CONTEXT_SPECIFIC | n)
    }

    /// Context-specific, constructed, tag number `n` (`[n] EXPLICIT ...`,
    /// or an implicitly-tagged constructed type such as `[3] Extensions`).
    pub const fn ctx_constructed(n: u8) -> Tag {
        Tag(Tag::CONTEXT_SPECIFIC | Tag::CONSTRUCTED | n)
    }

    pub fn is_constructed(self) -> bool {
        self.0 & Tag::CONSTRUCTED != 0
    }

    pub fn constructed(self) -> Tag {
        Tag(self.0 | Tag::CONSTRUCTED)
    }

    pub fn primitive(self) -> Tag {
        Tag(self.0 & !Tag::CONSTRUCTED)
    }
}
