//! DER encoding primitives.
//!
//! Every structural type in the core (certificates, CRLs, CMS wrappers,
//! RPKI signed-object payloads) is built by composing the small set of
//! `Value` implementations in this module. This is the hand-rolled
//! equivalent of what a runtime ASN.1 library's encoder does; see
//! `DESIGN.md` for why we write it ourselves instead of depending on one.
//!
//! DER, unlike BER, fixes every choice a flexible encoding would leave
//! open: lengths are always definite and minimal, `SET OF` elements are
//! sorted by their encoding, integers and bit strings use the minimum
//! number of octets. Every primitive here produces exactly one valid
//! DER encoding for its input -- there is no other mode to select.

use std::io;

use super::tag::Tag;

/// Something that can write itself out as one DER TLV (or, for the
/// combinators, a concatenation of several).
pub trait Value {
    fn encoded_len(&self) -> usize;
    fn write_encoded(&self, target: &mut dyn io::Write) -> io::Result<()>;

    fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        // Writing to a Vec never fails.
        self.write_encoded(&mut buf).expect("encoding into Vec<u8>");
        buf
    }
}

impl<T: Value + ?Sized> Value for &T {
    fn encoded_len(&self) -> usize {
        (**self).encoded_len()
    }
    fn write_encoded(&self, target: &mut dyn io::Write) -> io::Result<()> {
        (**self).write_encoded(target)
    }
}

impl Value for Box<dyn Value> {
    fn encoded_len(&self) -> usize {
        self.as_ref().encoded_len()
    }
    fn write_encoded(&self, target: &mut dyn io::Write) -> io::Result<()> {
        self.as_ref().write_encoded(target)
    }
}

impl<T: Value> Value for Option<T> {
    fn encoded_len(&self) -> usize {
        self.as_ref().map_or(0, Value::encoded_len)
    }
    fn write_encoded(&self, target: &mut dyn io::Write) -> io::Result<()> {
        match self {
            Some(v) => v.write_encoded(target),
            None => Ok(()),
        }
    }
}

/// Writes a tag-length-value header followed by `content`.
fn write_tlv(
    tag: Tag,
    content: &[u8],
    target: &mut dyn io::Write,
) -> io::Result<()> {
    target.write_all(&[tag.0])?;
    write_length(content.len(), target)?;
    target.write_all(content)
}

fn length_octets(len: usize) -> usize {
    if len < 0x80 {
        1
    } else {
        1 + (usize::BITS as usize / 8 - (len.leading_zeros() as usize / 8))
    }
}

fn write_length(len: usize, target: &mut dyn io::Write) -> io::Result<()> {
    if len < 0x80 {
        target.write_all(&[len as u8])
    } else {
        let bytes = len.to_be_bytes();
        let first_nonzero = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
        let used = &bytes[first_nonzero..];
        target.write_all(&[0x80 | used.len() as u8])?;
        target.write_all(used)
    }
}

/// A primitive value: one tag, raw content octets, no further structure.
#[derive(Clone, Debug)]
pub struct Primitive {
    tag: Tag,
    content: Vec<u8>,
}

impl Primitive {
    pub fn new(tag: Tag, content: Vec<u8>) -> Self {
        Primitive { tag, content }
    }
}

impl Value for Primitive {
    fn encoded_len(&self) -> usize {
        1 + length_octets(self.content.len()) + self.content.len()
    }
    fn write_encoded(&self, target: &mut dyn io::Write) -> io::Result<()> {
        write_tlv(self.tag, &self.content, target)
    }
}

/// A constructed value whose content is the concatenation of its
/// children's encodings, written under a given tag.
pub struct Constructed {
    tag: Tag,
    content: Vec<u8>,
}

impl Constructed {
    pub fn new(tag: Tag, children: &[&dyn Value]) -> Self {
        let mut content = Vec::new();
        for child in children {
            child.write_encoded(&mut content).expect("encoding into Vec<u8>");
        }
        Constructed { tag, content }
    }
}

impl Value for Constructed {
    fn encoded_len(&self) -> usize {
        1 + length_octets(self.content.len()) + self.content.len()
    }
    fn write_encoded(&self, target: &mut dyn io::Write) -> io::Result<()> {
        write_tlv(self.tag, &self.content, target)
    }
}

/// `SEQUENCE { ... }` of a fixed, heterogeneous list of fields. `None`
/// entries created via the `Option<T>` impl above contribute nothing,
/// which is how OPTIONAL fields are omitted.
pub fn sequence(children: Vec<Box<dyn Value>>) -> Constructed {
    let refs: Vec<&dyn Value> = children.iter().map(|b| b.as_ref()).collect();
    Constructed::new(Tag::SEQUENCE, &refs)
}

/// `[n] EXPLICIT Type` -- wraps an already-encoded value in a
/// constructed context-specific tag.
pub fn explicit(n: u8, inner: impl Value) -> Constructed {
    Constructed::new(Tag::ctx_constructed(n), &[&inner as &dyn Value])
}

/// `SET OF Type`, sorted by encoding as DER requires.
pub fn set_of(mut children: Vec<Vec<u8>>) -> Primitive {
    children.sort();
    let mut content = Vec::new();
    for c in &children {
        content.extend_from_slice(c);
    }
    Primitive::new(Tag::SET, content)
}

pub fn boolean(b: bool) -> Primitive {
    Primitive::new(Tag::BOOLEAN, vec![if b { 0xff } else { 0x00 }])
}

pub fn null() -> Primitive {
    Primitive::new(Tag::NULL, Vec::new())
}

/// `INTEGER`, minimally encoded two's-complement, from a non-negative
/// big-endian magnitude (every integer this core emits -- serials, CRL
/// numbers, AS ids, certificate versions -- is non-negative).
pub fn unsigned_integer(magnitude: &[u8]) -> Primitive {
    let mut bytes: Vec<u8> = magnitude
        .iter()
        .copied()
        .skip_while(|b| *b == 0)
        .collect();
    if bytes.is_empty() {
        bytes.push(0);
    } else if bytes[0] & 0x80 != 0 {
        // Would look negative in two's complement; prepend a sign byte.
        bytes.insert(0, 0);
    }
    Primitive::new(Tag::INTEGER, bytes)
}

pub fn integer_u64(v: u64) -> Primitive {
    unsigned_integer(&v.to_be_bytes())
}

pub fn integer_u32(v: u32) -> Primitive {
    unsigned_integer(&v.to_be_bytes())
}

pub fn octet_string(content: Vec<u8>) -> Primitive {
    Primitive::new(Tag::OCTET_STRING, content)
}

pub fn ia5_string(s: &str) -> Primitive {
    Primitive::new(Tag::IA5_STRING, s.as_bytes().to_vec())
}

pub fn printable_string(s: &str) -> Primitive {
    Primitive::new(Tag::PRINTABLE_STRING, s.as_bytes().to_vec())
}

/// `BIT STRING` with `unused` unused bits in the final octet (0..=7).
/// RFC 3779 prefixes/ranges and RFC 5280 key usages are always
/// represented this way.
pub fn bit_string(unused: u8, bytes: &[u8]) -> Primitive {
    let mut content = Vec::with_capacity(1 + bytes.len());
    content.push(unused);
    content.extend_from_slice(bytes);
    Primitive::new(Tag::BIT_STRING, content)
}

/// Encodes an already-DER-encoded sub-value captured verbatim (e.g. the
/// TBSCertificate bytes embedded inside the signed Certificate, which we
/// also need separately, pre-signature, to compute the signature over).
#[derive(Clone, Debug)]
pub struct Captured(pub Vec<u8>);

impl Value for Captured {
    fn encoded_len(&self) -> usize {
        self.0.len()
    }
    fn write_encoded(&self, target: &mut dyn io::Write) -> io::Result<()> {
        target.write_all(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_true_round_trips_to_der() {
        assert_eq!(boolean(true).to_vec(), vec![0x01, 0x01, 0xff]);
    }

    #[test]
    fn integer_minimal_encoding_adds_sign_byte() {
        // 255 alone would look negative; DER must prepend 0x00.
        assert_eq!(unsigned_integer(&[0xff]).to_vec(), vec![0x02, 0x02, 0x00, 0xff]);
        assert_eq!(unsigned_integer(&[0x00, 0x01]).to_vec(), vec![0x02, 0x01, 0x01]);
    }

    #[test]
    fn long_length_is_long_form() {
        let content = vec![0u8; 200];
        let v = Primitive::new(Tag::OCTET_STRING, content);
        let enc = v.to_vec();
        assert_eq!(enc[0], 0x04);
        assert_eq!(enc[1], 0x81); // one following length octet
        assert_eq!(enc[2], 200);
    }

    #[test]
    fn set_of_sorts_by_encoding() {
        let a = octet_string(vec![2]).to_vec();
        let b = octet_string(vec![1]).to_vec();
        let set = set_of(vec![a, b]).to_vec();
        // after the SET tag+length, the shorter/ lexicographically-first
        // encoding (content byte 1) must come first.
        assert_eq!(&set[2..], &[0x04, 0x01, 0x01, 0x04, 0x01, 0x02][..]);
    }
}
