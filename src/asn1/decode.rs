//! A minimal DER reader.
//!
//! We only ever need to decode our own output back (for the test suite's
//! byte-stability checks, and for the manifest builder which re-reads the
//! DER it just wrote for a few fields) plus the handful of BER/DER inputs
//! the core never produces but must still tolerate reading, namely
//! whatever key material callers hand in. So this is deliberately a
//! strict subset of a full BER reader: definite lengths only, no
//! indefinite-length constructed values, no surprises.
//!
//! Grounded on `examples/NLnetLabs-routinator/src/ber/{tag,length,content}.rs`:
//! same tag/length parsing shape, pared down to what this crate needs.

use std::fmt;

use super::tag::Tag;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    Truncated,
    LengthNotMinimal,
    IndefiniteLength,
    UnexpectedTag { expected: Tag, found: Tag },
    Malformed(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated => write!(f, "unexpected end of input"),
            Error::LengthNotMinimal => write!(f, "length octets not minimally encoded"),
            Error::IndefiniteLength => write!(f, "indefinite length not allowed in DER"),
            Error::UnexpectedTag { expected, found } => {
                write!(f, "expected tag {:?}, found {:?}", expected, found)
            }
            Error::Malformed(what) => write!(f, "malformed {}", what),
        }
    }
}

impl std::error::Error for Error {}

/// One decoded tag-length-value, with `content` borrowing from the
/// original input.
pub struct Tlv<'a> {
    pub tag: Tag,
    pub content: &'a [u8],
}

/// A cursor over a `&[u8]` that hands out `Tlv`s in sequence.
pub struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Reader { input }
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.input
    }

    /// Reads one TLV, advancing past it.
    pub fn take_tlv(&mut self) -> Result<Tlv<'a>, Error> {
        let (tag, rest) = take_tag(self.input)?;
        let (len, rest) = take_length(rest)?;
        if rest.len() < len {
            return Err(Error::Truncated);
        }
        let (content, rest) = rest.split_at(len);
        self.input = rest;
        Ok(Tlv { tag, content })
    }

    /// Reads one TLV and checks its tag matches `expected`.
    pub fn take_tagged(&mut self, expected: Tag) -> Result<&'a [u8], Error> {
        let tlv = self.take_tlv()?;
        if tlv.tag != expected {
            return Err(Error::UnexpectedTag {
                expected,
                found: tlv.tag,
            });
        }
        Ok(tlv.content)
    }

    /// Reads a `SEQUENCE`, returning a reader over its content.
    pub fn take_sequence(&mut self) -> Result<Reader<'a>, Error> {
        Ok(Reader::new(self.take_tagged(Tag::SEQUENCE)?))
    }
}

fn take_tag(input: &[u8]) -> Result<(Tag, &[u8]), Error> {
    let first = *input.first().ok_or(Error::Truncated)?;
    if first & 0x1f == 0x1f {
        // High-tag-number form; this crate never emits or expects one.
        return Err(Error::Malformed("high tag number form"));
    }
    Ok((Tag(first), &input[1..]))
}

fn take_length(input: &[u8]) -> Result<(usize, &[u8]), Error> {
    let first = *input.first().ok_or(Error::Truncated)?;
    let rest = &input[1..];
    if first & 0x80 == 0 {
        return Ok((first as usize, rest));
    }
    let count = (first & 0x7f) as usize;
    if count == 0 {
        return Err(Error::IndefiniteLength);
    }
    if count > std::mem::size_of::<usize>() {
        return Err(Error::Malformed("length overflow"));
    }
    if rest.len() < count {
        return Err(Error::Truncated);
    }
    let (len_bytes, rest) = rest.split_at(count);
    if len_bytes[0] == 0 {
        return Err(Error::LengthNotMinimal);
    }
    let mut buf = [0u8; std::mem::size_of::<usize>()];
    buf[std::mem::size_of::<usize>() - count..].copy_from_slice(len_bytes);
    let len = usize::from_be_bytes(buf);
    if len < 0x80 {
        // Could have been encoded in short form.
        return Err(Error::LengthNotMinimal);
    }
    Ok((len, rest))
}

/// Parses an `INTEGER`'s content octets back into a big-endian magnitude
/// with any DER sign-padding byte stripped.
pub fn integer_magnitude(content: &[u8]) -> Result<&[u8], Error> {
    if content.is_empty() {
        return Err(Error::Malformed("empty INTEGER"));
    }
    let mut bytes = content;
    while bytes.len() > 1 && bytes[0] == 0 && bytes[1] & 0x80 == 0 {
        bytes = &bytes[1..];
    }
    Ok(bytes)
}

/// Parses a `BIT STRING`'s content octets into (unused bit count, bits).
pub fn bit_string(content: &[u8]) -> Result<(u8, &[u8]), Error> {
    let (unused, bits) = content.split_first().ok_or(Error::Malformed("empty BIT STRING"))?;
    if *unused > 7 {
        return Err(Error::Malformed("BIT STRING unused count > 7"));
    }
    Ok((*unused, bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_encoder_output() {
        use crate::asn1::encode::{octet_string, Value};
        let enc = octet_string(vec![1, 2, 3]).to_vec();
        let mut r = Reader::new(&enc);
        let content = r.take_tagged(Tag::OCTET_STRING).unwrap();
        assert_eq!(content, &[1, 2, 3]);
        assert!(r.is_empty());
    }

    #[test]
    fn rejects_non_minimal_length() {
        // Long form encoding 5 as 0x81 0x05, which DER forbids (short
        // form 0x05 was available).
        let bogus = [0x04u8, 0x81, 0x05, 0, 0, 0, 0, 0];
        let mut r = Reader::new(&bogus);
        assert_eq!(r.take_tlv().unwrap_err(), Error::LengthNotMinimal);
    }

    #[test]
    fn integer_magnitude_strips_sign_byte() {
        assert_eq!(integer_magnitude(&[0x00, 0xff]).unwrap(), &[0xff]);
        assert_eq!(integer_magnitude(&[0x01]).unwrap(), &[0x01]);
    }
}
