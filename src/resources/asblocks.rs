//! `ASIdentifiers` construction (RFC 3779 §3.2).
//!
//! ```text
//! ASIdentifiers       ::= SEQUENCE {
//!     asnum   [0] EXPLICIT ASIdentifierChoice OPTIONAL,
//!     rdi     [1] EXPLICIT ASIdentifierChoice OPTIONAL
//! }
//! ASIdentifierChoice  ::= CHOICE {
//!     inherit         NULL,
//!     asIdsOrRanges   SEQUENCE OF ASIdOrRange
//! }
//! ASIdOrRange         ::= CHOICE { id ASId, range ASRange }
//! ASRange             ::= SEQUENCE { min ASId, max ASId }
//! ASId                ::= INTEGER
//! ```
//!
//! This core only ever populates the `asnum` branch; the
//! routing-domain-identifier branch has no caller in this crate.

use std::str::FromStr;

use crate::asn1::encode::{self, explicit, integer_u32, null, Constructed, Value};

use super::Error;

/// A single AS number or an inclusive range of them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AsIdOrRange {
    Id(u32),
    Range(u32, u32),
}

impl AsIdOrRange {
    fn sort_key(self) -> u32 {
        match self {
            AsIdOrRange::Id(id) => id,
            AsIdOrRange::Range(min, _) => min,
        }
    }

    fn validate(self) -> Result<(), Error> {
        match self {
            AsIdOrRange::Range(min, max) if min > max => Err(Error::InvalidAsRange { min, max }),
            _ => Ok(()),
        }
    }

    fn encode(self) -> Box<dyn Value> {
        match self {
            AsIdOrRange::Id(id) => Box::new(integer_u32(id)),
            AsIdOrRange::Range(min, max) => {
                let fields: Vec<Box<dyn Value>> =
                    vec![Box::new(integer_u32(min)), Box::new(integer_u32(max))];
                Box::new(encode::sequence(fields))
            }
        }
    }
}

/// The AS-number resources carried by a certificate: either `inherit`,
/// or an explicit, caller-ordered list preserved as given, unlike the
/// IP address case which sorts.
#[derive(Clone, Debug)]
pub enum AsResources {
    Inherit,
    Entries(Vec<AsIdOrRange>),
}

impl AsResources {
    pub fn build(entries: Vec<AsIdOrRange>) -> Result<Self, Error> {
        if entries.is_empty() {
            return Err(Error::EmptyResourceSet);
        }
        for entry in &entries {
            entry.validate()?;
        }
        Ok(AsResources::Entries(entries))
    }

    pub fn encode(&self) -> Constructed {
        let choice: Box<dyn Value> = match self {
            AsResources::Inherit => Box::new(null()),
            AsResources::Entries(entries) => {
                let items: Vec<Box<dyn Value>> = entries.iter().map(|e| e.encode()).collect();
                Box::new(encode::sequence(items))
            }
        };
        // asnum [0] EXPLICIT ASIdentifierChoice
        let asnum: Box<dyn Value> = Box::new(explicit(0, choice));
        encode::sequence(vec![asnum])
    }
}

/// Parses the CLI/config-file form `65000` or `65000-65100`, with an
/// optional leading `AS`/`as` (e.g. `AS65000`), grounded on the
/// `RoaPrefix: FromStr` parsing style in
/// `examples/other_examples/..._NLnetLabs-mkrpki__src-main.rs.rs`.
impl FromStr for AsIdOrRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn parse_asn(s: &str) -> Result<u32, String> {
            let s = s.strip_prefix("AS").or_else(|| s.strip_prefix("as")).unwrap_or(s);
            s.parse().map_err(|_| format!("invalid AS number '{}'", s))
        }

        match s.split_once('-') {
            Some((min, max)) => {
                let min = parse_asn(min)?;
                let max = parse_asn(max)?;
                Ok(AsIdOrRange::Range(min, max))
            }
            None => Ok(AsIdOrRange::Id(parse_asn(s)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherit_encodes_as_null_choice() {
        let enc = AsResources::Inherit.encode().to_vec();
        assert_eq!(enc[0], crate::asn1::tag::Tag::SEQUENCE.0);
    }

    #[test]
    fn preserves_caller_order_rather_than_sorting() {
        let entries = vec![AsIdOrRange::Id(65000), AsIdOrRange::Id(1)];
        let built = AsResources::build(entries.clone()).unwrap();
        match built {
            AsResources::Entries(es) => assert_eq!(es, entries),
            _ => panic!("expected Entries"),
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = AsResources::build(vec![AsIdOrRange::Range(10, 5)]).unwrap_err();
        assert!(matches!(err, Error::InvalidAsRange { min: 10, max: 5 }));
    }

    #[test]
    fn parses_bare_as_number() {
        assert_eq!("65000".parse::<AsIdOrRange>().unwrap(), AsIdOrRange::Id(65000));
    }

    #[test]
    fn parses_as_prefixed_number() {
        assert_eq!("AS65000".parse::<AsIdOrRange>().unwrap(), AsIdOrRange::Id(65000));
    }

    #[test]
    fn parses_as_number_range() {
        assert_eq!(
            "65000-65100".parse::<AsIdOrRange>().unwrap(),
            AsIdOrRange::Range(65000, 65100)
        );
    }
}
