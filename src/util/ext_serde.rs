//! Deserialization helpers for config-file fields whose wire form is a
//! string or a list of strings but whose Rust type isn't a bare
//! primitive. Mirrors krill's `commons/src/util/ext_serde.rs`
//! `de_<type>`/`ser_<type>` pairing.

use std::str::FromStr;

use log::LevelFilter;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::publication::RsyncBaseUri;
use crate::resources::{Afi, AsIdOrRange, IpEntry};
use crate::roa::RoaNetwork;

//------------ RsyncBaseUri ---------------------------------------------------

pub fn de_rsync_base_uri<'de, D>(d: D) -> Result<RsyncBaseUri, D::Error>
where
    D: Deserializer<'de>,
{
    let some = String::deserialize(d)?;
    RsyncBaseUri::parse(some).map_err(de::Error::custom)
}

pub fn ser_rsync_base_uri<S>(uri: &RsyncBaseUri, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    uri.as_str().serialize(s)
}

//------------ IP resource entries --------------------------------------------

/// Deserializes a list of `address/prefixlen` / `low-high` strings into
/// `(family, entry)` pairs ready for [`crate::resources::IpResources::build`].
/// Config-supplied resource lists are always self-describing (the `TA`/`CA`
/// holds explicit resources, never `inherit` -- that marker only makes
/// sense on an issued certificate), so every entry must report its own
/// family.
pub fn de_ip_resources<'de, D>(d: D) -> Result<Vec<(Afi, IpEntry)>, D::Error>
where
    D: Deserializer<'de>,
{
    let strings = Vec::<String>::deserialize(d)?;
    strings
        .into_iter()
        .map(|s| {
            let entry = IpEntry::from_str(&s).map_err(de::Error::custom)?;
            let family = entry
                .family()
                .ok_or_else(|| de::Error::custom(format!("'{}' has no resolvable address family", s)))?;
            Ok((family, entry))
        })
        .collect()
}

//------------ AS resource entries --------------------------------------------

/// Deserializes a list of `65000` / `65000-65100` / `AS65000` strings.
pub fn de_as_resources<'de, D>(d: D) -> Result<Vec<AsIdOrRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let strings = Vec::<String>::deserialize(d)?;
    strings
        .into_iter()
        .map(|s| AsIdOrRange::from_str(&s).map_err(de::Error::custom))
        .collect()
}

//------------ ROA networks ----------------------------------------------------

/// Deserializes a list of `prefix` / `prefix-maxlen` strings.
pub fn de_roa_networks<'de, D>(d: D) -> Result<Vec<RoaNetwork>, D::Error>
where
    D: Deserializer<'de>,
{
    let strings = Vec::<String>::deserialize(d)?;
    strings
        .into_iter()
        .map(|s| RoaNetwork::from_str(&s).map_err(de::Error::custom))
        .collect()
}

//------------ LevelFilter ------------------------------------------------------

pub fn de_level_filter<'de, D>(d: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let string = String::deserialize(d)?;
    LevelFilter::from_str(&string).map_err(de::Error::custom)
}
