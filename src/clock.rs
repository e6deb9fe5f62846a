//! Injected clock and the two RPKI time encodings.
//!
//! Both certificate validity and CRL this/next-update fields use the
//! X.509 `Time` CHOICE (UTCTime for instants before 2050, GeneralizedTime
//! from 2050 on); manifests always use GeneralizedTime truncated to the
//! hour (RFC 6486). We model these as two distinct types so a caller
//! can't accidentally put a `Time` where a manifest wants a whole-hour
//! `GenTime`.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

use crate::asn1::encode::Primitive;
use crate::asn1::tag::Tag;

/// A source of "now", injected so tests can pin output bytes for
/// byte-stability checks.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always returns the same instant. Used by tests and by
/// any caller that wants deterministic output.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn new(dt: DateTime<Utc>) -> Self {
        FixedClock(dt)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

//------------ Time ----------------------------------------------------------

/// An X.509 `Time` value: `UTCTime` for instants strictly before 2050,
/// `GeneralizedTime` from then on (RFC 5280 §4.1.2.5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(DateTime<Utc>);

impl Time {
    pub fn new(dt: DateTime<Utc>) -> Self {
        // X.509 times carry whole seconds only.
        Time(Utc.timestamp(dt.timestamp(), 0))
    }

    pub fn now(clock: &dyn Clock) -> Self {
        Time::new(clock.now())
    }

    pub fn plus_days(self, days: i64) -> Self {
        Time(self.0 + Duration::days(days))
    }

    pub fn inner(self) -> DateTime<Utc> {
        self.0
    }

    fn use_generalized(self) -> bool {
        self.0.year() >= 2050
    }

    pub fn encode(self) -> Primitive {
        if self.use_generalized() {
            Primitive::new(Tag::GENERALIZED_TIME, format_generalized(self.0).into_bytes())
        } else {
            Primitive::new(Tag::UTC_TIME, format_utc(self.0).into_bytes())
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

fn format_utc(dt: DateTime<Utc>) -> String {
    // YYMMDDHHMMSSZ
    format!("{}", dt.format("%y%m%d%H%M%SZ"))
}

fn format_generalized(dt: DateTime<Utc>) -> String {
    // YYYYMMDDHHMMSSZ
    format!("{}", dt.format("%Y%m%d%H%M%SZ"))
}

//------------ GenTime --------------------------------------------------------

/// A manifest `thisUpdate`/`nextUpdate` value: always `GeneralizedTime`,
/// truncated to whole-hour precision, as used throughout RFC 6486.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GenTime(DateTime<Utc>);

impl GenTime {
    pub fn new(dt: DateTime<Utc>) -> Self {
        let truncated = Utc
            .ymd(dt.year(), dt.month(), dt.day())
            .and_hms(dt.hour(), 0, 0);
        GenTime(truncated)
    }

    pub fn now(clock: &dyn Clock) -> Self {
        GenTime::new(clock.now())
    }

    pub fn plus_days(self, days: i64) -> Self {
        GenTime::new(self.0 + Duration::days(days))
    }

    pub fn inner(self) -> DateTime<Utc> {
        self.0
    }

    pub fn encode(self) -> Primitive {
        Primitive::new(Tag::GENERALIZED_TIME, format_generalized(self.0).into_bytes())
    }
}

impl fmt::Display for GenTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:00:00Z"))
    }
}
