//! Top-level error type aggregating every component's failure modes.
//!
//! Mirrors the shape of krill's `daemon::config::ConfigError`: a flat
//! `derive_more::Display` enum with `From` impls for the underlying
//! library errors, so `?` works across component boundaries and the
//! top-level caller always gets a message with the object path attached.

use std::io;

use derive_more::Display;

/// Context describing which artifact was being built when an error
/// occurred. Threaded through so failures are reported with the path of
/// the object under construction.
#[derive(Clone, Debug, Display)]
#[display(fmt = "{}", _0)]
pub struct Context(pub String);

impl Context {
    pub fn new(s: impl Into<String>) -> Self {
        Context(s.into())
    }
}

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "{}: {}", _0, _1)]
    Asn1(Context, crate::asn1::Error),

    #[display(fmt = "{}: {}", _0, _1)]
    Resources(Context, crate::resources::Error),

    #[display(fmt = "{}: {}", _0, _1)]
    Cert(Context, crate::cert::Error),

    #[display(fmt = "{}: {}", _0, _1)]
    Ca(Context, crate::ca::Error),

    #[display(fmt = "{}: {}", _0, _1)]
    SignedObject(Context, crate::sigobj::Error),

    #[display(fmt = "{}: {}", _0, _1)]
    Publication(Context, crate::publication::Error),

    #[display(fmt = "{}: {}", _0, _1)]
    Tal(Context, crate::tal::Error),

    #[display(fmt = "configuration error: {}", _0)]
    Config(crate::config::ConfigError),

    #[display(fmt = "I/O error: {}", _0)]
    Io(io::Error),
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(e: crate::config::ConfigError) -> Self {
        Error::Config(e)
    }
}

/// A non-fatal advisory raised during construction, e.g. an expired CRL
/// entry pruned on reissue.
#[derive(Clone, Debug, Display)]
#[display(fmt = "{}: {}", context, message)]
pub struct Warning {
    pub context: String,
    pub message: String,
}

impl Warning {
    pub fn new(context: impl Into<String>, message: impl Into<String>) -> Self {
        Warning {
            context: context.into(),
            message: message.into(),
        }
    }
}
