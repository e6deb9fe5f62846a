//! Process configuration.
//!
//! Grounded on krill's `daemon/config.rs`: a `ConfigDefaults` struct of
//! plain functions feeding `#[serde(default = "...")]`, a `Config`
//! deserialized from TOML, `Config::create()` layering a `clap` CLI flag
//! on top of the config file, and `init_logging()` dispatching on a
//! `LogType` the same way -- simplified to the `File`/`Stderr` pair this
//! crate actually needs (no `syslog` dependency is declared, so that
//! third branch is dropped; noted in DESIGN.md).

use std::fs::File;
use std::io;
use std::io::Read as _;
use std::path::PathBuf;

use clap::{App, Arg};
use derive_more::Display;
use log::LevelFilter;
use serde::de;
use serde::{Deserialize, Deserializer};

use crate::ca::Validity;
use crate::ghostbusters::Ghostbusters;
use crate::publication::RsyncBaseUri;
use crate::resources::{Afi, AsIdOrRange, AsResources, IpEntry, IpResources, ResourceSet};
use crate::roa::{Roa, RoaNetwork};
use crate::util::ext_serde;

//------------ ConfigDefaults -------------------------------------------------

pub struct ConfigDefaults;

impl ConfigDefaults {
    fn base_uri() -> RsyncBaseUri {
        RsyncBaseUri::parse("rsync://rpki.example.net/rpki").expect("a literal rsync URI")
    }

    fn output_root() -> PathBuf {
        PathBuf::from("./output")
    }

    fn tal_dir() -> PathBuf {
        PathBuf::from("./tal")
    }

    fn ta_common_name() -> String {
        "TA".to_string()
    }

    fn ca_common_name() -> String {
        "CA".to_string()
    }

    /// The whole IPv4+IPv6 address space, so a fresh TA can delegate
    /// anything without the operator having to spell it out.
    fn ta_ip_resources() -> Vec<(Afi, IpEntry)> {
        vec![
            (Afi::V4, IpEntry::Prefix(crate::resources::IpPrefix::new(crate::resources::IpAddr::V4([0, 0, 0, 0]), 0))),
            (Afi::V6, IpEntry::Prefix(crate::resources::IpPrefix::new(crate::resources::IpAddr::V6([0; 16]), 0))),
        ]
    }

    fn ta_as_resources() -> Vec<AsIdOrRange> {
        vec![AsIdOrRange::Range(0, u32::MAX)]
    }

    fn ca_ip_resources() -> Vec<(Afi, IpEntry)> {
        Vec::new()
    }

    fn ca_as_resources() -> Vec<AsIdOrRange> {
        Vec::new()
    }

    fn roa_networks() -> Vec<RoaNetwork> {
        Vec::new()
    }

    fn gbr_full_name() -> Option<String> {
        None
    }

    fn gbr_org() -> Option<String> {
        None
    }

    fn gbr_email() -> Option<String> {
        None
    }

    fn gbr_address() -> Option<String> {
        None
    }

    fn gbr_tel() -> Option<String> {
        None
    }

    fn cert_days() -> i64 {
        365
    }

    fn crl_days() -> i64 {
        7
    }

    fn mft_days() -> i64 {
        7
    }

    fn log_level() -> LevelFilter {
        LevelFilter::Info
    }

    fn log_type() -> LogType {
        LogType::Stderr
    }

    fn log_file() -> PathBuf {
        PathBuf::from("./rpkiforge.log")
    }
}

//------------ Config ----------------------------------------------------------

/// Every synthesis-job input this crate needs, plus the ambient
/// logging/CA-naming fields a complete binary needs. Unlike krill's
/// own `Config`, this crate has no network-facing settings (no
/// socket address, no TLS, no auth token) -- there is no server here,
/// just a one-shot synthesizer.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "ConfigDefaults::base_uri", deserialize_with = "ext_serde::de_rsync_base_uri")]
    pub base_uri: RsyncBaseUri,

    #[serde(default = "ConfigDefaults::output_root")]
    pub output_root: PathBuf,

    #[serde(default = "ConfigDefaults::tal_dir")]
    pub tal_dir: PathBuf,

    #[serde(default = "ConfigDefaults::ta_common_name")]
    pub ta_common_name: String,

    #[serde(default = "ConfigDefaults::ca_common_name")]
    pub ca_common_name: String,

    #[serde(default = "ConfigDefaults::ta_ip_resources", deserialize_with = "ext_serde::de_ip_resources")]
    pub ta_ip_resources: Vec<(Afi, IpEntry)>,

    #[serde(default = "ConfigDefaults::ta_as_resources", deserialize_with = "ext_serde::de_as_resources")]
    pub ta_as_resources: Vec<AsIdOrRange>,

    #[serde(default = "ConfigDefaults::ca_ip_resources", deserialize_with = "ext_serde::de_ip_resources")]
    pub ca_ip_resources: Vec<(Afi, IpEntry)>,

    #[serde(default = "ConfigDefaults::ca_as_resources", deserialize_with = "ext_serde::de_as_resources")]
    pub ca_as_resources: Vec<AsIdOrRange>,

    /// The ROA's origin AS. `None` means "issue no ROA" (only the TA/CA
    /// tree and its CRLs/manifests are synthesized).
    #[serde(default)]
    pub roa_asid: Option<u32>,

    #[serde(default = "ConfigDefaults::roa_networks", deserialize_with = "ext_serde::de_roa_networks")]
    pub roa_networks: Vec<RoaNetwork>,

    #[serde(default = "ConfigDefaults::gbr_full_name")]
    pub gbr_full_name: Option<String>,

    #[serde(default = "ConfigDefaults::gbr_org")]
    pub gbr_org: Option<String>,

    #[serde(default = "ConfigDefaults::gbr_email")]
    pub gbr_email: Option<String>,

    #[serde(default = "ConfigDefaults::gbr_address")]
    pub gbr_address: Option<String>,

    #[serde(default = "ConfigDefaults::gbr_tel")]
    pub gbr_tel: Option<String>,

    #[serde(default = "ConfigDefaults::cert_days")]
    pub cert_days: i64,

    #[serde(default = "ConfigDefaults::crl_days")]
    pub crl_days: i64,

    #[serde(default = "ConfigDefaults::mft_days")]
    pub mft_days: i64,

    #[serde(default = "ConfigDefaults::log_level", deserialize_with = "ext_serde::de_level_filter")]
    log_level: LevelFilter,

    #[serde(default = "ConfigDefaults::log_type")]
    log_type: LogType,

    #[serde(default = "ConfigDefaults::log_file")]
    log_file: PathBuf,
}

/// # Accessors
impl Config {
    pub fn validity(&self) -> Validity {
        Validity {
            cert_days: self.cert_days,
            crl_days: self.crl_days,
            mft_days: self.mft_days,
        }
    }

    pub fn ta_resources(&self) -> Result<ResourceSet, crate::resources::Error> {
        Ok(ResourceSet {
            ip: IpResources::build(self.ta_ip_resources.clone())?,
            asn: Some(AsResources::build(self.ta_as_resources.clone())?),
        })
    }

    pub fn ca_resources(&self) -> Result<ResourceSet, crate::resources::Error> {
        let asn = if self.ca_as_resources.is_empty() {
            None
        } else {
            Some(AsResources::build(self.ca_as_resources.clone())?)
        };
        Ok(ResourceSet {
            ip: IpResources::build(self.ca_ip_resources.clone())?,
            asn,
        })
    }

    /// Builds the configured ROA payload, if `roa_asid` and at least one
    /// network were supplied.
    pub fn roa(&self) -> Option<Roa> {
        if self.roa_networks.is_empty() {
            return None;
        }
        self.roa_asid.map(|as_id| Roa::new(as_id, self.roa_networks.clone()))
    }

    /// Builds the configured Ghostbusters Record, if `gbr_full_name` was
    /// supplied (RFC 6493's `FN` is the one mandatory vCard field).
    pub fn ghostbusters(&self) -> Option<Ghostbusters> {
        let full_name = self.gbr_full_name.clone()?;
        let mut gbr = Ghostbusters::new(full_name);
        gbr.org = self.gbr_org.clone();
        gbr.address = self.gbr_address.clone();
        gbr.tel = self.gbr_tel.clone();
        gbr.email = self.gbr_email.clone();
        Some(gbr)
    }
}

/// # Create
impl Config {
    /// A minimal config pointing at a throwaway directory, for tests.
    pub fn test(output_root: PathBuf, tal_dir: PathBuf) -> Self {
        Config {
            base_uri: ConfigDefaults::base_uri(),
            output_root,
            tal_dir,
            ta_common_name: ConfigDefaults::ta_common_name(),
            ca_common_name: ConfigDefaults::ca_common_name(),
            ta_ip_resources: ConfigDefaults::ta_ip_resources(),
            ta_as_resources: ConfigDefaults::ta_as_resources(),
            ca_ip_resources: ConfigDefaults::ca_ip_resources(),
            ca_as_resources: ConfigDefaults::ca_as_resources(),
            roa_asid: None,
            roa_networks: ConfigDefaults::roa_networks(),
            gbr_full_name: ConfigDefaults::gbr_full_name(),
            gbr_org: ConfigDefaults::gbr_org(),
            gbr_email: ConfigDefaults::gbr_email(),
            gbr_address: ConfigDefaults::gbr_address(),
            gbr_tel: ConfigDefaults::gbr_tel(),
            cert_days: ConfigDefaults::cert_days(),
            crl_days: ConfigDefaults::crl_days(),
            mft_days: ConfigDefaults::mft_days(),
            log_level: LevelFilter::Off,
            log_type: LogType::Stderr,
            log_file: ConfigDefaults::log_file(),
        }
    }

    /// Creates the config at startup: a `clap` flag overrides which file
    /// to read, then logging is initialized from the parsed result.
    /// Panics on a CLI-parsing failure -- there is no sensible way to
    /// run with a malformed CLI invocation.
    pub fn create() -> Result<Self, ConfigError> {
        let matches = App::new("rpkiforge")
            .version(env!("CARGO_PKG_VERSION"))
            .arg(
                Arg::with_name("config")
                    .short("c")
                    .long("config")
                    .value_name("FILE")
                    .help(
                        "Specify a non-default config file. If no file is \
                         specified, './defaults/rpkiforge.conf' is used.",
                    )
                    .required(false),
            )
            .get_matches();

        let config_file = matches.value_of("config").unwrap_or("./defaults/rpkiforge.conf");

        let c = Self::read_config(config_file)?;
        c.init_logging()?;
        Ok(c)
    }

    fn read_config(file: &str) -> Result<Self, ConfigError> {
        let mut bytes = Vec::new();
        let mut f = File::open(file)?;
        f.read_to_end(&mut bytes)?;
        let c: Config = toml::from_slice(&bytes)?;
        Ok(c)
    }

    pub fn init_logging(&self) -> Result<(), ConfigError> {
        match self.log_type {
            LogType::File => {
                let file = fern::log_file(&self.log_file)?;
                fern::Dispatch::new()
                    .level(self.log_level)
                    .format(|out, message, record| {
                        out.finish(format_args!(
                            "{} [{}] {}",
                            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"),
                            record.level(),
                            message
                        ))
                    })
                    .chain(file)
                    .apply()?;
            }
            LogType::Stderr => {
                fern::Dispatch::new().level(self.log_level).chain(io::stderr()).apply()?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Display)]
pub enum ConfigError {
    #[display(fmt = "{}", _0)]
    IoError(io::Error),

    #[display(fmt = "{}", _0)]
    TomlError(toml::de::Error),

    #[display(fmt = "{}", _0)]
    LogError(log::SetLoggerError),

    #[display(fmt = "{}", _0)]
    Other(String),
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::TomlError(e)
    }
}

impl From<log::SetLoggerError> for ConfigError {
    fn from(e: log::SetLoggerError) -> Self {
        ConfigError::LogError(e)
    }
}

//------------ LogType ----------------------------------------------------------

/// The target to log to. Only `File`/`Stderr` -- this crate carries no
/// `syslog` dependency (DESIGN.md notes the drop).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LogType {
    File,
    Stderr,
}

impl<'de> Deserialize<'de> for LogType {
    fn deserialize<D>(d: D) -> Result<LogType, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(d)?;
        match string.as_str() {
            "stderr" => Ok(LogType::Stderr),
            "file" => Ok(LogType::File),
            _ => Err(de::Error::custom(format!("expected \"stderr\" or \"file\", found: \"{}\"", string))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builds_default_ta_resources() {
        let config = Config::test(PathBuf::from("/tmp/out"), PathBuf::from("/tmp/tal"));
        let resources = config.ta_resources().unwrap();
        assert!(!resources.ip.is_empty());
        assert!(resources.asn.is_some());
    }

    #[test]
    fn no_gbr_full_name_means_no_ghostbusters_record() {
        let config = Config::test(PathBuf::from("/tmp/out"), PathBuf::from("/tmp/tal"));
        assert!(config.ghostbusters().is_none());
    }

    #[test]
    fn empty_roa_networks_means_no_roa() {
        let config = Config::test(PathBuf::from("/tmp/out"), PathBuf::from("/tmp/tal"));
        assert!(config.roa().is_none());
    }
}
