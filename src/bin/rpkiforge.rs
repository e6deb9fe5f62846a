//! CLI entry point: reads a [`rpkiforge::config::Config`], synthesizes a
//! Trust Anchor / CA / ROA / Ghostbusters Record tree, seals it, writes
//! the publication tree and the TAL. Mirrors the thin main-plus-`run`
//! split used by `mkrpki`'s subcommand dispatch, generalized here to one
//! fixed pipeline -- no subcommands, one config describes one output
//! tree.

use rpkiforge::clock::SystemClock;
use rpkiforge::config::Config;
use rpkiforge::error::{Context, Error};
use rpkiforge::signing::OpenSslKeyGen;
use rpkiforge::{ca::Ca, publication, tal};

fn run() -> Result<(), Error> {
    rpkiforge::init();

    let config = Config::create()?;
    let clock = SystemClock;
    let keygen = OpenSslKeyGen;

    let ta_resources = config
        .ta_resources()
        .map_err(|e| Error::Resources(Context::new("ta"), e))?;
    let mut ta = Ca::new_ta(
        &config.ta_common_name,
        config.base_uri.as_str(),
        ta_resources,
        config.validity(),
        &clock,
        &keygen,
    )
    .map_err(|e| Error::Ca(Context::new(&config.ta_common_name), e))?;

    let ca_resources = config
        .ca_resources()
        .map_err(|e| Error::Resources(Context::new(&config.ca_common_name), e))?;
    if !ca_resources.is_empty() {
        let idx = ta
            .issue_ca(&config.ca_common_name, ca_resources, &clock, &keygen)
            .map_err(|e| Error::Ca(Context::new(&config.ca_common_name), e))?;
        let ca = &mut ta.children[idx];

        if let Some(roa) = config.roa() {
            ca.issue_roa(roa, &clock, &keygen)
                .map_err(|e| Error::Ca(Context::new(&config.ca_common_name), e))?;
        }
        if let Some(gbr) = config.ghostbusters() {
            ca.issue_ghostbusters(gbr, &clock, &keygen)
                .map_err(|e| Error::Ca(Context::new(&config.ca_common_name), e))?;
        }
    }

    let warnings = ta
        .seal(&clock, &keygen)
        .map_err(|e| Error::Ca(Context::new(&config.ta_common_name), e))?;
    for warning in &warnings {
        log::warn!("{}", warning);
    }

    let written = publication::publish(&ta, &config.output_root)
        .map_err(|e| Error::Publication(Context::new("publish"), e))?;
    log::info!("wrote {} objects under {}", written.len(), config.output_root.display());

    let tal_path = tal::write(&ta, &config.tal_dir, &config.ta_common_name)
        .map_err(|e| Error::Tal(Context::new(&config.ta_common_name), e))?;
    log::info!("wrote TAL {}", tal_path.display());

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("rpkiforge: {}", e);
        std::process::exit(1);
    }
}
