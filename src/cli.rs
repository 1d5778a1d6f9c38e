use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

use crate::core::config::{HostMode, PanelConfig};

pub fn command() -> Command {
    Command::new("tinytosh")
        .about("Status panel for the Tinytosh serial bridge host")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .help("TOML configuration file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("socket")
                .long("socket")
                .value_name("NAME")
                .help("Local socket name of the host process"),
        )
        .arg(
            Arg::new("simulate")
                .long("simulate")
                .help("Use an in-process simulated host instead of the host process")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("serve-sim")
                .long("serve-sim")
                .help("Serve a simulated host on --socket and block")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("simulate"),
        )
        .arg(
            Arg::new("sim-ports")
                .long("sim-ports")
                .value_name("PORTS")
                .help("Comma-separated port names the simulated host reports")
                .value_delimiter(',')
                .default_values(["COM3", "/dev/ttyUSB0"]),
        )
        .arg(
            Arg::new("ports-interval-ms")
                .long("ports-interval-ms")
                .value_name("MS")
                .help("Port/connection polling interval")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("stats-interval-ms")
                .long("stats-interval-ms")
                .value_name("MS")
                .help("System stats polling interval")
                .value_parser(clap::value_parser!(u64)),
        )
}

/// Parse command line arguments
pub fn parse_args() -> ArgMatches {
    command().get_matches()
}

/// Load the config file (if any) and apply command line overrides.
pub fn resolve_config(matches: &ArgMatches) -> Result<PanelConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PanelConfig::load(path)?,
        None => PanelConfig::default(),
    };
    if let Some(socket) = matches.get_one::<String>("socket") {
        config.host.socket = socket.clone();
    }
    if matches.get_flag("simulate") {
        config.host.mode = HostMode::Simulated;
    }
    if let Some(ms) = matches.get_one::<u64>("ports-interval-ms") {
        config.polling.ports_interval_ms = *ms;
    }
    if let Some(ms) = matches.get_one::<u64>("stats-interval-ms") {
        config.polling.stats_interval_ms = *ms;
    }
    Ok(config)
}

pub fn sim_ports(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("sim-ports")
        .map(|ports| {
            ports
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
