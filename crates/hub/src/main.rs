//! hub-port-power
//!
//! Turns power on or off for one downstream port of a USB hub, for
//! power-cycling a misbehaving device without unplugging it.

use anyhow::{Context, Result};
use clap::Parser;
use common::{HubIdentity, MAX_HUB_INSTANCE, MAX_HUB_PORT, PortRequest, setup_logging};
use hub_port_power::config::{self, HubPowerConfig};
use hub_port_power::usb::{Session, ThreadSleep, switch_port_power};
use hub_port_power::Console;
use std::process::ExitCode;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "hub-port-power")]
#[command(
    author,
    version,
    about = "Set or clear the power feature on one USB hub port"
)]
#[command(long_about = "
Finds a USB hub by vendor and product ID, puts it in configuration 1 and
sets (-s 1) or clears (-s 0) the PORT_POWER feature on one downstream port.

When several hubs share the same IDs, -i picks which one. Instances are
counted from the end of the host's device list, so -i 1 usually means the
most recently attached hub. That order is decided by the operating system.

EXAMPLE:
    If lsusb lists the hub as
        Bus 002 Device 002: ID 110a:0407 Moxa Technologies Co., Ltd.

    then turn off power to port 2 and on for port 3 with
        hub-port-power -v 110a -p 0407 -n 2 -s 0
        hub-port-power -v 110a -p 0407 -n 3 -s 1

CONFIGURATION:
    Retry counts and timeouts are read from the first file found of:
    1. Path specified with --config
    2. ~/.config/hub-port-power/config.toml
    3. /etc/hub-port-power/config.toml
    4. Built-in defaults
")]
struct Args {
    /// USB Vendor ID (base 16), e.g. -v 0424 for SMSC
    #[arg(
        short = 'v',
        value_name = "VendorID",
        value_parser = parse_id,
        required_unless_present = "save_config"
    )]
    vendor_id: Option<u16>,

    /// USB Product ID (base 16), e.g. -p 2514 for a 2514 hub
    #[arg(
        short = 'p',
        value_name = "ProductID",
        value_parser = parse_id,
        required_unless_present = "save_config"
    )]
    product_id: Option<u16>,

    /// Use the Instance'th hub matching -v, -p
    #[arg(
        short = 'i',
        value_name = "Instance",
        default_value_t = 1,
        value_parser = clap::value_parser!(u8).range(1..=MAX_HUB_INSTANCE as i64)
    )]
    instance: u8,

    /// Hub port number to affect
    #[arg(
        short = 'n',
        value_name = "PortNum",
        value_parser = clap::value_parser!(u8).range(1..=MAX_HUB_PORT as i64),
        required_unless_present = "save_config"
    )]
    port: Option<u8>,

    /// Port power setting (0 = turn off, 1 = turn on)
    #[arg(
        short = 's',
        value_name = "PowerSetting",
        value_parser = clap::value_parser!(u8).range(0..=1),
        required_unless_present = "save_config"
    )]
    power: Option<u8>,

    /// Quiet; suppress progress output
    #[arg(short = 'q')]
    quiet: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn parse_id(s: &str) -> std::result::Result<u16, String> {
    common::parse_hex_id(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let program = program_name();
    match run(args, &program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_line(&program, &e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, program: &str) -> Result<()> {
    if args.save_config {
        let path = HubPowerConfig::default_path();
        HubPowerConfig::default()
            .save(&path)
            .context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = match args.config {
        Some(ref path) => HubPowerConfig::load(Some(config::expand_path(path)))
            .context("Failed to load configuration")?,
        None => HubPowerConfig::load_or_default().context("Failed to load configuration")?,
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.log_level);
    setup_logging(log_level)?;

    let (identity, request) = requested_port(&args)?;
    debug!("Request: hub {}, port {:?}", identity, request);

    let console = Console::new(program, args.quiet);

    // Dropped on every return below, which releases libusb
    let session = Session::open(config.libusb_log_level()?, &console)?;

    let report = switch_port_power(
        &session,
        &identity,
        &request,
        &config.plan(),
        ThreadSleep,
        &console,
    )?;
    info!(
        "Done: list entry {}, {:?}, {} transfer(s)",
        report.entry, report.configuration, report.attempts
    );

    Ok(())
}

/// Turn parsed arguments into validated core inputs
fn requested_port(args: &Args) -> common::Result<(HubIdentity, PortRequest)> {
    let missing = |what: &str| common::Error::Usage(format!("{} required", what));

    let identity = HubIdentity::new(
        args.vendor_id.ok_or_else(|| missing("-v VendorID"))?,
        args.product_id.ok_or_else(|| missing("-p ProductID"))?,
        args.instance,
    )?;
    let request = PortRequest::new(
        args.port.ok_or_else(|| missing("-n PortNum"))?,
        args.power.ok_or_else(|| missing("-s PowerSetting"))? == 1,
    )?;

    Ok((identity, request))
}

/// The one line printed for a fatal error, naming the stage that failed
fn failure_line(program: &str, err: &anyhow::Error) -> String {
    let stage = err
        .downcast_ref::<common::Error>()
        .map_or("startup", common::Error::stage);
    format!("{}: {} failed: {:#}", program, stage, err)
}

fn program_name() -> String {
    std::env::args()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hub-port-power".to_string())
}
