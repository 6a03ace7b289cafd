//! Command line tool for the Estia heat pump serial bus.

mod config;
mod error;
mod replay;
mod serial;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use estia_frame::{Mode, Operation, Zone, DATA_TYPE_MODE_CHANGE, DATA_TYPE_OPERATION_SWITCH};
use estia_serial::{Clock, EstiaSerial, SniffState, Transport};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::RunnerConfig;
use crate::error::{Result, RunnerError};
use crate::serial::{SerialTransport, SystemClock};

/// Pause between sniff ticks unless a frame is waiting (milliseconds).
const TICK_SLEEP_MS: u64 = 5;

#[derive(Parser, Debug)]
#[command(name = "estia", version, about = "Sniff and drive an Estia heat pump serial bus")]
struct Cli {
    /// Serial device, overriding the config file
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every frame seen on the bus
    Sniff {
        /// Print decoded status snapshots as YAML
        #[arg(long)]
        status: bool,
    },
    /// Poll sensor values
    Poll {
        /// Comma separated sensor names, defaulting to the configured list
        #[arg(long, value_delimiter = ',')]
        sensors: Vec<String>,
        /// Number of rounds, 0 for no limit
        #[arg(long, default_value_t = 1)]
        rounds: u32,
        /// Seconds between rounds
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
    /// Read a single sensor
    Request { name: String },
    /// Switch a mode (auto, quiet, night) or operation (heating, hot_water)
    SetMode { name: String, state: OnOff },
    /// Set a target temperature for a zone (heating, hot_water)
    SetTemp { zone: Zone, celsius: u8 },
    /// Start or stop a forced defrost
    Defrost { state: OnOff },
    /// Decode a captured hex dump without a serial port
    Replay { file: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OnOff {
    On,
    Off,
}

impl From<OnOff> for bool {
    fn from(state: OnOff) -> bool {
        state == OnOff::On
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    estia_serial::metrics::describe_metrics();

    let config = RunnerConfig::load(cli.config.as_deref())?.with_port(cli.port);

    if let Command::Replay { file } = &cli.command {
        return run_replay(file, &config);
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))?;
    }

    let transport = SerialTransport::new(config.port()?);
    let mut estia = EstiaSerial::new(transport, SystemClock::new(), config.estia.clone());
    estia.begin()?;
    info!(port = config.port()?, "connected");

    match cli.command {
        Command::Sniff { status } => sniff(&mut estia, &stop, status),
        Command::Poll {
            sensors,
            rounds,
            interval,
        } => poll(&mut estia, &stop, &sensors, rounds, interval),
        Command::Request { name } => {
            match estia.request_data_by_name(&name) {
                Ok(value) => println!("{name}: {value}"),
                Err(e) => warn!(sensor = %name, code = e.code(), "request failed: {e}"),
            }
            Ok(())
        }
        Command::SetMode { name, state } => {
            let expected = if name.parse::<Mode>().is_ok() {
                DATA_TYPE_MODE_CHANGE
            } else if name.parse::<Operation>().is_ok() {
                DATA_TYPE_OPERATION_SWITCH
            } else {
                return Err(RunnerError::UnknownName(name));
            };
            estia.set_mode(&name, state.into());
            report_ack(deliver(&mut estia, &stop), expected);
            Ok(())
        }
        Command::SetTemp { zone, celsius } => {
            // The heating frame carries the other targets from the latest status
            if zone == Zone::Heating {
                wait_for_status(&mut estia, &stop);
            }
            if !estia.set_temperature(zone, celsius) {
                return Err(RunnerError::CommandRejected);
            }
            report_ack(
                deliver(&mut estia, &stop),
                estia_frame::DATA_TYPE_TEMPERATURE_CHANGE,
            );
            Ok(())
        }
        Command::Defrost { state } => {
            estia.force_defrost(state.into());
            report_ack(
                deliver(&mut estia, &stop),
                estia_frame::DATA_TYPE_FORCE_DEFROST,
            );
            Ok(())
        }
        Command::Replay { .. } => Ok(()),
    }
}

fn run_replay(file: &std::path::Path, config: &RunnerConfig) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let bytes = replay::parse_hex_dump(&text)?;
    let frames = replay::replay(&bytes, config.estia.clone());
    info!(bytes = bytes.len(), frames = frames.len(), "replayed capture");
    for replayed in frames {
        match replayed.message {
            Ok(message) => println!("{}  {}", replayed.frame, message),
            Err(e) => println!("{}  invalid ({}): {}", replayed.frame, e.code(), e),
        }
    }
    Ok(())
}

/// Tick the engine once, sleeping briefly unless a frame is waiting.
fn tick<T: Transport, C: Clock>(estia: &mut EstiaSerial<T, C>) -> SniffState {
    let state = estia.sniff();
    if state != SniffState::FramePending {
        estia.clock().sleep_ms(TICK_SLEEP_MS);
    }
    state
}

fn sniff<T: Transport, C: Clock>(
    estia: &mut EstiaSerial<T, C>,
    stop: &AtomicBool,
    print_status: bool,
) -> Result<()> {
    while !stop.load(Ordering::SeqCst) {
        if tick(estia) == SniffState::FramePending {
            while let Some(frame) = estia.next_frame() {
                match estia_frame::Message::decode(frame.as_bytes()) {
                    Ok(message) => println!("{frame}  {message}"),
                    Err(e) => println!("{frame}  invalid: {e}"),
                }
            }
        }
        if let Some(ack) = estia.take_ack() {
            debug!("ack 0x{ack:04x}");
        }
        if print_status {
            let (status, fresh) = estia.take_status();
            if fresh {
                println!("{}", serde_yaml::to_string(&status)?);
            }
        }
    }
    Ok(())
}

fn poll<T: Transport, C: Clock>(
    estia: &mut EstiaSerial<T, C>,
    stop: &AtomicBool,
    sensors: &[String],
    rounds: u32,
    interval_secs: u64,
) -> Result<()> {
    let names = if sensors.is_empty() {
        estia.config().sensors.clone()
    } else {
        sensors.to_vec()
    };
    let mut completed = 0;
    while !stop.load(Ordering::SeqCst) {
        if !estia.request_sensors_from(&names) {
            continue;
        }
        completed += 1;
        for (name, reading) in estia.sensors().iter() {
            if reading.is_error() {
                println!("{name}: error {}", reading.value);
            } else {
                println!("{name}: {}", reading.scaled());
            }
        }
        if rounds != 0 && completed >= rounds {
            break;
        }
        let resume = estia.clock().now_ms() + interval_secs * 1000;
        while !stop.load(Ordering::SeqCst) && estia.clock().now_ms() < resume {
            tick(estia);
        }
    }
    Ok(())
}

/// Wait up to a few heartbeat periods for the first status frame.
fn wait_for_status<T: Transport, C: Clock>(estia: &mut EstiaSerial<T, C>, stop: &AtomicBool) {
    let deadline = estia.clock().now_ms() + 5_000;
    while !stop.load(Ordering::SeqCst) && estia.clock().now_ms() < deadline {
        tick(estia);
        while estia.next_frame().is_some() {}
        if estia.status().1 {
            return;
        }
    }
    warn!("no status seen within 5s");
}

/// Run the engine until the command queue drains, returning every ack seen.
fn deliver<T: Transport, C: Clock>(estia: &mut EstiaSerial<T, C>, stop: &AtomicBool) -> Vec<u16> {
    let mut acks = Vec::new();
    while !stop.load(Ordering::SeqCst) && estia.pending_commands() > 0 {
        tick(estia);
        while estia.next_frame().is_some() {}
        acks.extend(estia.take_ack());
    }
    acks
}

fn report_ack(acks: Vec<u16>, expected: u16) {
    if acks.contains(&expected) {
        info!("command acknowledged");
    } else {
        warn!(?acks, "command was not acknowledged");
    }
}
