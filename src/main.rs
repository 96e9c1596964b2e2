use clap::{Parser, Subcommand, ValueEnum};
use serial_links::config::{Config, ConfigLoader, LogFormat, LoggingConfig};
use serial_links::{
    list_available_ports, list_port_details, Link, PortRegistry, ReceiveEvent, ReceiveMode, Slot,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial-links",
    version,
    about = "Drive two bidirectional serial links from the command line.",
    long_about = "Each link is a transmit port and a receive port. Incoming data is split into portions whenever the line goes quiet."
)]
struct Cli {
    /// Configuration file (defaults to the standard search locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Baud rate for every port opened by this command
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    /// Read timeout in seconds
    #[arg(short, long, global = true)]
    timeout: Option<f64>,

    /// Append the terminator byte to sent payloads
    #[arg(long, global = true)]
    terminator: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial devices present on this host
    Ports {
        /// Include USB identifiers and device kind
        #[arg(long)]
        details: bool,
        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Send a payload on a link's transmit port
    Send {
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        link: u8,
        /// Transmit device
        #[arg(long)]
        tx: String,
        data: String,
    },
    /// Print incoming portions on a link's receive port until Ctrl+C
    Monitor {
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        link: u8,
        /// Receive device
        #[arg(long)]
        rx: String,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Send a payload from one device and wait for it on another
    Loopback {
        #[arg(long)]
        tx: String,
        #[arg(long)]
        rx: String,
        data: String,
        /// Give up after this many seconds without a complete portion
        #[arg(long, default_value_t = 5.0)]
        wait: f64,
    },
    /// Show the slot table, optionally after opening ports into slots
    Describe {
        /// Open a device into a slot, as SLOT=PORT (slot 1-4); repeatable
        #[arg(long = "assign", value_parser = parse_assignment)]
        assignments: Vec<(Slot, String)>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Portion,
    Cumulative,
}

impl From<ModeArg> for ReceiveMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Portion => ReceiveMode::Portion,
            ModeArg::Cumulative => ReceiveMode::Cumulative,
        }
    }
}

fn parse_assignment(value: &str) -> Result<(Slot, String), String> {
    let (slot, port) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SLOT=PORT, got '{value}'"))?;
    let number: u8 = slot
        .trim()
        .parse()
        .map_err(|_| format!("'{slot}' is not a slot number"))?;
    let slot = Slot::try_from(number).map_err(|e| e.to_string())?;
    Ok((slot, port.trim().to_string()))
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_logging(&config.logging, cli.verbose);

    let registry = PortRegistry::from_config(&config);
    let timeout = match cli.timeout {
        Some(secs) => Some(Duration::try_from_secs_f64(secs)?),
        None => None,
    };
    registry.set_parameters(cli.baud, timeout)?;
    if cli.terminator {
        registry.set_append_terminator(true);
    }

    match cli.command {
        Command::Ports { details, json } => list_ports(details, json)?,
        Command::Send { link, tx, data } => {
            let link = Link::try_from(link)?;
            registry.open_slot(&tx, link.tx_slot())?;
            let sent = registry.send(link, data.as_bytes())?;
            println!("Sent {} bytes on link {} ({})", sent, link, tx);
        }
        Command::Monitor { link, rx, mode } => {
            if let Some(mode) = mode {
                registry.set_receive_mode(mode.into());
            }
            monitor(&registry, Link::try_from(link)?, &rx).await?;
        }
        Command::Loopback { tx, rx, data, wait } => {
            loopback(&registry, &tx, &rx, data.as_bytes(), wait).await?;
        }
        Command::Describe { assignments, json } => {
            for (slot, port) in assignments {
                registry.open_slot(&port, slot)?;
            }
            let report = registry.describe();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
    }

    registry.close_all()?;
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(ConfigLoader::load_from(path)?.into_config());
    }
    Ok(match ConfigLoader::load() {
        Ok(loader) => loader.into_config(),
        Err(e) => {
            eprintln!("Warning: Failed to load config, using defaults: {}", e);
            ConfigLoader::with_defaults().into_config()
        }
    })
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

fn list_ports(details: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if details {
        let ports = list_port_details();
        if json {
            println!("{}", serde_json::to_string_pretty(&ports)?);
        } else if ports.is_empty() {
            println!("No serial ports found");
        } else {
            for port in ports {
                println!("{:<20} {:?}", port.name, port.kind);
            }
        }
        return Ok(());
    }

    let names = list_available_ports();
    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else if names.is_empty() {
        println!("No serial ports found");
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

async fn monitor(
    registry: &PortRegistry,
    link: Link,
    rx: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    registry.open_slot(rx, link.rx_slot())?;

    let (tx_events, mut events) = mpsc::unbounded_channel();
    registry.start_receiving(link, tx_events)?;
    info!("Monitoring {} on link {}, Ctrl+C to stop", rx, link);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ReceiveEvent::Data { chunk, .. }) => {
                    write!(stdout, "{}", chunk.escape_ascii())?;
                    stdout.flush()?;
                }
                Some(ReceiveEvent::PortionEnd { portion }) => {
                    writeln!(stdout, "\n-- {} bytes --", portion.len())?;
                }
                Some(ReceiveEvent::Fault { port, message }) => {
                    warn!("Receive on {} stopped: {}", port, message);
                    break;
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                println!("\nSignal received, stopping receive session...");
                break;
            }
        }
    }

    registry.end_receiving()?;
    match registry.take_fault() {
        Some(fault) => Err(fault.into()),
        None => Ok(()),
    }
}

async fn loopback(
    registry: &PortRegistry,
    tx: &str,
    rx: &str,
    data: &[u8],
    wait: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let link = Link::One;
    registry.open_slot(tx, link.tx_slot())?;
    registry.open_slot(rx, link.rx_slot())?;

    let (tx_events, mut events) = mpsc::unbounded_channel();
    registry.start_receiving(link, tx_events)?;
    let sent = registry.send(link, data)?;
    info!("Sent {} bytes from {}, waiting on {}", sent, tx, rx);

    let deadline = Duration::try_from_secs_f64(wait)?;
    let received = tokio::time::timeout(deadline, async {
        while let Some(event) = events.recv().await {
            match event {
                ReceiveEvent::PortionEnd { portion } => return Some(portion),
                ReceiveEvent::Fault { .. } => return None,
                ReceiveEvent::Data { .. } => {}
            }
        }
        None
    })
    .await;
    registry.end_receiving()?;

    match received {
        Ok(Some(portion)) => {
            println!("Received {} bytes: {}", portion.len(), portion.escape_ascii());
            if portion.starts_with(data) {
                println!("Loopback OK");
                Ok(())
            } else {
                Err("received data does not match what was sent".into())
            }
        }
        Ok(None) => match registry.take_fault() {
            Some(fault) => Err(fault.into()),
            None => Err("receive session ended without data".into()),
        },
        Err(_) => Err(format!("no portion received within {wait}s").into()),
    }
}
