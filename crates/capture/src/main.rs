//! usb-capture
//!
//! Captures raw bulk IN data from a USB device into a file, one fixed-size read
//! at a time, and reports what the device delivered.

mod capture;
mod config;
mod device;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use common::setup_logging;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{error, info};

use capture::run_capture;
use config::{CaptureConfig, parse_endpoint};
use device::ClaimedDevice;

#[derive(Parser, Debug)]
#[command(name = "usb-capture")]
#[command(author, version, about = "Capture raw USB bulk IN data")]
#[command(long_about = "
Reads a bulk IN endpoint repeatedly and writes the raw bytes to a file.
Timeouts are not errors: whatever arrived before the timeout is kept.
Any other transfer error ends the capture.

EXAMPLES:
    # Capture with the configured defaults
    usb-capture

    # 50 reads of 3120 bytes from endpoint 0x81 of a specific device
    usb-capture --device 0x0582:0x000c --interface 1 --alt-setting 1 \\
        --endpoint 0x81 --length 3120 --reads 50 --output capture.raw

CONFIGURATION:
    The tool looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/usb-reader/capture.toml
    3. /etc/usb-reader/capture.toml
    4. Built-in defaults
    Command-line options override configuration values.
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Device to open (VID:PID, e.g. 0x0582:0x000c)
    #[arg(short, long, value_name = "VID:PID")]
    device: Option<String>,

    /// Interface to claim
    #[arg(short, long)]
    interface: Option<u8>,

    /// Alternate setting to select on the interface
    #[arg(long)]
    alt_setting: Option<u8>,

    /// Bulk IN endpoint address (e.g. 0x81)
    #[arg(short, long, value_parser = parse_endpoint)]
    endpoint: Option<u8>,

    /// Bytes requested per read
    #[arg(long)]
    length: Option<usize>,

    /// Per-read timeout in milliseconds (0 or less waits indefinitely)
    #[arg(short, long, allow_hyphen_values = true)]
    timeout_ms: Option<i64>,

    /// Number of reads to issue
    #[arg(short, long)]
    reads: Option<u32>,

    /// Output file for raw payloads
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut CaptureConfig) {
        if let Some(level) = self.log_level {
            config.general.log_level = level;
        }
        if let Some(device) = self.device {
            config.device.id = device;
        }
        if let Some(interface) = self.interface {
            config.device.interface = interface;
        }
        if let Some(alt_setting) = self.alt_setting {
            config.device.alt_setting = alt_setting;
        }
        if let Some(endpoint) = self.endpoint {
            config.capture.endpoint = endpoint;
        }
        if let Some(length) = self.length {
            config.capture.length = length;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.capture.timeout_ms = timeout_ms;
        }
        if let Some(reads) = self.reads {
            config.capture.reads = reads;
        }
        if let Some(output) = self.output {
            config.capture.output = Some(output);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = CaptureConfig::default();
        let path = CaptureConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let mut config = if let Some(ref path) = args.config {
        CaptureConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        CaptureConfig::load_or_default().context("Failed to load configuration")?
    };

    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    setup_logging(&config.general.log_level).context("Failed to setup logging")?;

    info!("usb-capture v{}", env!("CARGO_PKG_VERSION"));

    let (vendor_id, product_id) = config.device.vendor_product()?;
    let device = ClaimedDevice::open(vendor_id, product_id, &config.device)
        .with_context(|| format!("Failed to open device {}", config.device.id))?;

    let mut sink: Box<dyn Write> = match config.capture.output_path() {
        Some(path) => {
            info!("Writing raw data to {}", path.display());
            let file = File::create(&path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::sink()),
    };

    let report = run_capture(device.handle(), &config.capture, &mut sink)
        .context("Failed to write capture output")?;

    println!("{}", report.stats);

    match report.error {
        Some(e) => {
            error!("Capture ended early: {}", e);
            Err(anyhow!(e).context("Capture ended early"))
        }
        None => Ok(()),
    }
}
