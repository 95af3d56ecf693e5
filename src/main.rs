use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

mod config;

use config::Config;
use neopixel_spi::{CaptureTransport, Color, SerialTransport, Strip, Transport};

#[derive(Parser)]
#[command(name = "neopixel_spi")]
#[command(about = "Show a frame on an addressable LED strip through an SPI serial adapter", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON)
    config: String,

    /// Enable debug output (per-frame summaries)
    #[arg(long)]
    debug: bool,

    /// Enable detailed debug (hex dumps every frame)
    #[arg(long)]
    ddebug: bool,

    /// Encode without opening a device and print the frame as hex
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.ddebug {
        LevelFilter::Trace
    } else if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config_data = fs::read_to_string(&cli.config)
        .context(format!("Failed to read config {}", cli.config))?;
    let config = Config::from_json(&config_data)
        .context(format!("Invalid config {}", cli.config))?;

    if cli.dry_run {
        let strip = run(&config, CaptureTransport::new(), None)?;
        let hex: String = strip
            .transport()
            .last_write()
            .unwrap_or_default()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", hex);
        return Ok(());
    }

    let transport = match &config.port {
        Some(port) => SerialTransport::open(port, config.frequency),
        None => SerialTransport::open_default(config.frequency),
    }
    .context("Failed to open LED adapter")?;
    info!("Using adapter {}", transport.path());

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::Relaxed);
    }) {
        log::warn!("Could not set Ctrl-C handler: {}", e);
    }

    let strip = run(&config, transport, Some(running))?;
    strip.close().context("Failed to close LED adapter")?;
    Ok(())
}

/// Show the configured frame once, or keep refreshing it until `running` clears
fn run<T: Transport>(
    config: &Config,
    transport: T,
    running: Option<Arc<AtomicBool>>,
) -> Result<Strip<T>> {
    let mut strip = Strip::new(config.led_count, transport, config.pixel_format, config.frequency)?;
    config.apply(&mut strip)?;
    strip.show().context("Failed to show frame")?;

    let (Some(period), Some(running)) = (config.refresh_period()?, running) else {
        return Ok(strip);
    };

    info!("Refreshing every {:?} (Ctrl-C to stop)", period);
    while running.load(Ordering::Relaxed) {
        thread::sleep(period);
        strip.show().context("Failed to show frame")?;
    }

    // Turn the strip off on the way out
    info!("Turning off LEDs...");
    strip.fill(Color::BLACK);
    strip.show().context("Failed to blank strip")?;
    Ok(strip)
}
