//! LED Lattice animation server
//!
//! Runs the graph-traversal patterns on the sculpture and accepts control
//! commands over HTTP. The render loop and the HTTP server share one
//! single-threaded tokio runtime; the loop yields between ticks so requests
//! are served in the gaps.
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/led-lattice-rs --pattern comets --port 8080
//! ```

use clap::Parser;
use led_lattice_rs::frame::{FrameSink, HeadlessSink};
use led_lattice_rs::patterns::{ParameterSnapshot, PatternKind};
use led_lattice_rs::render::{DisplayStatus, Renderer, render_loop};
use led_lattice_rs::server::{self, AppState};
use led_lattice_rs::topology::Topology;
use led_lattice_rs::setup_signal_handler;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::error::Error;
use std::future::IntoFuture;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// LED Lattice animation server
#[derive(Parser)]
#[command(name = "led-lattice-rs")]
#[command(about = "Graph-traversal LED animations with an HTTP control API")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Pattern to start with
    #[arg(long, value_enum, default_value_t = PatternKind::Comets)]
    pattern: PatternKind,

    /// Starting hue (0-255)
    #[arg(long, default_value = "0")]
    hue: u8,

    /// Saturation (0-255)
    #[arg(long, default_value = "255")]
    saturation: u8,

    /// Brightness (0-255)
    #[arg(long, default_value = "128")]
    brightness: u8,

    /// Speed (0-255)
    #[arg(long, default_value = "50")]
    speed: u8,

    /// Base time between frames, in milliseconds
    #[arg(long, default_value = "20")]
    frame_ms: u64,

    /// Seed for the random source (random each run if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Rows on the preview LED panel
    #[cfg_attr(not(feature = "hardware"), allow(dead_code))]
    #[arg(long, default_value = "64")]
    rows: u32,

    /// Columns on the preview LED panel
    #[cfg_attr(not(feature = "hardware"), allow(dead_code))]
    #[arg(long, default_value = "64")]
    cols: u32,

    /// Run without the LED panel, logging frame summaries instead
    #[cfg_attr(not(feature = "hardware"), allow(dead_code))]
    #[arg(long)]
    headless: bool,
}

/// Frames between headless log lines.
const HEADLESS_LOG_EVERY: u64 = 500;

/// Open the LED panel, or fall back to a logging sink when asked to.
#[cfg(feature = "hardware")]
fn open_sink(args: &Args) -> Result<Box<dyn FrameSink>, Box<dyn Error>> {
    use led_lattice_rs::hardware::MatrixSink;
    use led_lattice_rs::{PanelConfig, StripLayout};

    if args.headless {
        return Ok(Box::new(HeadlessSink::new(HEADLESS_LOG_EVERY)));
    }
    let panel = PanelConfig::new(args.rows, args.cols);
    Ok(Box::new(MatrixSink::new(panel, StripLayout::default())?))
}

#[cfg(not(feature = "hardware"))]
fn open_sink(_args: &Args) -> Result<Box<dyn FrameSink>, Box<dyn Error>> {
    Ok(Box::new(HeadlessSink::new(HEADLESS_LOG_EVERY)))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    Topology::sculpture().validate()?;

    let params = ParameterSnapshot {
        hue: args.hue,
        saturation: args.saturation,
        brightness: args.brightness,
        speed: args.speed,
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let frame_interval = Duration::from_millis(args.frame_ms);

    tracing::info!("LED Lattice Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Pattern: {}", args.pattern);
    tracing::info!("Parameters: {:?}", params);
    tracing::info!("Port: {}", args.port);

    let running = setup_signal_handler();
    let (tx, rx) = mpsc::channel();
    let status = Arc::new(Mutex::new(DisplayStatus::new(args.pattern, params)));

    let app = server::create_router(AppState {
        command_tx: tx,
        status: status.clone(),
    });

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);

    let renderer = Renderer::new(open_sink(&args)?, args.pattern, params, rng, status);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        _ = render_loop(renderer, rx, running, frame_interval) => {}
    }

    println!("\nShutting down cleanly.");
    Ok(())
}
