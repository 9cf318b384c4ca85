//! # Barcode Scanner
//!
//! Terminal application: read barcodes, look them up, show the product.

use std::sync::Arc;

use clap::Parser;
use scanner_core::{PresentationState, ScanSessionController};
use scanner_lookup::LookupClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scanner_cli::{render_json, render_text, CliArgs, Command, LineDecoderEngine, ScannerConfig};

/// Initialize structured tracing on stderr with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,scanner_core=debug,scanner_lookup=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scanner_core=debug,scanner_lookup=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn print_state(state: &PresentationState, json: bool) {
    if json {
        match render_json(state) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!("Failed to render state: {e}"),
        }
    } else {
        print!("{}", render_text(state));
    }
}

/// Print every published presentation update until the session closes.
async fn render_updates(mut updates: watch::Receiver<PresentationState>, json: bool) {
    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();
        print_state(&state, json);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = ScannerConfig::from(args);

    tracing::info!("Product API: {}", config.lookup.base_url);
    match &config.device {
        Some(device) => tracing::info!("Reading barcodes from {}", device.display()),
        None => tracing::info!("Reading barcodes from stdin"),
    }

    let lookup = LookupClient::with_config(config.lookup.clone())?;
    let engine = LineDecoderEngine::new(config.device.clone());
    let mut controller =
        ScanSessionController::new(Arc::new(engine.clone()), Arc::new(lookup), config.session);

    let controls = controller.controls();
    let updates = controller.subscribe();
    let renderer = tokio::spawn(render_updates(updates.clone(), config.json));
    let session = tokio::spawn(controller.run());

    print_state(&updates.borrow(), config.json);
    if config.autostart {
        controls.start()?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Start => controls.start()?,
            Command::Stop => controls.stop()?,
            Command::Dismiss => controls.dismiss()?,
            Command::Status => print_state(&updates.borrow(), config.json),
            Command::Help => println!("{}", scanner_cli::HELP),
            Command::Quit => break,
            Command::Scan(code) => {
                if config.device.is_some() {
                    tracing::warn!("Ignoring typed input while reading from a device: {code:?}");
                } else if !engine.feed_line(&code) {
                    tracing::warn!("Not scanning; type `start` first");
                }
            }
        }
    }

    controls.shutdown()?;
    session.await?;
    renderer.await?;

    tracing::info!("Barcode scanner exited");
    Ok(())
}
