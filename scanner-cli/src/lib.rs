//! # Barcode Scanner
//!
//! Terminal host for the scan-session controller.
//!
//! Serial barcode readers (USB CDC, `/dev/ttyACM0`) and keyboard-wedge readers
//! both deliver one decoded code per line. This crate wraps such a line source
//! as a [`DecoderEngine`](scanner_core::DecoderEngine), wires it to the Open
//! Food Facts lookup client and renders the presentation state to stdout.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p scanner-cli -- --autostart
//! cargo run -p scanner-cli -- --device /dev/ttyACM0 --json
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ScannerConfig` - Runtime configuration derived from the arguments
//! - `LineDecoderEngine` - Decoder engine fed by a device or by stdin
//! - `Command` - User controls typed on stdin

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod command;
mod engine;
mod render;

pub use command::{Command, HELP};
pub use engine::{LineDecoderEngine, RateGate};
pub use render::{render_json, render_text};

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use scanner_core::engine::{DEFAULT_REGION_EDGE, DEFAULT_SCAN_RATE_FPS};
use scanner_core::{CameraConstraint, DecoderConfig, FacingMode, RegionSize, SessionConfig};
use scanner_lookup::{LookupConfig, DEFAULT_LOOKUP_URL};

/// Command-line arguments for barcode-scanner.
#[derive(Debug, Clone, Parser)]
#[command(name = "barcode-scanner")]
#[command(about = "Scan product barcodes and look them up on Open Food Facts")]
#[command(version)]
pub struct CliArgs {
    /// Product API base URL
    #[arg(long, env = "SCANNER_LOOKUP_URL", default_value = DEFAULT_LOOKUP_URL)]
    pub lookup_url: String,

    /// Serial barcode reader to read codes from (e.g. /dev/ttyACM0).
    /// Codes typed on stdin are used when omitted.
    #[arg(long, env = "SCANNER_DEVICE")]
    pub device: Option<PathBuf>,

    /// Maximum decode attempts per second
    #[arg(long, default_value_t = DEFAULT_SCAN_RATE_FPS)]
    pub fps: u32,

    /// Decode region width in pixels
    #[arg(long, default_value_t = DEFAULT_REGION_EDGE)]
    pub region_width: u32,

    /// Decode region height in pixels
    #[arg(long, default_value_t = DEFAULT_REGION_EDGE)]
    pub region_height: u32,

    /// Use the user-facing camera instead of the environment-facing one
    #[arg(long)]
    pub front_camera: bool,

    /// Lookup request timeout in seconds (no timeout when omitted)
    #[arg(long, env = "SCANNER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Print presentation updates as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Start scanning immediately
    #[arg(long)]
    pub autostart: bool,
}

/// Runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct ScannerConfig {
    /// Product API client settings.
    pub lookup: LookupConfig,
    /// Session and decoder settings.
    pub session: SessionConfig,
    /// Serial reader path; stdin feeds the decoder when `None`.
    pub device: Option<PathBuf>,
    /// Render as JSON instead of text.
    pub json: bool,
    /// Start scanning at launch.
    pub autostart: bool,
}

impl From<CliArgs> for ScannerConfig {
    fn from(args: CliArgs) -> Self {
        let facing_mode = if args.front_camera {
            FacingMode::User
        } else {
            FacingMode::Environment
        };
        Self {
            lookup: LookupConfig {
                base_url: args.lookup_url,
                timeout: args.timeout_secs.map(Duration::from_secs),
                ..LookupConfig::default()
            },
            session: SessionConfig {
                camera: CameraConstraint { facing_mode },
                decoder: DecoderConfig {
                    scan_rate_fps: args.fps,
                    decode_region: RegionSize {
                        width: args.region_width,
                        height: args.region_height,
                    },
                },
            },
            device: args.device,
            json: args.json,
            autostart: args.autostart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_args() {
        let args = CliArgs::try_parse_from(["barcode-scanner"]).unwrap();
        let config = ScannerConfig::from(args);
        assert_eq!(config.session, SessionConfig::default());
        assert!(config.lookup.timeout.is_none());
        assert!(config.device.is_none());
        assert!(!config.json);
    }

    #[test]
    fn test_args_map_into_config() {
        let args = CliArgs::try_parse_from([
            "barcode-scanner",
            "--lookup-url",
            "http://localhost:9000",
            "--device",
            "/dev/ttyACM0",
            "--fps",
            "5",
            "--region-width",
            "250",
            "--front-camera",
            "--timeout-secs",
            "10",
            "--json",
        ])
        .unwrap();
        let config = ScannerConfig::from(args);
        assert_eq!(config.lookup.base_url, "http://localhost:9000");
        assert_eq!(config.lookup.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.session.decoder.scan_rate_fps, 5);
        assert_eq!(config.session.decoder.decode_region.width, 250);
        assert_eq!(config.session.decoder.decode_region.height, 350);
        assert_eq!(config.session.camera.facing_mode, FacingMode::User);
        assert_eq!(config.device, Some(PathBuf::from("/dev/ttyACM0")));
        assert!(config.json);
    }
}
