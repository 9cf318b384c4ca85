//! Decoder engine capability.
//!
//! The engine owns the camera and the frame-decoding loop. The session
//! controller starts it with a [`DecodeSink`] and later stops it through the
//! returned [`DecoderHandle`]. Engines report every decode attempt through the
//! sink; the controller decides what to do with it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::ScanResult;
use crate::event::{DecodeEvent, Generation, SessionEvent};

/// Default decode attempts per second.
pub const DEFAULT_SCAN_RATE_FPS: u32 = 15;

/// Default edge length of the square decode region, in pixels.
pub const DEFAULT_REGION_EDGE: u32 = 350;

/// Which camera to bind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed away from the user.
    #[default]
    Environment,
    /// Front camera.
    User,
}

/// Camera selection passed to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConstraint {
    /// Requested facing mode.
    pub facing_mode: FacingMode,
}

/// Size of the region of each frame the engine tries to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for RegionSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_REGION_EDGE,
            height: DEFAULT_REGION_EDGE,
        }
    }
}

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Maximum decode attempts per second.
    pub scan_rate_fps: u32,
    /// Decode region size.
    pub decode_region: RegionSize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            scan_rate_fps: DEFAULT_SCAN_RATE_FPS,
            decode_region: RegionSize::default(),
        }
    }
}

impl DecoderConfig {
    /// Minimum spacing between two decode attempts.
    ///
    /// A rate of zero is treated as one attempt per second.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.scan_rate_fps.max(1)
    }
}

/// Where an engine delivers its per-frame results.
///
/// Each sink is bound to the engine instance it was created for; events sent
/// after that instance has been replaced are ignored by the controller.
#[derive(Debug, Clone)]
pub struct DecodeSink {
    generation: Generation,
    tx: UnboundedSender<SessionEvent>,
}

impl DecodeSink {
    pub(crate) fn new(generation: Generation, tx: UnboundedSender<SessionEvent>) -> Self {
        Self { generation, tx }
    }

    /// Report one decode attempt. Returns `false` if the session is gone.
    pub fn emit(&self, event: DecodeEvent) -> bool {
        self.tx
            .send(SessionEvent::Decode {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    /// The engine instance this sink belongs to.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True once the session controller has stopped receiving events.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Starts decoder engines bound to a camera.
#[async_trait]
pub trait DecoderEngine: Send + Sync {
    /// Bind the camera and begin decoding frames into `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera cannot be opened or the engine fails to
    /// initialize. No engine is running in that case.
    async fn start(
        &self,
        camera: CameraConstraint,
        config: DecoderConfig,
        sink: DecodeSink,
    ) -> ScanResult<Box<dyn DecoderHandle>>;
}

/// A running decoder engine.
#[async_trait]
pub trait DecoderHandle: Send {
    /// Stop decoding and release the camera.
    ///
    /// Stopping an engine that already stopped must succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if teardown failed. The caller treats the engine as
    /// gone regardless.
    async fn stop(&mut self) -> ScanResult<()>;
}
