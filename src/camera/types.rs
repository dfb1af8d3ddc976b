//! Camera types and stream descriptions.

use std::fmt;

use serde::Deserialize;

/// Stream resolution hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// VGA (640x480)
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// HD (1280x720) - default for stills
    pub const HD: Resolution = Resolution {
        width: 1280,
        height: 720,
    };

    /// Largest width or height a stream may request.
    pub const MAX_DIMENSION: u32 = 8192;

    /// Both dimensions are non-zero and within [`Self::MAX_DIMENSION`].
    pub fn is_valid(&self) -> bool {
        (1..=Self::MAX_DIMENSION).contains(&self.width)
            && (1..=Self::MAX_DIMENSION).contains(&self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Which way the selected lens points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LensFacing {
    #[default]
    Back,
    Front,
}

impl LensFacing {
    pub fn name(&self) -> &'static str {
        match self {
            LensFacing::Back => "back",
            LensFacing::Front => "front",
        }
    }
}

/// Camera selection policy handed to the provider at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSelector {
    pub lens_facing: LensFacing,
}

impl CameraSelector {
    /// Rear-facing camera.
    pub const DEFAULT_BACK: CameraSelector = CameraSelector {
        lens_facing: LensFacing::Back,
    };

    pub fn new(lens_facing: LensFacing) -> Self {
        Self { lens_facing }
    }
}

impl Default for CameraSelector {
    fn default() -> Self {
        Self::DEFAULT_BACK
    }
}

/// Trade-off between shutter latency and image fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMode {
    /// Favor responsiveness over image quality
    #[default]
    MinimizeLatency,
    /// Favor image quality over responsiveness
    MaximizeQuality,
}

impl CaptureMode {
    /// JPEG quality used by encoders honoring the mode.
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            CaptureMode::MinimizeLatency => 75,
            CaptureMode::MaximizeQuality => 95,
        }
    }
}

/// Description of the live preview stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewStream {
    pub resolution: Resolution,
}

impl PreviewStream {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }
}

/// Description of the still-capture stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureStream {
    pub mode: CaptureMode,
    pub resolution: Resolution,
}

impl CaptureStream {
    pub fn new(mode: CaptureMode, resolution: Resolution) -> Self {
        Self { mode, resolution }
    }
}

/// Errors raised by camera providers.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("Failed to acquire camera provider: {0}")]
    ProviderUnavailable(String),

    #[error("No {} camera available", .0.name())]
    LensUnavailable(LensFacing),

    #[error("Failed to bind camera streams: {0}")]
    BindRejected(String),

    #[error("Failed to write capture to '{path}': {message}")]
    WriteFailed { path: String, message: String },

    #[error("Capture command failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
