//! Camera collaborators for the capture screen.
//!
//! This module provides:
//! - The provider seams [`CameraProvider`], [`ProviderHandle`] and [`StillCapture`]
//! - Stream descriptions via [`PreviewStream`], [`CaptureStream`] and [`CameraSelector`]
//! - Concrete providers [`TestPatternProvider`] and [`CommandProvider`]
//! - The blocking-work thread [`CaptureWorker`]

mod command;
mod provider;
mod test_pattern;
mod types;
mod worker;

pub use command::{CommandCapture, CommandProvider, OUTPUT_PLACEHOLDER};
pub use provider::{CameraProvider, ProviderHandle, StillCapture};
pub use test_pattern::{TestPatternCamera, TestPatternProvider};
pub use types::{
    CameraError, CameraSelector, CaptureMode, CaptureStream, LensFacing, PreviewStream,
    Resolution,
};
pub use worker::{CaptureWorker, Job, WorkerError};
