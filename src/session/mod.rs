//! Capture session lifecycle.
//!
//! - [`CaptureSessionController`] owns permission gating, camera binding and capture
//! - [`run_host`] is the sequential event loop that drives it
//! - [`UiNotice`] is what the surrounding UI gets to see

mod controller;
mod error;
mod events;
mod host;
mod output;

pub use controller::{CaptureSessionController, Collaborators, ControllerConfig, SessionState};
pub use error::SessionError;
pub use events::{CaptureOutcome, HostEvent, MainContext, NoticeSender, UiNotice};
pub use host::run_host;
pub use output::{
    capture_file_name, default_output_dir, FileLocator, OutputDirectory, CAPTURE_EXTENSION,
    TIMESTAMP_FORMAT,
};
