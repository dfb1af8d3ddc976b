//! Error taxonomy for the capture session.

use crate::camera::{CameraError, WorkerError};
use crate::permissions::PermissionKind;

/// Errors that can occur while running a capture session.
///
/// Only [`SessionError::CaptureWriteFailed`] is recoverable; the others end
/// the session for the current controller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Permissions not granted by the user: {}", format_kinds(.0))]
    PermissionDenied(Vec<PermissionKind>),

    #[error("Camera provider unavailable: {0}")]
    ProviderAcquisitionFailed(#[source] CameraError),

    #[error("Use case binding failed: {0}")]
    BindingFailed(#[source] CameraError),

    #[error("Photo capture failed: {0}")]
    CaptureWriteFailed(String),

    #[error("Capture worker unavailable: {0}")]
    Worker(#[from] WorkerError),
}

impl SessionError {
    /// Whether a later `capture()` may still succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::CaptureWriteFailed(_))
    }
}

fn format_kinds(kinds: &[PermissionKind]) -> String {
    kinds
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(", ")
}
