//! Messages exchanged between the controller, the host loop and the UI.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::output::FileLocator;
use crate::camera::{CameraError, ProviderHandle};

/// Result of one capture, delivered on the host's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Saved(FileLocator),
    Failed(String),
}

/// Everything the host's main event loop processes, in arrival order.
pub enum HostEvent {
    /// Answer to an outstanding permission request
    PermissionResult { granted: bool },
    /// Camera provider acquisition finished
    ProviderAcquired {
        attempt: u64,
        result: Result<Arc<dyn ProviderHandle>, CameraError>,
    },
    /// A capture job finished on the worker
    CaptureCompleted { session: u64, outcome: CaptureOutcome },
    /// User asked for a photo
    CaptureRequested,
    /// Host came to the foreground
    HostActive,
    /// Host went to the background
    HostInactive,
    /// Host is being destroyed
    Close,
}

impl std::fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostEvent::PermissionResult { granted } => f
                .debug_struct("PermissionResult")
                .field("granted", granted)
                .finish(),
            HostEvent::ProviderAcquired { attempt, result } => f
                .debug_struct("ProviderAcquired")
                .field("attempt", attempt)
                .field("ok", &result.is_ok())
                .finish(),
            HostEvent::CaptureCompleted { session, outcome } => f
                .debug_struct("CaptureCompleted")
                .field("session", session)
                .field("outcome", outcome)
                .finish(),
            HostEvent::CaptureRequested => write!(f, "CaptureRequested"),
            HostEvent::HostActive => write!(f, "HostActive"),
            HostEvent::HostInactive => write!(f, "HostInactive"),
            HostEvent::Close => write!(f, "Close"),
        }
    }
}

/// User-visible notices produced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiNotice {
    /// Permission refused; the screen is closing
    PermissionDenied,
    /// A photo was written and can be displayed
    CaptureSaved(FileLocator),
    /// A photo could not be written; the camera is still usable
    CaptureFailed(String),
}

/// Sender side of the host's sequential event loop.
///
/// Cheap to clone; background tasks and the capture worker post their
/// completions through it.
#[derive(Debug, Clone)]
pub struct MainContext {
    tx: UnboundedSender<HostEvent>,
}

impl MainContext {
    /// Create the context and the receiver the host loop drains.
    pub fn channel() -> (Self, UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post an event. Returns false once the loop is gone.
    pub fn post(&self, event: HostEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Host loop gone, dropping {:?}", e.0);
                false
            }
        }
    }
}

/// Sink for [`UiNotice`]s.
pub type NoticeSender = UnboundedSender<UiNotice>;
