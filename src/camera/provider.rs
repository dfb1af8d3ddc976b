//! Camera provider seams.
//!
//! A [`CameraProvider`] hands out a [`ProviderHandle`] asynchronously. The
//! handle binds a preview and a capture stream to the host and returns the
//! [`StillCapture`] used to write single frames to disk.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::types::{CameraError, CameraSelector, CaptureStream, PreviewStream};

/// Source of camera provider handles.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    /// Acquire a handle to the platform camera service.
    async fn acquire(&self) -> Result<Arc<dyn ProviderHandle>, CameraError>;
}

/// Live handle to the camera service.
///
/// Calls are made from the host's main event loop only.
pub trait ProviderHandle: Send + Sync {
    /// Bind both streams to the host using the given selector.
    fn bind(
        &self,
        selector: CameraSelector,
        preview: &PreviewStream,
        capture: &CaptureStream,
    ) -> Result<Arc<dyn StillCapture>, CameraError>;

    /// Tear down every stream bound through this handle.
    fn unbind_all(&self);
}

/// A bound still-capture stream.
///
/// `take_picture` blocks until the frame is fully written, so it is only
/// called from the capture worker thread.
pub trait StillCapture: Send + Sync {
    fn take_picture(&self, output: &Path) -> Result<(), CameraError>;
}
