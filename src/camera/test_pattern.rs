//! Synthetic camera that renders a gradient test pattern.
//!
//! Used when no capture hardware is configured. Every still is a freshly
//! encoded JPEG so the full write path is exercised.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb, RgbImage};

use super::provider::{CameraProvider, ProviderHandle, StillCapture};
use super::types::{CameraError, CameraSelector, CaptureStream, PreviewStream, Resolution};

/// Provider backed by [`TestPatternCamera`].
#[derive(Debug, Default)]
pub struct TestPatternProvider {
    handle: Arc<TestPatternHandle>,
}

impl TestPatternProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CameraProvider for TestPatternProvider {
    async fn acquire(&self) -> Result<Arc<dyn ProviderHandle>, CameraError> {
        log::debug!("Test pattern provider acquired");
        Ok(self.handle.clone())
    }
}

#[derive(Debug, Default)]
struct TestPatternHandle {
    bound: Mutex<Option<CameraSelector>>,
}

impl ProviderHandle for TestPatternHandle {
    fn bind(
        &self,
        selector: CameraSelector,
        preview: &PreviewStream,
        capture: &CaptureStream,
    ) -> Result<Arc<dyn StillCapture>, CameraError> {
        if !capture.resolution.is_valid() {
            return Err(CameraError::BindRejected(format!(
                "unsupported still resolution {}",
                capture.resolution
            )));
        }
        let mut bound = self
            .bound
            .lock()
            .map_err(|_| CameraError::BindRejected("provider state poisoned".to_string()))?;
        *bound = Some(selector);
        log::info!(
            "Bound {} test pattern camera (preview {}, still {} {:?})",
            selector.lens_facing.name(),
            preview.resolution,
            capture.resolution,
            capture.mode
        );
        Ok(Arc::new(TestPatternCamera::new(
            capture.resolution,
            capture.mode.jpeg_quality(),
        )))
    }

    fn unbind_all(&self) {
        if let Ok(mut bound) = self.bound.lock() {
            if bound.take().is_some() {
                log::debug!("Unbound test pattern camera");
            }
        }
    }
}

/// Still capture that writes a gradient frame.
#[derive(Debug)]
pub struct TestPatternCamera {
    resolution: Resolution,
    quality: u8,
    frames: AtomicU64,
}

impl TestPatternCamera {
    pub fn new(resolution: Resolution, quality: u8) -> Self {
        Self {
            resolution,
            quality,
            frames: AtomicU64::new(0),
        }
    }

    /// Render the next frame. The hue shifts with every frame taken.
    pub fn render(&self) -> RgbImage {
        let shift = self.frames.fetch_add(1, Ordering::Relaxed) % 256;
        let Resolution { width, height } = self.resolution;
        let w = u64::from(width.max(1));
        let h = u64::from(height.max(1));
        ImageBuffer::from_fn(width, height, |x, y| {
            let (x, y) = (u64::from(x), u64::from(y));
            let r = ((x * 255 / w + shift) % 256) as u8;
            let g = (y * 255 / h) as u8;
            let b = (((x + y) * 255 / (w + h) + shift * 2) % 256) as u8;
            Rgb([r, g, b])
        })
    }
}

impl StillCapture for TestPatternCamera {
    fn take_picture(&self, output: &Path) -> Result<(), CameraError> {
        let frame = self.render();
        let write_failed = |message: String| CameraError::WriteFailed {
            path: output.display().to_string(),
            message,
        };

        let file = File::create(output).map_err(|e| write_failed(e.to_string()))?;
        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), self.quality);
        encoder
            .encode_image(&frame)
            .map_err(|e| write_failed(e.to_string()))?;
        Ok(())
    }
}
