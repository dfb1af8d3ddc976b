//! Camera backed by an external still-capture program.
//!
//! The program is configured as an argument vector in which `{output}` is
//! replaced with the destination path, e.g.
//! `["rpicam-still", "-n", "-o", "{output}"]`.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::provider::{CameraProvider, ProviderHandle, StillCapture};
use super::types::{CameraError, CameraSelector, CaptureStream, LensFacing, PreviewStream};

/// Placeholder substituted with the output path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// How long the availability check may take before the program is
/// considered unusable.
pub const DEFAULT_AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(3);

/// Provider that shells out to a capture program for every still.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    argv: Vec<String>,
    availability_timeout: Duration,
}

impl CommandProvider {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            availability_timeout: DEFAULT_AVAILABILITY_TIMEOUT,
        }
    }

    pub fn with_availability_timeout(mut self, timeout: Duration) -> Self {
        self.availability_timeout = timeout;
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

#[async_trait]
impl CameraProvider for CommandProvider {
    async fn acquire(&self) -> Result<Arc<dyn ProviderHandle>, CameraError> {
        let program = self.argv.first().ok_or_else(|| {
            CameraError::ProviderUnavailable("capture command is empty".to_string())
        })?;
        if !self.argv.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER)) {
            return Err(CameraError::ProviderUnavailable(format!(
                "capture command must contain {}",
                OUTPUT_PLACEHOLDER
            )));
        }

        // Check that the program can be spawned at all; a program that
        // ignores --help is killed once the timeout passes
        let mut check = tokio::process::Command::new(program);
        check
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        match tokio::time::timeout(self.availability_timeout, check.status()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(CameraError::ProviderUnavailable(format!(
                    "cannot run '{}': {}",
                    program, e
                )));
            }
            Err(_) => {
                return Err(CameraError::ProviderUnavailable(format!(
                    "'{}' did not answer --help within {:?}",
                    program, self.availability_timeout
                )));
            }
        }

        log::debug!("Capture command '{}' is available", program);
        Ok(Arc::new(CommandHandle {
            argv: self.argv.clone(),
        }))
    }
}

#[derive(Debug)]
struct CommandHandle {
    argv: Vec<String>,
}

impl ProviderHandle for CommandHandle {
    fn bind(
        &self,
        selector: CameraSelector,
        preview: &PreviewStream,
        capture: &CaptureStream,
    ) -> Result<Arc<dyn StillCapture>, CameraError> {
        // A capture program drives a single module
        if selector.lens_facing != LensFacing::Back {
            return Err(CameraError::LensUnavailable(selector.lens_facing));
        }
        log::info!(
            "Bound capture command (preview {}, still {} {:?})",
            preview.resolution,
            capture.resolution,
            capture.mode
        );
        Ok(Arc::new(CommandCapture {
            argv: self.argv.clone(),
        }))
    }

    fn unbind_all(&self) {}
}

/// Still capture that runs the configured program once per frame.
#[derive(Debug)]
pub struct CommandCapture {
    argv: Vec<String>,
}

impl CommandCapture {
    /// Build the argument vector for one capture.
    pub fn render_args(argv: &[String], output: &Path) -> Vec<String> {
        let output = output.display().to_string();
        argv.iter()
            .map(|a| a.replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }
}

impl StillCapture for CommandCapture {
    fn take_picture(&self, output: &Path) -> Result<(), CameraError> {
        let args = Self::render_args(&self.argv, output);
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| CameraError::CommandFailed("capture command is empty".to_string()))?;

        let result = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| CameraError::CommandFailed(format!("{}: {}", program, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(CameraError::CommandFailed(format!(
                "{} exited with {}: {}",
                program,
                result.status,
                stderr.trim()
            )));
        }
        if !output.exists() {
            return Err(CameraError::WriteFailed {
                path: output.display().to_string(),
                message: format!("{} produced no file", program),
            });
        }
        Ok(())
    }
}
