//! Output directory and capture file naming.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use url::Url;

/// chrono pattern for capture timestamps (`yyyyMMdd_HHmmss`).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension of every captured file.
pub const CAPTURE_EXTENSION: &str = "jpg";

/// File name for a capture taken at `instant`.
///
/// Second resolution only: two captures within the same second share a name.
pub fn capture_file_name<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("{}.{}", instant.format(TIMESTAMP_FORMAT), CAPTURE_EXTENSION)
}

/// Default output directory: `<pictures dir>/<app name>`.
///
/// Falls back to the local data directory, then to the working directory.
pub fn default_output_dir(app_name: &str) -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_name)
}

/// Directory that receives captured files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirectory {
    root: PathBuf,
}

impl OutputDirectory {
    /// Does not touch the filesystem; see [`OutputDirectory::ensure_exists`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory and its parents if missing.
    pub fn ensure_exists(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.root)
    }

    /// Absolute-or-configured path for a capture taken at `instant`.
    pub fn capture_path<Tz>(&self, instant: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.root.join(capture_file_name(instant))
    }
}

/// Locator handed to the UI for a saved capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocator {
    path: PathBuf,
}

impl FileLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` URI for the capture.
    pub fn uri(&self) -> String {
        let absolute = if self.path.is_absolute() {
            self.path.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.path))
                .unwrap_or_else(|_| self.path.clone())
        };
        match Url::from_file_path(&absolute) {
            Ok(url) => url.to_string(),
            Err(()) => absolute.display().to_string(),
        }
    }
}

impl fmt::Display for FileLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}
