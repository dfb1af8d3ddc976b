//! Configuration file handling for shutter.
//!
//! Loads configuration from `~/.config/shutter/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::camera::{
    CameraProvider, CameraSelector, CaptureMode, CommandProvider, LensFacing, Resolution,
    TestPatternProvider,
};
use crate::permissions::{default_required, PermissionKind, PermissionPolicy};
use crate::session::{default_output_dir, ControllerConfig};

/// Application name used for the output and config directories.
pub const APP_NAME: &str = "shutter";

/// Configuration file structure for shutter.
/// Loaded from ~/.config/shutter/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// Subdirectory name under the pictures directory
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Overrides `<pictures>/<app_name>`
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub mode: CaptureMode,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            output_dir: None,
            mode: CaptureMode::default(),
        }
    }
}

/// Which camera provider backs the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    TestPattern,
    Command,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub lens: LensFacing,
    #[serde(default)]
    pub provider: ProviderKind,
    /// Argument vector for the command provider; `{output}` is the target path
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lens: LensFacing::default(),
            provider: ProviderKind::default(),
            command: Vec::new(),
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default = "default_required_list")]
    pub required: Vec<PermissionKind>,
    #[serde(default)]
    pub policy: PermissionPolicy,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            required: default_required_list(),
            policy: PermissionPolicy::default(),
        }
    }
}

fn default_app_name() -> String {
    APP_NAME.to_string()
}

fn default_width() -> u32 {
    Resolution::HD.width
}

fn default_height() -> u32 {
    Resolution::HD.height
}

fn default_required_list() -> Vec<PermissionKind> {
    default_required().into_iter().collect()
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// With no explicit path, a missing default file yields the defaults.
    /// An explicit path must exist. A file that exists but cannot be parsed
    /// is always an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some();
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !explicit && !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let config = Self::parse(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        config
            .validate()
            .map_err(|message| ConfigError::InvalidValue { path, message })?;
        Ok(config)
    }

    /// Check values TOML alone cannot constrain.
    pub fn validate(&self) -> Result<(), String> {
        let resolution = self.capture_resolution();
        if !resolution.is_valid() {
            return Err(format!(
                "camera resolution {} must be between 1 and {} in each dimension",
                resolution,
                Resolution::MAX_DIMENSION
            ));
        }
        Ok(())
    }

    fn capture_resolution(&self) -> Resolution {
        Resolution {
            width: self.camera.width,
            height: self.camera.height,
        }
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Directory receiving captures.
    pub fn output_dir(&self) -> PathBuf {
        self.capture
            .output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(&self.capture.app_name))
    }

    /// Controller settings derived from this configuration.
    pub fn controller_config(&self) -> ControllerConfig {
        let mut config = ControllerConfig::new(self.output_dir());
        config.required_permissions = self.permissions.required.iter().copied().collect();
        // The camera gate cannot be configured away
        config.required_permissions.insert(PermissionKind::Camera);
        config.selector = CameraSelector::new(self.camera.lens);
        config.capture_mode = self.capture.mode;
        config.capture_resolution = self.capture_resolution();
        config
    }

    /// Instantiate the configured camera provider.
    pub fn camera_provider(&self) -> Arc<dyn CameraProvider> {
        match self.camera.provider {
            ProviderKind::TestPattern => Arc::new(TestPatternProvider::new()),
            ProviderKind::Command => Arc::new(CommandProvider::new(self.camera.command.clone())),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: PathBuf,
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, message } => {
                write!(f, "Invalid config file '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join(APP_NAME)
        .join("config.toml")
}

/// Contents written by `shutter config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# shutter configuration

[capture]
# Output subdirectory under your pictures directory
app_name = "shutter"
# Absolute output directory (overrides app_name)
# output_dir = "/home/me/Pictures/shutter"
# minimize-latency or maximize-quality
mode = "minimize-latency"

[camera]
# Lens facing: back or front
lens = "back"
# test-pattern or command
provider = "test-pattern"
# Capture program for the command provider; {output} is the target file
# command = ["rpicam-still", "-n", "-o", "{output}"]
width = 1280
height = 720

[permissions]
# Permissions the screen needs: camera, microphone, storage
required = ["camera"]
# granted, grant-on-request or deny-on-request
policy = "granted"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.capture.app_name, "shutter");
        assert_eq!(config.capture.mode, CaptureMode::MinimizeLatency);
        assert_eq!(config.camera.lens, LensFacing::Back);
        assert_eq!(config.camera.provider, ProviderKind::TestPattern);
        assert_eq!(config.permissions.required, vec![PermissionKind::Camera]);
        assert_eq!(config.permissions.policy, PermissionPolicy::Granted);
    }

    #[test]
    fn test_default_config_toml_parses_to_defaults() {
        let config = Config::parse(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config.capture.app_name, "shutter");
        assert!(config.capture.output_dir.is_none());
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.height, 720);
        assert!(config.camera.command.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [capture]
            output_dir = "/srv/photos"
            mode = "maximize-quality"

            [camera]
            provider = "command"
            command = ["rpicam-still", "-o", "{output}"]

            [permissions]
            required = ["camera", "storage"]
            policy = "deny-on-request"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir(), PathBuf::from("/srv/photos"));
        assert_eq!(config.capture.mode, CaptureMode::MaximizeQuality);
        assert_eq!(config.camera.provider, ProviderKind::Command);
        assert_eq!(config.camera.command.len(), 3);
        assert_eq!(config.permissions.policy, PermissionPolicy::DenyOnRequest);

        let controller = config.controller_config();
        assert!(controller
            .required_permissions
            .contains(&PermissionKind::Storage));
        assert_eq!(controller.capture_mode, CaptureMode::MaximizeQuality);
    }

    #[test]
    fn test_parse_rejects_unknown_lens() {
        let result = Config::parse("[camera]\nlens = \"sideways\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_output_dir_defaults_to_app_name() {
        let config = Config::default();
        assert!(config.output_dir().ends_with("shutter"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = Config::load(Some(missing.as_path()));
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[capture]\napp_name = \"holiday\"").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.capture.app_name, "holiday");
    }

    #[test]
    fn test_load_invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[capture\n").unwrap();

        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(format!("{}", err).contains("config.toml"));
    }

    #[test]
    fn test_empty_required_list_still_gates_camera() {
        let config = Config::parse("[permissions]\nrequired = []\n").unwrap();
        assert!(config.permissions.required.is_empty());

        let controller = config.controller_config();
        assert!(controller
            .required_permissions
            .contains(&PermissionKind::Camera));
    }

    #[test]
    fn test_load_rejects_out_of_range_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[camera]\nwidth = 0\n").unwrap();
        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(format!("{}", err).contains("resolution"));

        std::fs::write(&path, "[camera]\nwidth = 4000000000\n").unwrap();
        let err = Config::load(Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_path();
        assert!(path.ends_with("shutter/config.toml"));
    }
}
