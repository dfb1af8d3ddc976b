//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use shutter::camera::CaptureMode;
use shutter::config::{Config, ProviderKind};
use shutter::permissions::PermissionPolicy;

// ==================== CLI Enums ====================

/// Still capture trade-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    MinimizeLatency,
    MaximizeQuality,
}

impl From<Mode> for CaptureMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::MinimizeLatency => CaptureMode::MinimizeLatency,
            Mode::MaximizeQuality => CaptureMode::MaximizeQuality,
        }
    }
}

/// Camera backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    TestPattern,
    Command,
}

impl From<Provider> for ProviderKind {
    fn from(p: Provider) -> Self {
        match p {
            Provider::TestPattern => ProviderKind::TestPattern,
            Provider::Command => ProviderKind::Command,
        }
    }
}

/// How permission checks are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Permission {
    Granted,
    GrantOnRequest,
    DenyOnRequest,
}

impl From<Permission> for PermissionPolicy {
    fn from(p: Permission) -> Self {
        match p {
            Permission::Granted => PermissionPolicy::Granted,
            Permission::GrantOnRequest => PermissionPolicy::GrantOnRequest,
            Permission::DenyOnRequest => PermissionPolicy::DenyOnRequest,
        }
    }
}

// ==================== CLI Arguments ====================

/// Camera screen that previews, captures and shows still photos
#[derive(Parser, Debug)]
#[command(name = "shutter")]
#[command(version, about = "Capture timestamped still photos from a camera", long_about = None)]
#[command(after_help = "KEYS (type then Enter):
    c or empty line   take a photo
    p                 pause (release the camera)
    r                 resume
    q                 quit

EXAMPLES:
    shutter
    shutter --output-dir ~/Pictures/trip
    shutter --provider command --command \"rpicam-still -n -o {output}\"")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory receiving captures (default: <pictures>/shutter)
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// Still capture mode
    #[arg(long)]
    pub mode: Option<Mode>,

    /// Camera backend
    #[arg(long)]
    pub provider: Option<Provider>,

    /// Capture program for the command backend; {output} is the target file
    #[arg(long = "command", value_name = "COMMAND")]
    pub capture_command: Option<String>,

    /// Permission policy
    #[arg(long)]
    pub permission: Option<Permission>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Print the file name a capture taken now would get
    Name,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.capture.output_dir = Some(dir.clone());
        }
        if let Some(mode) = self.mode {
            config.capture.mode = mode.into();
        }
        if let Some(provider) = self.provider {
            config.camera.provider = provider.into();
        }
        if let Some(command) = &self.capture_command {
            config.camera.command = command.split_whitespace().map(str::to_string).collect();
            // A capture command implies the command backend
            if self.provider.is_none() {
                config.camera.provider = ProviderKind::Command;
            }
        }
        if let Some(permission) = self.permission {
            config.permissions.policy = permission.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let args = Args::try_parse_from(["shutter"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.output_dir.is_none());
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let args = Args::try_parse_from([
            "shutter",
            "--output-dir",
            "/tmp/out",
            "--mode",
            "maximize-quality",
            "--permission",
            "deny-on-request",
        ])
        .unwrap();
        let mut config = Config::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out"));
        assert_eq!(config.capture.mode, CaptureMode::MaximizeQuality);
        assert_eq!(config.permissions.policy, PermissionPolicy::DenyOnRequest);
        assert_eq!(config.camera.provider, ProviderKind::TestPattern);
    }

    #[test]
    fn test_command_implies_command_provider() {
        let args = Args::try_parse_from([
            "shutter",
            "--command",
            "rpicam-still -n -o {output}",
        ])
        .unwrap();
        let mut config = Config::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.camera.provider, ProviderKind::Command);
        assert_eq!(
            config.camera.command,
            vec!["rpicam-still", "-n", "-o", "{output}"]
        );
    }

    #[test]
    fn test_config_subcommand() {
        let args = Args::try_parse_from(["shutter", "config", "init"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Config {
                action: ConfigAction::Init
            })
        ));
    }
}
