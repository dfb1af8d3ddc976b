//! Permission gating for the capture screen.
//!
//! The controller never talks to the operating system directly; it asks a
//! [`PermissionAuthority`] whether each required [`PermissionKind`] is
//! granted, and requests the missing ones when they are not.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Deserialize;

/// Kinds of runtime permission the screen may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionKind {
    /// Access to the camera device (always required for capture)
    Camera,
    /// Access to the microphone
    Microphone,
    /// Write access to shared media storage
    Storage,
}

impl PermissionKind {
    /// Get the human-readable name of this permission kind
    pub fn name(&self) -> &'static str {
        match self {
            PermissionKind::Camera => "Camera",
            PermissionKind::Microphone => "Microphone",
            PermissionKind::Storage => "Storage",
        }
    }
}

/// Answer from the authority for a single permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Controller-side view of the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Not yet checked
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// The set of permissions the screen cannot run without.
pub type RequiredPermissions = BTreeSet<PermissionKind>;

/// Default requirement: the camera only.
pub fn default_required() -> RequiredPermissions {
    BTreeSet::from([PermissionKind::Camera])
}

/// Grants or denies access to protected devices.
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    /// Current status without prompting anyone.
    fn check(&self, kind: PermissionKind) -> PermissionStatus;

    /// Ask for the permission. May show a system dialog.
    async fn request(&self, kind: PermissionKind) -> PermissionStatus;
}

/// Check every required permission.
///
/// Returns the kinds that are not currently granted, in a stable order.
/// An empty vector means all are granted.
pub fn missing_permissions(
    authority: &dyn PermissionAuthority,
    required: &RequiredPermissions,
) -> Vec<PermissionKind> {
    required
        .iter()
        .copied()
        .filter(|kind| !authority.check(*kind).is_granted())
        .collect()
}

/// How a [`PolicyPermissionAuthority`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionPolicy {
    /// Everything is granted up front
    #[default]
    Granted,
    /// Nothing is granted until requested; requests succeed
    GrantOnRequest,
    /// Nothing is granted; requests are refused
    DenyOnRequest,
}

/// Authority that answers from a fixed policy.
///
/// Grants obtained through [`PermissionAuthority::request`] are remembered
/// for the lifetime of the authority only.
#[derive(Debug, Default)]
pub struct PolicyPermissionAuthority {
    policy: PermissionPolicy,
    granted: std::sync::Mutex<BTreeSet<PermissionKind>>,
}

impl PolicyPermissionAuthority {
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            policy,
            granted: std::sync::Mutex::new(BTreeSet::new()),
        }
    }

    pub fn policy(&self) -> PermissionPolicy {
        self.policy
    }
}

#[async_trait]
impl PermissionAuthority for PolicyPermissionAuthority {
    fn check(&self, kind: PermissionKind) -> PermissionStatus {
        if self.policy == PermissionPolicy::Granted {
            return PermissionStatus::Granted;
        }
        match self.granted.lock() {
            Ok(granted) if granted.contains(&kind) => PermissionStatus::Granted,
            _ => PermissionStatus::Denied,
        }
    }

    async fn request(&self, kind: PermissionKind) -> PermissionStatus {
        log::info!("Requesting {} permission", kind.name());
        match self.policy {
            PermissionPolicy::Granted => PermissionStatus::Granted,
            PermissionPolicy::GrantOnRequest => {
                if let Ok(mut granted) = self.granted.lock() {
                    granted.insert(kind);
                }
                PermissionStatus::Granted
            }
            PermissionPolicy::DenyOnRequest => PermissionStatus::Denied,
        }
    }
}
