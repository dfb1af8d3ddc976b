//! Capture session controller.
//!
//! Owns the permission gate, the camera binding and the capture worker for
//! one capture screen. All methods take `&mut self` and are meant to be
//! driven from a single host event loop (see [`super::host::run_host`]);
//! asynchronous completions come back to that loop as [`HostEvent`]s.
//!
//! State machine:
//!
//! ```text
//! Idle --check ok--> Binding --bound--> Bound <--> Inactive
//!   \                   \
//!    \--missing--> AwaitingPermission --denied--> Denied (host finishes)
//!                       \--granted--> Binding
//! Binding --acquire/bind error--> BindFailed
//! any --shutdown--> ShutDown
//! ```

use std::sync::Arc;

use crate::camera::{
    CameraError, CameraProvider, CameraSelector, CaptureMode, CaptureStream, CaptureWorker,
    PreviewStream, ProviderHandle, Resolution, StillCapture,
};
use crate::clock::{Clock, SystemClock};
use crate::permissions::{
    default_required, missing_permissions, PermissionAuthority, PermissionState,
    RequiredPermissions,
};

use super::error::SessionError;
use super::events::{CaptureOutcome, HostEvent, MainContext, NoticeSender, UiNotice};
use super::output::{FileLocator, OutputDirectory};

/// Name of the capture worker thread.
const WORKER_THREAD_NAME: &str = "capture-worker";

/// Static configuration for a controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Permissions that must all be granted before binding
    pub required_permissions: RequiredPermissions,
    /// Directory receiving `<timestamp>.jpg` files
    pub output_dir: std::path::PathBuf,
    /// Camera selection policy
    pub selector: CameraSelector,
    /// Still capture trade-off
    pub capture_mode: CaptureMode,
    pub preview_resolution: Resolution,
    pub capture_resolution: Resolution,
}

impl ControllerConfig {
    pub fn new(output_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            required_permissions: default_required(),
            output_dir: output_dir.into(),
            selector: CameraSelector::DEFAULT_BACK,
            capture_mode: CaptureMode::MinimizeLatency,
            preview_resolution: Resolution::VGA,
            capture_resolution: Resolution::HD,
        }
    }
}

/// External collaborators the controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub authority: Arc<dyn PermissionAuthority>,
    pub provider: Arc<dyn CameraProvider>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Collaborators using the system clock.
    pub fn new(authority: Arc<dyn PermissionAuthority>, provider: Arc<dyn CameraProvider>) -> Self {
        Self {
            authority,
            provider,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Lifecycle state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not initialized yet
    Idle,
    /// Permission request outstanding
    AwaitingPermission,
    /// Waiting for the camera provider
    Binding,
    /// Preview and capture streams are bound
    Bound,
    /// Host is in the background; streams unbound, provider kept
    Inactive,
    /// Provider acquisition or binding failed (terminal)
    BindFailed,
    /// Permission refused (terminal)
    Denied,
    /// Controller released its resources (terminal)
    ShutDown,
}

impl SessionState {
    /// Whether no further transition is possible except shutdown.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::BindFailed | SessionState::Denied | SessionState::ShutDown
        )
    }
}

/// The preview + capture pair bound to the host.
struct CaptureSession {
    id: u64,
    still: Arc<dyn StillCapture>,
}

/// Drives permission checks, camera binding and still capture for one screen.
pub struct CaptureSessionController {
    config: ControllerConfig,
    collaborators: Collaborators,
    main: MainContext,
    notices: NoticeSender,
    output: OutputDirectory,
    worker: CaptureWorker,

    state: SessionState,
    permission: PermissionState,
    handle: Option<Arc<dyn ProviderHandle>>,
    session: Option<CaptureSession>,
    host_active: bool,
    finish_requested: bool,

    next_attempt: u64,
    next_session: u64,
    binding_runs: u64,
}

impl std::fmt::Debug for CaptureSessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionController")
            .field("state", &self.state)
            .field("permission", &self.permission)
            .field("output", &self.output)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

impl CaptureSessionController {
    /// Create a controller and spawn its capture worker.
    ///
    /// Nothing is checked or bound until [`initialize`](Self::initialize).
    pub fn new(
        config: ControllerConfig,
        collaborators: Collaborators,
        main: MainContext,
        notices: NoticeSender,
    ) -> Result<Self, SessionError> {
        let worker = CaptureWorker::spawn(WORKER_THREAD_NAME)?;
        let output = OutputDirectory::new(config.output_dir.clone());
        Ok(Self {
            config,
            collaborators,
            main,
            notices,
            output,
            worker,
            state: SessionState::Idle,
            permission: PermissionState::Unknown,
            handle: None,
            session: None,
            host_active: true,
            finish_requested: false,
            next_attempt: 0,
            next_session: 0,
            binding_runs: 0,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permission
    }

    /// Whether a capture stream is currently bound.
    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    /// Number of times the binding flow has been entered.
    pub fn binding_runs(&self) -> u64 {
        self.binding_runs
    }

    /// Whether the host should close the screen.
    pub fn is_finished(&self) -> bool {
        self.finish_requested
    }

    pub fn output_dir(&self) -> &OutputDirectory {
        &self.output
    }

    /// Check permissions and start binding, or request what is missing.
    ///
    /// Must be called within a tokio runtime.
    pub fn initialize(&mut self) {
        if self.state != SessionState::Idle {
            log::debug!("initialize ignored in state {:?}", self.state);
            return;
        }

        let missing = missing_permissions(
            self.collaborators.authority.as_ref(),
            &self.config.required_permissions,
        );
        if missing.is_empty() {
            self.permission = PermissionState::Granted;
            self.start_binding();
            return;
        }

        log::info!(
            "Requesting permissions: {}",
            missing.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
        );
        self.state = SessionState::AwaitingPermission;

        let authority = Arc::clone(&self.collaborators.authority);
        let main = self.main.clone();
        tokio::spawn(async move {
            let mut granted = true;
            for kind in missing {
                if !authority.request(kind).await.is_granted() {
                    granted = false;
                }
            }
            main.post(HostEvent::PermissionResult { granted });
        });
    }

    /// Handle the answer to the permission request.
    pub fn on_permission_result(&mut self, granted: bool) {
        if self.state != SessionState::AwaitingPermission {
            log::debug!("Permission result ignored in state {:?}", self.state);
            return;
        }

        // The authority's current answer wins over what the request reported
        let missing = missing_permissions(
            self.collaborators.authority.as_ref(),
            &self.config.required_permissions,
        );
        if granted && !missing.is_empty() {
            log::warn!(
                "Request reported granted but still missing: {}",
                missing.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
            );
        }

        if missing.is_empty() {
            self.permission = PermissionState::Granted;
            self.start_binding();
        } else {
            self.permission = PermissionState::Denied;
            self.state = SessionState::Denied;
            let err = SessionError::PermissionDenied(missing);
            log::warn!("{}", err);
            self.notify(UiNotice::PermissionDenied);
            self.finish_requested = true;
        }
    }

    /// Run the binding flow again with a fresh provider handle.
    ///
    /// Only valid once permission is granted and the session has not failed.
    pub fn rebind(&mut self) {
        if self.permission != PermissionState::Granted || self.state.is_terminal() {
            log::debug!("rebind ignored in state {:?}", self.state);
            return;
        }
        self.start_binding();
    }

    fn start_binding(&mut self) {
        self.state = SessionState::Binding;
        self.binding_runs += 1;
        self.next_attempt += 1;
        let attempt = self.next_attempt;

        log::info!("Acquiring camera provider (attempt {})", attempt);
        let provider = Arc::clone(&self.collaborators.provider);
        let main = self.main.clone();
        tokio::spawn(async move {
            let result = provider.acquire().await;
            main.post(HostEvent::ProviderAcquired { attempt, result });
        });
    }

    /// Finish the binding flow once the provider handle resolves.
    pub fn on_provider_acquired(
        &mut self,
        attempt: u64,
        result: Result<Arc<dyn ProviderHandle>, CameraError>,
    ) {
        if self.state.is_terminal() {
            log::debug!(
                "Provider attempt {} completed in state {:?}",
                attempt,
                self.state
            );
            return;
        }
        if attempt < self.next_attempt {
            log::debug!(
                "Provider attempt {} superseded by attempt {}",
                attempt,
                self.next_attempt
            );
            return;
        }

        let handle = match result {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("{}", SessionError::ProviderAcquisitionFailed(e));
                self.abandon_binding();
                return;
            }
        };

        // Streams bound through an older handle go first
        if let Some(previous) = self.handle.replace(Arc::clone(&handle)) {
            previous.unbind_all();
            self.session = None;
        }

        if !self.host_active {
            log::debug!("Host inactive; deferring bind for attempt {}", attempt);
            self.state = SessionState::Inactive;
            return;
        }

        self.bind_streams(&handle);
    }

    fn abandon_binding(&mut self) {
        if self.session.is_some() {
            // An earlier binding is still live and usable
            self.state = SessionState::Bound;
        } else {
            self.state = SessionState::BindFailed;
        }
    }

    fn bind_streams(&mut self, handle: &Arc<dyn ProviderHandle>) {
        let preview = PreviewStream::new(self.config.preview_resolution);
        let capture = CaptureStream::new(self.config.capture_mode, self.config.capture_resolution);

        handle.unbind_all();
        self.session = None;

        match handle.bind(self.config.selector, &preview, &capture) {
            Ok(still) => {
                self.next_session += 1;
                self.session = Some(CaptureSession {
                    id: self.next_session,
                    still,
                });
                self.state = SessionState::Bound;
                log::info!(
                    "Camera bound ({} lens, session {})",
                    self.config.selector.lens_facing.name(),
                    self.next_session
                );
            }
            Err(e) => {
                log::error!("{}", SessionError::BindingFailed(e));
                self.state = SessionState::BindFailed;
            }
        }
    }

    /// Take one photo into the output directory.
    ///
    /// Silently does nothing while no capture stream is bound. The result is
    /// reported later as a [`UiNotice`].
    pub fn capture(&mut self) {
        if self.state == SessionState::ShutDown {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            log::debug!("Capture ignored: no capture stream bound");
            return;
        };

        let instant = self.collaborators.clock.now();
        let path = self.output.capture_path(&instant);
        let output = self.output.clone();
        let still = Arc::clone(&session.still);
        let session_id = session.id;
        let main = self.main.clone();

        log::debug!("Capturing to {}", path.display());
        let job = Box::new(move || {
            let written = output
                .ensure_exists()
                .map_err(CameraError::from)
                .and_then(|()| still.take_picture(&path));
            let outcome = match written {
                Ok(()) => CaptureOutcome::Saved(FileLocator::new(path)),
                Err(e) => CaptureOutcome::Failed(e.to_string()),
            };
            main.post(HostEvent::CaptureCompleted {
                session: session_id,
                outcome,
            });
        });

        if let Err(e) = self.worker.submit(job) {
            let err = SessionError::from(e);
            log::warn!("{}", err);
            self.notify(UiNotice::CaptureFailed(err.to_string()));
        }
    }

    /// Report a finished capture to the UI.
    pub fn on_capture_completed(&mut self, session: u64, outcome: CaptureOutcome) {
        if self.state == SessionState::ShutDown {
            log::debug!("Capture for session {} completed after shutdown", session);
            return;
        }

        match outcome {
            CaptureOutcome::Saved(locator) => {
                log::info!("Photo capture succeeded: {}", locator);
                self.notify(UiNotice::CaptureSaved(locator));
            }
            CaptureOutcome::Failed(reason) => {
                log::error!("{}", SessionError::CaptureWriteFailed(reason.clone()));
                self.notify(UiNotice::CaptureFailed(reason));
            }
        }
    }

    /// Host went to the background: release the streams, keep the provider.
    pub fn on_host_inactive(&mut self) {
        self.host_active = false;
        if self.session.is_none() {
            return;
        }
        if let Some(handle) = self.handle.as_ref() {
            handle.unbind_all();
        }
        self.session = None;
        // A binding still in flight is deferred when it completes
        if self.state == SessionState::Bound {
            self.state = SessionState::Inactive;
        }
        log::info!("Host inactive; camera unbound");
    }

    /// Host came back: rebind using the retained provider.
    pub fn on_host_active(&mut self) {
        self.host_active = true;
        if self.state != SessionState::Inactive {
            return;
        }
        if let Some(handle) = self.handle.clone() {
            self.bind_streams(&handle);
        }
    }

    /// Release the capture worker and the bound streams.
    ///
    /// In-flight completions arriving later are ignored. Safe to call twice.
    pub fn shutdown(&mut self) {
        if self.state == SessionState::ShutDown {
            return;
        }
        self.worker.shutdown();
        if let Some(handle) = self.handle.take() {
            handle.unbind_all();
        }
        self.session = None;
        self.state = SessionState::ShutDown;
        log::info!("Capture session shut down");
    }

    /// Dispatch one event from the host loop.
    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::PermissionResult { granted } => self.on_permission_result(granted),
            HostEvent::ProviderAcquired { attempt, result } => {
                self.on_provider_acquired(attempt, result)
            }
            HostEvent::CaptureCompleted { session, outcome } => {
                self.on_capture_completed(session, outcome)
            }
            HostEvent::CaptureRequested => self.capture(),
            HostEvent::HostActive => self.on_host_active(),
            HostEvent::HostInactive => self.on_host_inactive(),
            HostEvent::Close => {
                self.shutdown();
                self.finish_requested = true;
            }
        }
    }

    fn notify(&self, notice: UiNotice) {
        if self.notices.send(notice).is_err() {
            log::debug!("UI sink closed; notice dropped");
        }
    }
}

impl Drop for CaptureSessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
