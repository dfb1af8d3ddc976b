//! Mock collaborators shared by the session integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, TimeZone};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::Notify;

use shutter::camera::{
    CameraError, CameraProvider, CameraSelector, CaptureStream, PreviewStream, ProviderHandle,
    StillCapture,
};
use shutter::clock::ManualClock;
use shutter::permissions::{PermissionAuthority, PermissionKind, PermissionStatus};
use shutter::session::{
    CaptureSessionController, Collaborators, ControllerConfig, HostEvent, MainContext, UiNotice,
};

pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Authority with a fixed answer for checks and for requests.
pub struct MockAuthority {
    granted: AtomicBool,
    grant_on_request: bool,
    request_takes_effect: bool,
    pub requests: AtomicUsize,
}

impl MockAuthority {
    pub fn granted() -> Self {
        Self {
            granted: AtomicBool::new(true),
            grant_on_request: true,
            request_takes_effect: true,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn ungranted(grant_on_request: bool) -> Self {
        Self {
            granted: AtomicBool::new(false),
            grant_on_request,
            request_takes_effect: true,
            requests: AtomicUsize::new(0),
        }
    }

    /// Requests answer granted, but checks keep reporting denied.
    pub fn grant_without_effect() -> Self {
        Self {
            granted: AtomicBool::new(false),
            grant_on_request: true,
            request_takes_effect: false,
            requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PermissionAuthority for MockAuthority {
    fn check(&self, _kind: PermissionKind) -> PermissionStatus {
        if self.granted.load(Ordering::SeqCst) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }

    async fn request(&self, _kind: PermissionKind) -> PermissionStatus {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.grant_on_request {
            if self.request_takes_effect {
                self.granted.store(true, Ordering::SeqCst);
            }
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

/// Still capture that writes a marker file, or fails on demand.
#[derive(Default)]
pub struct MockStill {
    failures_left: AtomicUsize,
    pub writes: Mutex<Vec<PathBuf>>,
}

impl MockStill {
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }
}

impl StillCapture for MockStill {
    fn take_picture(&self, output: &Path) -> Result<(), CameraError> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(CameraError::WriteFailed {
                path: output.display().to_string(),
                message: "device busy".to_string(),
            });
        }
        std::fs::write(output, b"\xFF\xD8mock")?;
        self.writes.lock().unwrap().push(output.to_path_buf());
        Ok(())
    }
}

/// Provider handle that tracks how many sessions are bound at once.
#[derive(Default)]
pub struct MockHandle {
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub binds: AtomicUsize,
    pub unbinds: AtomicUsize,
    pub fail_bind: AtomicBool,
    pub still: Arc<MockStill>,
    pub last_selector: Mutex<Option<CameraSelector>>,
    pub last_capture: Mutex<Option<CaptureStream>>,
}

impl MockHandle {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl ProviderHandle for MockHandle {
    fn bind(
        &self,
        selector: CameraSelector,
        _preview: &PreviewStream,
        capture: &CaptureStream,
    ) -> Result<Arc<dyn StillCapture>, CameraError> {
        if self.fail_bind.load(Ordering::SeqCst) {
            return Err(CameraError::BindRejected("camera in use".to_string()));
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.binds.fetch_add(1, Ordering::SeqCst);
        *self.last_selector.lock().unwrap() = Some(selector);
        *self.last_capture.lock().unwrap() = Some(capture.clone());
        Ok(self.still.clone())
    }

    fn unbind_all(&self) {
        self.unbinds.fetch_add(1, Ordering::SeqCst);
        self.active.store(0, Ordering::SeqCst);
    }
}

/// Provider returning the same [`MockHandle`], optionally after a gate opens.
pub struct MockProvider {
    pub handle: Arc<MockHandle>,
    pub acquisitions: AtomicUsize,
    fail: AtomicBool,
    gate: Option<Arc<Notify>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            handle: Arc::new(MockHandle::default()),
            acquisitions: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            gate: None,
        }
    }

    pub fn failing() -> Self {
        let provider = Self::new();
        provider.fail.store(true, Ordering::SeqCst);
        provider
    }

    /// Acquisition only completes once the returned gate is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut provider = Self::new();
        provider.gate = Some(Arc::clone(&gate));
        (provider, gate)
    }
}

#[async_trait]
impl CameraProvider for MockProvider {
    async fn acquire(&self) -> Result<Arc<dyn ProviderHandle>, CameraError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CameraError::ProviderUnavailable("no camera service".to_string()));
        }
        Ok(self.handle.clone())
    }
}

/// A controller wired to mocks, plus the channels the host would own.
pub struct Harness {
    pub controller: CaptureSessionController,
    pub events: UnboundedReceiver<HostEvent>,
    pub notices: UnboundedReceiver<UiNotice>,
    pub main: MainContext,
    pub provider: Arc<MockProvider>,
    pub authority: Arc<MockAuthority>,
    pub clock: Arc<ManualClock>,
    pub output_dir: PathBuf,
    _tmp: tempfile::TempDir,
}

impl Harness {
    pub fn new(authority: MockAuthority, provider: MockProvider) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let output_dir = tmp.path().join("media").join("shutter");

        let authority = Arc::new(authority);
        let provider = Arc::new(provider);
        let clock = Arc::new(ManualClock::new(start_instant()));
        let collaborators = Collaborators::new(authority.clone(), provider.clone())
            .with_clock(clock.clone());

        let (main, events) = MainContext::channel();
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let controller = CaptureSessionController::new(
            ControllerConfig::new(output_dir.clone()),
            collaborators,
            main.clone(),
            notice_tx,
        )
        .unwrap();

        Self {
            controller,
            events,
            notices,
            main,
            provider,
            authority,
            clock,
            output_dir,
            _tmp: tmp,
        }
    }

    pub fn granted() -> Self {
        Self::new(MockAuthority::granted(), MockProvider::new())
    }

    /// Wait for the next event and apply it to the controller.
    pub async fn pump(&mut self) -> HostEvent {
        let event = tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for host event")
            .expect("event channel closed");
        let seen = describe(&event);
        self.controller.handle_event(event);
        seen
    }

    /// Initialize and wait until the binding flow finishes.
    pub async fn initialize_and_bind(&mut self) {
        self.controller.initialize();
        match self.pump().await {
            HostEvent::ProviderAcquired { .. } => {}
            other => panic!("expected provider acquisition, got {:?}", other),
        }
    }

    /// Request a capture and wait for its completion to be handled.
    pub async fn capture_and_wait(&mut self) -> UiNotice {
        self.controller.capture();
        match self.pump().await {
            HostEvent::CaptureCompleted { .. } => {}
            other => panic!("expected capture completion, got {:?}", other),
        }
        self.notices.try_recv().expect("no notice after capture")
    }

    /// Drain every notice produced so far.
    pub fn drain_notices(&mut self) -> Vec<UiNotice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }

    /// Names of files in the output directory, sorted.
    pub fn output_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.output_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// 2024-03-05 14:07:09 local time.
pub fn start_instant() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap()
}

/// A cheap copy of an event for assertions after it was consumed.
fn describe(event: &HostEvent) -> HostEvent {
    match event {
        HostEvent::PermissionResult { granted } => HostEvent::PermissionResult { granted: *granted },
        HostEvent::ProviderAcquired { attempt, result } => HostEvent::ProviderAcquired {
            attempt: *attempt,
            result: match result {
                Ok(handle) => Ok(Arc::clone(handle)),
                Err(e) => Err(CameraError::ProviderUnavailable(e.to_string())),
            },
        },
        HostEvent::CaptureCompleted { session, outcome } => HostEvent::CaptureCompleted {
            session: *session,
            outcome: outcome.clone(),
        },
        HostEvent::CaptureRequested => HostEvent::CaptureRequested,
        HostEvent::HostActive => HostEvent::HostActive,
        HostEvent::HostInactive => HostEvent::HostInactive,
        HostEvent::Close => HostEvent::Close,
    }
}
