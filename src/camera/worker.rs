//! Single-thread capture worker.
//!
//! Blocking still-capture writes run here, off the host's event loop. Jobs
//! execute strictly in submission order.

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

/// A unit of blocking work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Commands sent to the worker thread.
enum WorkerCommand {
    Run(Job),
    Stop,
}

/// Errors raised when handing work to the worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Capture worker has been shut down")]
    ShutDown,

    #[error("Failed to spawn capture worker: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

/// Handle to the dedicated capture thread.
pub struct CaptureWorker {
    /// Worker thread handle
    thread: Option<JoinHandle<()>>,
    /// Channel to send commands to the worker
    command_tx: Option<Sender<WorkerCommand>>,
}

impl std::fmt::Debug for CaptureWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureWorker")
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CaptureWorker {
    /// Spawn the worker thread.
    pub fn spawn(name: &str) -> Result<Self, WorkerError> {
        let (tx, rx) = mpsc::channel::<WorkerCommand>();

        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    match command {
                        WorkerCommand::Run(job) => job(),
                        WorkerCommand::Stop => {
                            log::debug!("Capture worker stopping");
                            break;
                        }
                    }
                }
            })?;

        Ok(Self {
            thread: Some(handle),
            command_tx: Some(tx),
        })
    }

    /// Queue a job. Fails once the worker has been shut down.
    pub fn submit(&self, job: Job) -> Result<(), WorkerError> {
        let tx = self.command_tx.as_ref().ok_or(WorkerError::ShutDown)?;
        tx.send(WorkerCommand::Run(job))
            .map_err(|_| WorkerError::ShutDown)
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// `Stop` is queued behind any pending jobs, so everything submitted
    /// before this call still runs. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(WorkerCommand::Stop);
        }

        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("Capture worker panicked");
            }
        }
    }

    /// Check if the worker thread is still accepting work.
    pub fn is_running(&self) -> bool {
        self.command_tx.is_some()
            && self
                .thread
                .as_ref()
                .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
