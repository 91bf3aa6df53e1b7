//! Install progress monitor
//!
//! One task polls the install status and, while it stays `RUNNING`, the
//! install log. Both loops sleep between polls and check a shared
//! [`CancellationToken`]; failed polls are recorded and retried on the same
//! interval until the task ends or the monitor is cancelled.

use std::sync::Arc;
use std::time::Duration;

use obd_wizard_core::services::{ErrorEntry, progress_ratio};
use obd_wizard_core::types::{InstallLog, InstallStatus, TaskInfo};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;
use crate::traits::DeployerApi;

/// Interval between two polls of the same endpoint
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
/// Pause between a terminal status and the `Finished` event
pub const DEFAULT_FINISH_DELAY: Duration = Duration::from_millis(2000);

/// Something the monitor observed
#[derive(Debug, Clone, PartialEq)]
pub enum InstallEvent {
    /// Latest task status
    Status(TaskInfo),
    /// Completion ratio derived from the latest status, `0.0..=1.0`
    Progress(f64),
    /// New log chunk
    Log(InstallLog),
    /// A poll failed; polling continues
    Error(ErrorEntry),
    /// Task reached a terminal status
    Finished(InstallStatus),
}

/// Monitor timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    pub poll_interval: Duration,
    pub finish_delay: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            finish_delay: DEFAULT_FINISH_DELAY,
        }
    }
}

/// How monitoring ended
#[derive(Debug, Clone, PartialEq)]
pub struct InstallOutcome {
    /// Terminal status; `None` when cancelled first
    pub status: Option<InstallStatus>,
    pub last_task: Option<TaskInfo>,
    /// Every failed poll, in order
    pub errors: Vec<ErrorEntry>,
    pub cancelled: bool,
}

/// Install progress monitor for one deployment
///
/// Give it a client without request-level retry (see
/// [`HttpDeployerClient::polling`](crate::HttpDeployerClient::polling)) so a
/// failing endpoint is hit once per poll interval.
pub struct InstallMonitor {
    api: Arc<dyn DeployerApi>,
    name: String,
    options: MonitorOptions,
    cancel: CancellationToken,
}

impl InstallMonitor {
    pub fn new(api: Arc<dyn DeployerApi>, name: impl Into<String>) -> Self {
        Self {
            api,
            name: name.into(),
            options: MonitorOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: MonitorOptions) -> Self {
        self.options = options;
        self
    }

    /// Token that stops the monitor when cancelled
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start polling on the current runtime
    #[must_use]
    pub fn spawn(self) -> InstallHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run(events_tx));
        InstallHandle {
            events: events_rx,
            cancel,
            task,
        }
    }

    /// Poll until the task ends or the monitor is cancelled
    pub async fn run(self, events: mpsc::UnboundedSender<InstallEvent>) -> InstallOutcome {
        log::info!("Monitoring install of '{}'", self.name);
        let errors = Mutex::new(Vec::new());
        let (status_tx, status_rx) = watch::channel(InstallStatus::Running);

        let ((status, last_task), ()) = tokio::join!(
            self.poll_status(&events, &errors, status_tx),
            self.poll_log(&events, &errors, status_rx),
        );

        let cancelled = status.is_none();
        if cancelled {
            log::info!("Install monitor for '{}' cancelled", self.name);
        }
        InstallOutcome {
            status,
            last_task,
            errors: errors.into_inner(),
            cancelled,
        }
    }

    async fn poll_status(
        &self,
        events: &mpsc::UnboundedSender<InstallEvent>,
        errors: &Mutex<Vec<ErrorEntry>>,
        status_tx: watch::Sender<InstallStatus>,
    ) -> (Option<InstallStatus>, Option<TaskInfo>) {
        let mut last_task = None;
        loop {
            if self.cancel.is_cancelled() {
                return (None, last_task);
            }

            match self.api.install_status(&self.name).await {
                Ok(task) => {
                    let status = task.status.clone();
                    let _ = events.send(InstallEvent::Progress(progress_ratio(
                        task.finished,
                        task.total,
                    )));
                    let _ = events.send(InstallEvent::Status(task.clone()));
                    last_task = Some(task);

                    if status.is_terminal() {
                        log::info!("Install of '{}' ended with {status:?}", self.name);
                        let _ = status_tx.send(status.clone());
                        if !self.pause(self.options.finish_delay).await {
                            return (None, last_task);
                        }
                        let _ = events.send(InstallEvent::Finished(status.clone()));
                        return (Some(status), last_task);
                    }
                }
                Err(e) => record_error(events, errors, "install status", &e).await,
            }

            if !self.pause(self.options.poll_interval).await {
                return (None, last_task);
            }
        }
    }

    async fn poll_log(
        &self,
        events: &mpsc::UnboundedSender<InstallEvent>,
        errors: &Mutex<Vec<ErrorEntry>>,
        status_rx: watch::Receiver<InstallStatus>,
    ) {
        let mut offset = 0;
        loop {
            let ended = status_rx.borrow().is_terminal();
            if self.cancel.is_cancelled() || ended {
                return;
            }

            let result = self.api.install_log(&self.name, offset).await;
            let ended = status_rx.borrow().is_terminal();
            match result {
                // a chunk that arrives after the task ended is dropped
                Ok(_) if ended => return,
                Ok(chunk) => {
                    offset = chunk.offset.max(offset);
                    if !chunk.log.is_empty() {
                        let _ = events.send(InstallEvent::Log(chunk));
                    }
                }
                Err(e) => record_error(events, errors, "install log", &e).await,
            }

            if !self.pause(self.options.poll_interval).await {
                return;
            }
        }
    }

    /// Sleep unless cancelled; `false` when cancelled
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}

async fn record_error(
    events: &mpsc::UnboundedSender<InstallEvent>,
    errors: &Mutex<Vec<ErrorEntry>>,
    what: &str,
    error: &ClientError,
) {
    if error.is_expected() {
        log::warn!("Polling {what} failed, retrying: {error}");
    } else {
        log::error!("Polling {what} failed, retrying: {error}");
    }
    let entry = ErrorEntry::new(error.to_string());
    errors.lock().await.push(entry.clone());
    let _ = events.send(InstallEvent::Error(entry));
}

/// Running monitor
pub struct InstallHandle {
    events: mpsc::UnboundedReceiver<InstallEvent>,
    cancel: CancellationToken,
    task: JoinHandle<InstallOutcome>,
}

impl InstallHandle {
    /// Next event; `None` once the monitor stopped and all events were read
    pub async fn next_event(&mut self) -> Option<InstallEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the monitor to stop
    pub async fn join(self) -> Result<InstallOutcome, tokio::task::JoinError> {
        self.task.await
    }
}
