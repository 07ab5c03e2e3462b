//! Background fetch bridge.
//!
//! A dedicated worker thread polls a [`FetchSource`] every `period` and publishes
//! each result as a fresh `Arc<Snapshot>`. The UI thread picks up the newest one
//! with [`FetchBridge::refresh`] once per frame and never blocks on the worker.
//!
//! ```text
//!   UI thread                         worker thread ("fetch-bridge")
//!   ---------                         ------------------------------
//!   set_keys(keys) --Control::Keys--> applied at the start of the next poll
//!   stop(timeout)  --Control::Stop--> ends the loop, even mid-sleep
//!   refresh()      <--Update-------- Snapshot(Arc<Snapshot>) | Failed(err)
//! ```
//!
//! # Retries
//!
//! A transient [`SourceError`](crate::error::SourceError) is retried up to
//! `retries` times, `retry_interval` apart, within one poll. The last published
//! snapshot stays current meanwhile. Exhausting the budget, or any non-transient
//! error, is fatal: the worker reports it and exits.
//!
//! # Stopping
//!
//! The worker owns the sending half of the update channel, so the channel
//! disconnects exactly when the thread ends. [`FetchBridge::stop`] waits for that
//! with a deadline and reports [`FetchError::JoinTimeout`] if it passes.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::config::{FETCH_PERIOD, FETCH_RETRIES, FETCH_RETRY_INTERVAL};
use crate::error::FetchError;
use crate::store::{FetchSource, Snapshot};

/// Polling cadence and retry budget of a [`FetchBridge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchConfig {
    pub period: Duration,
    /// Retries after the first failed attempt of a poll.
    pub retries: u32,
    pub retry_interval: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            period: FETCH_PERIOD,
            retries: FETCH_RETRIES,
            retry_interval: FETCH_RETRY_INTERVAL,
        }
    }
}

/// UI -> worker.
enum Control {
    Keys(Vec<String>),
    Stop,
}

/// Worker -> UI.
enum Update {
    Snapshot(Arc<Snapshot>),
    Failed(FetchError),
}

// =============================================================================
// Worker
// =============================================================================

pub(crate) struct FetchWorker<S> {
    source: S,
    keys: Vec<String>,
    /// Key list received mid-poll, applied when the next poll starts.
    pending_keys: Option<Vec<String>>,
    config: FetchConfig,
    control: Receiver<Control>,
    stopping: bool,
}

impl<S: FetchSource> FetchWorker<S> {
    fn new(
        source: S,
        keys: Vec<String>,
        config: FetchConfig,
        control: Receiver<Control>,
    ) -> Self {
        Self {
            source,
            keys,
            pending_keys: None,
            config,
            control,
            stopping: false,
        }
    }

    fn handle(
        &mut self,
        message: Control,
    ) {
        match message {
            Control::Keys(keys) => self.pending_keys = Some(keys),
            Control::Stop => self.stopping = true,
        }
    }

    /// Apply queued control messages; the newest key list wins.
    fn drain_control(&mut self) {
        loop {
            match self.control.try_recv() {
                Ok(message) => self.handle(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.stopping = true;
                    break;
                }
            }
        }
        if let Some(keys) = self.pending_keys.take() {
            tracing::debug!(?keys, "fetch keys changed");
            self.keys = keys;
        }
    }

    /// Sleep for `duration` unless stopped first. Returns `false` when stopping.
    fn wait(
        &mut self,
        duration: Duration,
    ) -> bool {
        let deadline = Instant::now() + duration;
        while !self.stopping {
            match self.control.recv_deadline(deadline) {
                Ok(message) => self.handle(message),
                Err(RecvTimeoutError::Timeout) => return true,
                Err(RecvTimeoutError::Disconnected) => self.stopping = true,
            }
        }
        false
    }

    /// Run one poll with retries.
    ///
    /// `Ok(None)` means a stop was requested before a result was available.
    pub(crate) fn poll_once(&mut self) -> Result<Option<Snapshot>, FetchError> {
        self.drain_control();
        if self.stopping {
            return Ok(None);
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match self.source.fetch_batch(&self.keys) {
                Ok(mut snapshot) => {
                    for key in &self.keys {
                        if !snapshot.contains_key(key) {
                            snapshot.insert(key.clone(), None);
                        }
                    }
                    return Ok(Some(snapshot));
                }
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(FetchError::Source(err));
            }
            let retries_left = self.config.retries.saturating_add(1).saturating_sub(attempts);
            if retries_left == 0 {
                return Err(FetchError::RetriesExhausted { attempts, last: err });
            }
            tracing::warn!(
                error = %err,
                retries_left,
                retry_in = ?self.config.retry_interval,
                "fetch failed, retrying"
            );
            if !self.wait(self.config.retry_interval) {
                return Ok(None);
            }
        }
    }

    fn run(
        mut self,
        updates: Sender<Update>,
    ) {
        tracing::info!(keys = self.keys.len(), period = ?self.config.period, "fetch worker started");
        loop {
            match self.poll_once() {
                Ok(Some(snapshot)) => {
                    if updates.send(Update::Snapshot(Arc::new(snapshot))).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(error = %err, "fetch worker giving up");
                    updates.send(Update::Failed(err)).ok();
                    break;
                }
            }
            if !self.wait(self.config.period) {
                break;
            }
        }
        tracing::info!("fetch worker stopped");
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// UI-side handle of the fetch worker.
pub struct FetchBridge {
    handle: Option<JoinHandle<()>>,
    control: Sender<Control>,
    updates: Receiver<Update>,
    snapshot: Arc<Snapshot>,
    failed: bool,
}

impl FetchBridge {
    /// Start polling `keys` from `source` on a new thread.
    pub fn spawn<S: FetchSource>(
        source: S,
        keys: Vec<String>,
        config: FetchConfig,
    ) -> Result<Self, FetchError> {
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let (updates_tx, updates_rx) = crossbeam_channel::unbounded();
        let worker = FetchWorker::new(source, keys, config, control_rx);
        let handle = thread::Builder::new()
            .name("fetch-bridge".into())
            .spawn(move || worker.run(updates_tx))?;

        Ok(Self {
            handle: Some(handle),
            control: control_tx,
            updates: updates_rx,
            snapshot: Arc::new(Snapshot::default()),
            failed: false,
        })
    }

    /// Replace the polled key list. Takes effect with the next poll.
    pub fn set_keys(
        &self,
        keys: Vec<String>,
    ) {
        if self.control.send(Control::Keys(keys)).is_err() {
            tracing::debug!("fetch worker gone, key change dropped");
        }
    }

    /// Current snapshot as of the last [`refresh`](Self::refresh).
    pub fn snapshot(&self) -> Arc<Snapshot> { Arc::clone(&self.snapshot) }

    /// Adopt the newest published snapshot, if any. Never blocks.
    ///
    /// Returns the worker's fatal error once, the first time it is seen.
    pub fn refresh(&mut self) -> Result<Arc<Snapshot>, FetchError> {
        loop {
            match self.updates.try_recv() {
                Ok(Update::Snapshot(snapshot)) => self.snapshot = snapshot,
                Ok(Update::Failed(err)) => {
                    self.failed = true;
                    return Err(err);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.failed {
                        self.failed = true;
                        return Err(FetchError::WorkerPanicked);
                    }
                    break;
                }
            }
        }
        Ok(self.snapshot())
    }

    /// Signal the worker to stop and join it, waiting at most `timeout`.
    pub fn stop(
        mut self,
        timeout: Duration,
    ) -> Result<(), FetchError> {
        self.control.send(Control::Stop).ok();
        let deadline = Instant::now() + timeout;
        loop {
            match self.updates.recv_deadline(deadline) {
                Ok(_) => {}
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(?timeout, "fetch worker did not stop in time, detaching");
                    self.handle.take();
                    return Err(FetchError::JoinTimeout(timeout));
                }
            }
        }
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| FetchError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for FetchBridge {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.control.send(Control::Stop).ok();
        }
    }
}
