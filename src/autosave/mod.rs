//! Debounced persistence of the bound document.
//!
//! Status moves `Idle -> Pending -> Saving -> Saved | Error` and falls back to
//! `Idle` after a display delay. Every write for the controller goes through
//! one async gate, so a store never sees two writes from it at once. A write
//! carrying a snapshot older than the last one written is skipped.

pub mod types;

use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use chrono::{
    DateTime,
    Utc,
};
use log::{
    debug,
    info,
    warn,
};
use tokio::{
    runtime::Handle,
    sync::{
        mpsc,
        watch,
        Mutex,
    },
    task::JoinHandle,
};

pub use types::{
    SaveOutcome,
    SaveStatus,
    WriteState,
};

use crate::{
    core::{
        AutosaveConfig,
        DesignerError,
    },
    state::Snapshot,
    store::TemplateStore,
};

struct Writer {
    store: Arc<dyn TemplateStore>,
    // Doubles as the write gate: held for the whole load-merge-write cycle.
    last_written: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Writer {
    async fn write(
        &self,
        template_id: &str,
        snapshot: &Snapshot,
        on_start: impl FnOnce(),
    ) -> Result<WriteState, DesignerError> {
        let mut last_written = self.last_written.lock().await;
        on_start();

        if let Some(previous) = last_written.get(template_id) {
            if snapshot.captured_at < *previous {
                debug!("Skipping stale snapshot for {}", template_id);
                return Ok(WriteState::Stale);
            }
        }

        let existing = self
            .store
            .get(template_id)
            .await?
            .ok_or_else(|| DesignerError::NotFound(template_id.to_string()))?;
        self.store.update(template_id, &existing.name, &snapshot.document).await?;

        last_written.insert(template_id.to_string(), snapshot.captured_at);
        Ok(WriteState::Written)
    }

    async fn rename(&self, template_id: &str, name: &str) -> Result<(), DesignerError> {
        let _gate = self.last_written.lock().await;
        let existing = self
            .store
            .get(template_id)
            .await?
            .ok_or_else(|| DesignerError::NotFound(template_id.to_string()))?;
        self.store.update(template_id, name, &existing.document).await
    }
}

pub struct AutosaveController {
    runtime: Handle,
    config: AutosaveConfig,
    writer: Arc<Writer>,
    status: watch::Sender<SaveStatus>,
    manual_status: watch::Sender<SaveStatus>,
    pending: Option<JoinHandle<()>>,
    sender: mpsc::UnboundedSender<SaveOutcome>,
    receiver: mpsc::UnboundedReceiver<SaveOutcome>,
}

impl AutosaveController {
    pub fn new(store: Arc<dyn TemplateStore>, config: AutosaveConfig, runtime: Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(SaveStatus::Idle);
        let (manual_status, _) = watch::channel(SaveStatus::Idle);

        Self {
            runtime,
            config,
            writer: Arc::new(Writer { store, last_written: Mutex::new(HashMap::new()) }),
            status,
            manual_status,
            pending: None,
            sender,
            receiver,
        }
    }

    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    pub fn manual_status(&self) -> SaveStatus {
        *self.manual_status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_manual(&self) -> watch::Receiver<SaveStatus> {
        self.manual_status.subscribe()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Restarts the debounce window with the latest snapshot.
    pub fn schedule(&mut self, template_id: &str, snapshot: Snapshot) {
        self.abort_timer();
        self.status.send_replace(SaveStatus::Pending);
        debug!("Autosave for {} scheduled in {:?}", template_id, self.config.debounce());

        let debounce = self.config.debounce();
        let runtime = self.runtime.clone();
        let job = WriteJob {
            template_id: template_id.to_string(),
            snapshot,
            writer: self.writer.clone(),
            status: self.status.clone(),
            sender: self.sender.clone(),
            config: self.config.clone(),
            runtime: self.runtime.clone(),
        };

        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            // Once the timer fired the write runs on its own task, out of reach of abort().
            runtime.spawn(job.run());
        }));
    }

    /// Drops a scheduled autosave that has not started writing yet.
    pub fn cancel_pending(&mut self) {
        if self.abort_timer() {
            revert_if(&self.status, SaveStatus::Pending);
        }
    }

    /// Writes immediately, superseding any scheduled autosave.
    pub async fn save_now(
        &mut self,
        template_id: &str,
        snapshot: Snapshot,
    ) -> Result<WriteState, DesignerError> {
        self.cancel_pending();
        self.manual_status.send_replace(SaveStatus::Saving);

        let result = self.writer.write(template_id, &snapshot, || {}).await;
        match &result {
            Ok(_) => {
                info!("Saved template {}", template_id);
                self.manual_status.send_replace(SaveStatus::Saved);
                self.revert_later(self.manual_status.clone(), SaveStatus::Saved, self.config.saved_display());
            }
            Err(e) => {
                warn!("Manual save of {} failed: {}", template_id, e);
                self.manual_status.send_replace(SaveStatus::Error);
                self.revert_later(self.manual_status.clone(), SaveStatus::Error, self.config.error_display());
            }
        }
        result
    }

    /// Renames the stored record, keeping its stored document.
    pub async fn rename(&self, template_id: &str, name: &str) -> Result<(), DesignerError> {
        self.writer.rename(template_id, name).await
    }

    /// Completed automatic writes since the last call.
    pub fn poll_outcomes(&mut self) -> Vec<SaveOutcome> {
        let mut outcomes = Vec::new();

        while let Ok(outcome) = self.receiver.try_recv() {
            outcomes.push(outcome);
        }

        outcomes
    }

    fn abort_timer(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    fn revert_later(&self, status: watch::Sender<SaveStatus>, from: SaveStatus, after: Duration) {
        self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            revert_if(&status, from);
        });
    }
}

impl Drop for AutosaveController {
    fn drop(&mut self) {
        self.abort_timer();
    }
}

fn revert_if(status: &watch::Sender<SaveStatus>, from: SaveStatus) {
    status.send_if_modified(|current| {
        if *current == from {
            *current = SaveStatus::Idle;
            true
        } else {
            false
        }
    });
}

struct WriteJob {
    template_id: String,
    snapshot: Snapshot,
    writer: Arc<Writer>,
    status: watch::Sender<SaveStatus>,
    sender: mpsc::UnboundedSender<SaveOutcome>,
    config: AutosaveConfig,
    runtime: Handle,
}

impl WriteJob {
    async fn run(self) {
        let status = self.status.clone();
        let result = self
            .writer
            .write(&self.template_id, &self.snapshot, || {
                status.send_replace(SaveStatus::Saving);
            })
            .await;

        // A newer edit may already have moved the status back to Pending.
        let (settled, display) = match &result {
            Ok(_) => {
                info!("Autosaved template {}", self.template_id);
                (SaveStatus::Saved, self.config.saved_display())
            }
            Err(e) => {
                warn!("Autosave of {} failed: {}", self.template_id, e);
                (SaveStatus::Error, self.config.error_display())
            }
        };
        let changed = self.status.send_if_modified(|current| {
            if *current == SaveStatus::Saving {
                *current = settled;
                true
            } else {
                false
            }
        });
        if changed {
            let status = self.status.clone();
            self.runtime.spawn(async move {
                tokio::time::sleep(display).await;
                revert_if(&status, settled);
            });
        }

        let outcome = SaveOutcome {
            template_id: self.template_id,
            snapshot: self.snapshot,
            result: result.map_err(|e| e.to_string()),
        };
        if self.sender.send(outcome).is_err() {
            debug!("Autosave controller dropped before the outcome was collected");
        }
    }
}
