//! The editing session the UI holds on to.
//!
//! Owns the editable document, the autosave controller, the store handle and
//! the notification queue. Storage failures never end the session: they come
//! back as errors and are also queued as error notifications.

use std::{
    path::{
        Path,
        PathBuf,
    },
    sync::Arc,
};

use log::{
    info,
    warn,
};
use tokio::{
    runtime::Handle,
    sync::watch,
};

use crate::{
    autosave::{
        AutosaveController,
        SaveStatus,
        WriteState,
    },
    core::{
        DesignerConfig,
        DesignerError,
        SavedTemplate,
        UiFlags,
    },
    export,
    notifications::Notifications,
    state::{
        Change,
        EditableState,
    },
    store::{
        JsonFileStore,
        TemplateStore,
    },
};

pub struct DesignerSession {
    state: EditableState,
    store: Arc<dyn TemplateStore>,
    autosave: AutosaveController,
    notifications: Notifications,
}

impl DesignerSession {
    /// Must be called from within a tokio runtime; timers are spawned on it.
    pub fn new(store: Arc<dyn TemplateStore>, config: DesignerConfig) -> Result<Self, DesignerError> {
        let runtime = Handle::try_current()
            .map_err(|e| DesignerError::Custom(format!("no async runtime available: {}", e)))?;

        Ok(Self {
            state: EditableState::new(),
            autosave: AutosaveController::new(store.clone(), config.autosave.clone(), runtime),
            store,
            notifications: Notifications::new(config.notification_duration()),
        })
    }

    /// Session backed by the on-disk store named in `config`.
    pub fn open(config: DesignerConfig) -> Result<Self, DesignerError> {
        let store = JsonFileStore::new(config.store_path());
        info!("Using template store at {}", store.path().display());
        Self::new(Arc::new(store), config)
    }

    pub fn state(&self) -> &EditableState {
        &self.state
    }

    pub fn ui_mut(&mut self) -> &mut UiFlags {
        &mut self.state.ui
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.state.has_unsaved_changes()
    }

    pub fn autosave_status(&self) -> SaveStatus {
        self.autosave.status()
    }

    pub fn manual_save_status(&self) -> SaveStatus {
        self.autosave.manual_status()
    }

    pub fn subscribe_autosave(&self) -> watch::Receiver<SaveStatus> {
        self.autosave.subscribe()
    }

    /// Applies one mutation. Accepted changes schedule an autosave while the
    /// document is bound to a saved template.
    pub fn edit<F>(&mut self, mutate: F) -> Option<Change>
    where
        F: FnOnce(&mut EditableState) -> Option<Change>,
    {
        let change = mutate(&mut self.state)?;

        if let Some(id) = self.state.bound_id().map(str::to_string) {
            match self.state.snapshot() {
                Ok(snapshot) => self.autosave.schedule(&id, snapshot),
                Err(e) => {
                    self.report("Auto-save failed", e);
                }
            }
        }

        Some(change)
    }

    pub async fn create_new_template(&mut self, name: &str) -> Result<String, DesignerError> {
        let snapshot = self.state.snapshot()?;
        let id = match self.store.create(name, &snapshot.document).await {
            Ok(id) => id,
            Err(e) => return Err(self.report("Failed to save template", e)),
        };

        self.autosave.cancel_pending();
        self.state.bind(&id, name, &snapshot);
        info!("Created template \"{}\" ({})", name, id);
        self.notifications.success(format!("Saved \"{}\"", name));
        Ok(id)
    }

    pub async fn save_current_template(&mut self) -> Result<(), DesignerError> {
        let id = self.state.bound_id().ok_or(DesignerError::NoActiveTemplate)?.to_string();
        let snapshot = self.state.snapshot()?;

        match self.autosave.save_now(&id, snapshot.clone()).await {
            Ok(WriteState::Written) => {
                self.state.mark_saved(&snapshot);
                self.notifications.success("Template saved");
                Ok(())
            }
            Ok(WriteState::Stale) => Ok(()),
            Err(e) => Err(self.report("Failed to save template", e)),
        }
    }

    pub async fn load_template(&mut self, id: &str) -> Result<(), DesignerError> {
        let record = match self.store.get(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                let e = DesignerError::NotFound(id.to_string());
                return Err(self.report("Failed to load template", e));
            }
            Err(e) => return Err(self.report("Failed to load template", e)),
        };

        let ui = self.state.ui;
        self.state = EditableState::from_saved(&record)?;
        self.state.ui = ui;
        // Edits scheduled before the load belong to the discarded document.
        self.autosave.cancel_pending();
        info!("Loaded template \"{}\" ({})", record.name, record.id);
        Ok(())
    }

    pub async fn list_templates(&mut self) -> Result<Vec<SavedTemplate>, DesignerError> {
        match self.store.list().await {
            Ok(records) => Ok(records),
            Err(e) => Err(self.report("Failed to list templates", e)),
        }
    }

    pub async fn delete_template(&mut self, id: &str) -> Result<(), DesignerError> {
        if let Err(e) = self.store.delete(id).await {
            return Err(self.report("Failed to delete template", e));
        }

        if self.state.bound_id() == Some(id) {
            self.autosave.cancel_pending();
            self.state.clear_binding();
        }
        info!("Deleted template {}", id);
        Ok(())
    }

    /// Renames the bound template without persisting pending document edits.
    pub async fn rename_current_template(&mut self, name: &str) -> Result<(), DesignerError> {
        let id = self.state.bound_id().ok_or(DesignerError::NoActiveTemplate)?.to_string();

        match self.autosave.rename(&id, name).await {
            Ok(()) => {
                self.state.rename_binding(name);
                Ok(())
            }
            Err(e) => Err(self.report("Failed to rename template", e)),
        }
    }

    /// Starts an unbound document with the built-in note types.
    pub fn new_document(&mut self) {
        self.state.reset();
    }

    /// Stops tying the document to its saved template; later edits stay local.
    pub fn clear_current_template(&mut self) {
        self.state.clear_binding();
    }

    /// Applies finished autosaves to change detection. Call once per UI tick.
    pub fn poll_save_results(&mut self) {
        for outcome in self.autosave.poll_outcomes() {
            match &outcome.result {
                Ok(WriteState::Written) if self.state.bound_id() == Some(outcome.template_id.as_str()) => {
                    self.state.mark_saved(&outcome.snapshot);
                }
                Ok(_) => {}
                Err(message) => {
                    self.notifications.error(format!("Auto-save failed: {}", message));
                }
            }
        }
    }

    /// Writes the active note type's template bundle into `dir`.
    pub fn export_current(&self, dir: &Path) -> Result<PathBuf, DesignerError> {
        let body = self.state.active_template().ok_or_else(|| {
            DesignerError::Custom("active note type has no template".to_string())
        })?;
        let name = match self.state.binding() {
            Some(binding) => binding.name.as_str(),
            None => self.state.document().active_note_type.as_str(),
        };
        export::write_bundle(dir, name, body)
    }

    /// Logs the failure, queues it for the user and hands it back.
    fn report(&mut self, context: &str, error: DesignerError) -> DesignerError {
        warn!("{}: {}", context, error);
        self.notifications.error(format!("{}: {}", context, error));
        error
    }
}
