//! Headless core of an Anki card template designer: the editable note-type
//! document, a persistent template store, debounced autosave with change
//! detection, user notifications and plain-text export.

pub mod autosave;
pub mod core;
pub mod export;
pub mod notifications;
pub mod persistence;
pub mod session;
pub mod state;
pub mod store;

pub use crate::{
    autosave::{
        AutosaveController,
        SaveStatus,
    },
    core::{
        DesignerConfig,
        DesignerError,
        Document,
        NoteType,
        SavedTemplate,
        TemplateBody,
        TemplateSide,
    },
    session::DesignerSession,
    state::{
        Change,
        EditableState,
    },
    store::{
        JsonFileStore,
        MemoryStore,
        TemplateStore,
    },
};

/// Installs the `env_logger` backend. `RUST_LOG` overrides the default `info` level.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
