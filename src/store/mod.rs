//! Persistence of named template snapshots.
//!
//! The store owns [`SavedTemplate`] records; callers only ever receive copies.
//! Every operation is asynchronous and may fail with
//! [`DesignerError::StorageUnavailable`], which is retryable and never fatal
//! to the running session.

pub mod json_file;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

use chrono::Utc;
use futures::future::BoxFuture;
use uuid::Uuid;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::core::{
    DesignerError,
    Document,
    SavedTemplate,
};

pub type StoreResult<T> = Result<T, DesignerError>;

pub trait TemplateStore: Send + Sync {
    /// Persists a new record and returns its freshly generated id.
    fn create<'a>(
        &'a self,
        name: &'a str,
        document: &'a Document,
    ) -> BoxFuture<'a, StoreResult<String>>;

    /// Replaces name and document of an existing record, bumping `updated_at`.
    /// Fails with `NotFound` when the id is absent.
    fn update<'a>(
        &'a self,
        id: &'a str,
        name: &'a str,
        document: &'a Document,
    ) -> BoxFuture<'a, StoreResult<()>>;

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<SavedTemplate>>>;

    /// All records, most recently updated first.
    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<SavedTemplate>>>;

    /// Removing an absent id is not an error.
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<()>>;
}

pub(crate) fn new_record(name: &str, document: &Document) -> SavedTemplate {
    let now = Utc::now();
    SavedTemplate {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        created_at: now,
        updated_at: now,
        document: document.clone(),
    }
}

pub(crate) fn apply_update(record: &mut SavedTemplate, name: &str, document: &Document) {
    // Never move backwards, even if the wall clock does.
    record.updated_at = Utc::now().max(record.updated_at);
    record.name = name.to_string();
    record.document = document.clone();
}

pub(crate) fn sort_most_recent_first(records: &mut [SavedTemplate]) {
    records.sort_by(|a, b| {
        b.updated_at.cmp(&a.updated_at).then_with(|| b.created_at.cmp(&a.created_at))
    });
}
