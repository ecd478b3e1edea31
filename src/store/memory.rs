use std::collections::HashMap;

use futures::{
    future::BoxFuture,
    FutureExt,
};
use tokio::sync::RwLock;

use super::{
    apply_update,
    new_record,
    sort_most_recent_first,
    StoreResult,
    TemplateStore,
};
use crate::core::{
    DesignerError,
    Document,
    SavedTemplate,
};

/// Process-local store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, SavedTemplate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for MemoryStore {
    fn create<'a>(
        &'a self,
        name: &'a str,
        document: &'a Document,
    ) -> BoxFuture<'a, StoreResult<String>> {
        async move {
            let record = new_record(name, document);
            let id = record.id.clone();
            self.records.write().await.insert(id.clone(), record);
            Ok(id)
        }
        .boxed()
    }

    fn update<'a>(
        &'a self,
        id: &'a str,
        name: &'a str,
        document: &'a Document,
    ) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            let mut records = self.records.write().await;
            let record =
                records.get_mut(id).ok_or_else(|| DesignerError::NotFound(id.to_string()))?;
            apply_update(record, name, document);
            Ok(())
        }
        .boxed()
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<SavedTemplate>>> {
        async move { Ok(self.records.read().await.get(id).cloned()) }.boxed()
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<SavedTemplate>>> {
        async move {
            let mut records: Vec<SavedTemplate> =
                self.records.read().await.values().cloned().collect();
            sort_most_recent_first(&mut records);
            Ok(records)
        }
        .boxed()
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.records.write().await.remove(id);
            Ok(())
        }
        .boxed()
    }
}
