use std::sync::{
    atomic::{
        AtomicBool,
        AtomicUsize,
        Ordering,
    },
    Arc,
};

use futures::{
    future::BoxFuture,
    FutureExt,
};

use super::{
    MemoryStore,
    StoreResult,
    TemplateStore,
};
use crate::core::{
    DesignerError,
    Document,
    SavedTemplate,
};

/// Memory store that counts updates and can be switched offline.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    offline: AtomicBool,
    updates: AtomicUsize,
}

impl FlakyStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(DesignerError::StorageUnavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl TemplateStore for FlakyStore {
    fn create<'a>(
        &'a self,
        name: &'a str,
        document: &'a Document,
    ) -> BoxFuture<'a, StoreResult<String>> {
        async move {
            self.check()?;
            self.inner.create(name, document).await
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
            self.check()?;
            self.inner.update(id, name, document).await?;
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        .boxed()
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<SavedTemplate>>> {
        async move {
            self.check()?;
            self.inner.get(id).await
        }
        .boxed()
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<SavedTemplate>>> {
        async move {
            self.check()?;
            self.inner.list().await
        }
        .boxed()
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.check()?;
            self.inner.delete(id).await
        }
        .boxed()
    }
}
