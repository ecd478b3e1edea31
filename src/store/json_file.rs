use std::path::{
    Path,
    PathBuf,
};

use futures::{
    future::BoxFuture,
    FutureExt,
};
use log::{
    info,
    warn,
};
use serde::{
    Deserialize,
    Serialize,
};
use tokio::{
    sync::Mutex,
    task,
};

use super::{
    apply_update,
    new_record,
    sort_most_recent_first,
    StoreResult,
    TemplateStore,
};
use crate::{
    core::{
        DesignerError,
        Document,
        SavedTemplate,
    },
    persistence::{
        read_json,
        write_json_atomic,
    },
};

const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    templates: Vec<SavedTemplate>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self { version: STORE_VERSION, templates: Vec::new() }
    }
}

/// Single-file embedded database. The file is opened on first access and
/// rewritten atomically on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    cache: Mutex<Option<StoreFile>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cache: Mutex::new(None) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> StoreResult<StoreFile> {
        let path = self.path.clone();
        let file = task::spawn_blocking(move || read_json::<StoreFile>(&path))
            .await?
            .map_err(|e| unavailable(&self.path, e))?;

        if file.version > STORE_VERSION {
            return Err(DesignerError::StorageUnavailable(format!(
                "{} has unsupported version {}",
                self.path.display(),
                file.version
            )));
        }

        info!("Opened template store {} ({} templates)", self.path.display(), file.templates.len());
        Ok(file)
    }

    async fn persist(&self, file: StoreFile) -> StoreResult<StoreFile> {
        let path = self.path.clone();
        task::spawn_blocking(move || write_json_atomic(&file, &path).map(|_| file))
            .await?
            .map_err(|e| unavailable(&self.path, e))
    }

    /// Runs `mutate` against a copy of the stored data and commits the copy
    /// to the cache only once it is safely on disk.
    async fn modify<T>(
        &self,
        mutate: impl FnOnce(&mut StoreFile) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut cache = self.cache.lock().await;
        let mut working = match cache.as_ref() {
            Some(file) => file.clone(),
            None => self.open().await?,
        };

        let result = mutate(&mut working)?;
        working.version = STORE_VERSION;
        *cache = Some(self.persist(working).await?);
        Ok(result)
    }

    async fn read<T>(&self, view: impl FnOnce(&StoreFile) -> T) -> StoreResult<T> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.open().await?);
        }
        let file = cache.as_ref().ok_or_else(|| {
            DesignerError::StorageUnavailable(format!("{} is not open", self.path.display()))
        })?;
        Ok(view(file))
    }
}

fn unavailable(path: &Path, error: DesignerError) -> DesignerError {
    warn!("Template store {} unavailable: {}", path.display(), error);
    match error {
        DesignerError::StorageUnavailable(_) => error,
        other => DesignerError::StorageUnavailable(format!("{}: {}", path.display(), other)),
    }
}

impl TemplateStore for JsonFileStore {
    fn create<'a>(
        &'a self,
        name: &'a str,
        document: &'a Document,
    ) -> BoxFuture<'a, StoreResult<String>> {
        async move {
            let record = new_record(name, document);
            let id = record.id.clone();
            self.modify(|file| {
                file.templates.push(record);
                Ok(())
            })
            .await?;
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
            self.modify(|file| {
                let record = file
                    .templates
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| DesignerError::NotFound(id.to_string()))?;
                apply_update(record, name, document);
                Ok(())
            })
            .await
        }
        .boxed()
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<SavedTemplate>>> {
        async move { self.read(|file| file.templates.iter().find(|t| t.id == id).cloned()).await }
            .boxed()
    }

    fn list(&self) -> BoxFuture<'_, StoreResult<Vec<SavedTemplate>>> {
        async move {
            let mut records = self.read(|file| file.templates.clone()).await?;
            sort_most_recent_first(&mut records);
            Ok(records)
        }
        .boxed()
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<()>> {
        async move {
            self.modify(|file| {
                file.templates.retain(|t| t.id != id);
                Ok(())
            })
            .await
        }
        .boxed()
    }
}
