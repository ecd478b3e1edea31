use std::{
    fs,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
};

use log::{
    debug,
    warn,
};
use serde::{
    de::DeserializeOwned,
    Serialize,
};
use tempfile::NamedTempFile;

use crate::core::DesignerError;

const APP_NAME: &str = "anki-template-designer";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

/// Replaces `path` with the serialized data without ever leaving a half-written file behind.
pub fn write_json_atomic<T: Serialize>(data: &T, path: &Path) -> Result<(), DesignerError> {
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir)?;

    let json = serde_json::to_string_pretty(data)?;
    let mut temp_file = NamedTempFile::new_in(parent_dir)?;
    temp_file.write_all(json.as_bytes())?;
    temp_file.persist(path).map_err(|e| DesignerError::from(e.error))?;
    debug!("Data saved to: {}", path.display());
    Ok(())
}

pub fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, DesignerError> {
    if !path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(path)?;
    let data: T = serde_json::from_str(&json)?;
    debug!("Data loaded from: {}", path.display());
    Ok(data)
}

pub fn save_json<T: Serialize>(data: &T, filename: &str) -> Result<(), DesignerError> {
    write_json_atomic(data, &get_data_file_path(filename))
}

pub fn load_json_or_default<T: DeserializeOwned + Default>(filename: &str) -> T {
    read_json_or_default(&get_data_file_path(filename))
}

pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json::<T>(path) {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
            T::default()
        }
    }
}
