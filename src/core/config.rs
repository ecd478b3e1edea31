use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::DesignerError;
use crate::persistence;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub debounce_ms: u64,
    pub saved_display_ms: u64,
    pub error_display_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { debounce_ms: 1000, saved_display_ms: 2000, error_display_ms: 3000 }
    }
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn saved_display(&self) -> Duration {
        Duration::from_millis(self.saved_display_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
    pub store_file: String,
    pub autosave: AutosaveConfig,
    pub notification_duration_ms: u64,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            store_file: "templates.json".to_string(),
            autosave: AutosaveConfig::default(),
            notification_duration_ms: 3000,
        }
    }
}

impl DesignerConfig {
    /// Reads `config.json` from the app data directory, falling back to defaults.
    pub fn load() -> Self {
        persistence::load_json_or_default(CONFIG_FILE)
    }

    pub fn save(&self) -> Result<(), DesignerError> {
        persistence::save_json(self, CONFIG_FILE)
    }

    pub fn load_from(path: &Path) -> Self {
        persistence::read_json_or_default(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), DesignerError> {
        persistence::write_json_atomic(self, path)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(persistence::get_app_data_dir)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join(&self.store_file)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: DesignerConfig =
            serde_json::from_str(r#"{ "autosave": { "debounce_ms": 250 } }"#).unwrap();
        assert_eq!(config.autosave.debounce(), Duration::from_millis(250));
        assert_eq!(config.autosave.saved_display(), Duration::from_secs(2));
        assert_eq!(config.autosave.error_display(), Duration::from_secs(3));
        assert_eq!(config.store_file, "templates.json");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = DesignerConfig {
            data_dir: Some(dir.path().to_path_buf()),
            autosave: AutosaveConfig { debounce_ms: 400, ..Default::default() },
            notification_duration_ms: 5000,
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(DesignerConfig::load_from(&path), config);
        assert_eq!(DesignerConfig::load_from(&path).notification_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_unreadable_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(DesignerConfig::load_from(&path), DesignerConfig::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(DesignerConfig::load_from(&path), DesignerConfig::default());
    }

    #[test]
    fn test_data_dir_override() {
        let config = DesignerConfig { data_dir: Some(PathBuf::from("/tmp/designer")), ..Default::default() };
        assert_eq!(config.store_path(), PathBuf::from("/tmp/designer/templates.json"));
    }
}
