use crate::state::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    /// Debounce timer running.
    Pending,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn is_saving(&self) -> bool {
        *self == SaveStatus::Saving
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Pending => "Unsaved changes",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "Saved",
            SaveStatus::Error => "Save failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Written,
    /// A newer snapshot already reached the store.
    Stale,
}

/// Result of one automatic write, handed back to the session.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub template_id: String,
    pub snapshot: Snapshot,
    pub result: Result<WriteState, String>,
}

impl SaveOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self.result, Ok(WriteState::Written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert!(SaveStatus::Saving.is_saving());
        assert!(!SaveStatus::Pending.is_saving());
        assert_eq!(SaveStatus::default().label(), "");
        assert_eq!(SaveStatus::Pending.label(), "Unsaved changes");
        assert_eq!(SaveStatus::Saved.label(), "Saved");
    }
}
