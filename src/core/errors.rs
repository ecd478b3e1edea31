use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesignerError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("No template is currently being edited")]
    NoActiveTemplate,

    #[error("DesignerError: {0}")]
    Custom(String),
}

impl DesignerError {
    /// Storage failures the user can retry; everything else is a defect or bad input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DesignerError::StorageUnavailable(_) | DesignerError::NotFound(_) | DesignerError::Io(_)
        )
    }
}

impl From<std::io::Error> for DesignerError {
    fn from(error: std::io::Error) -> Self {
        DesignerError::Io(Box::new(error))
    }
}

impl From<tokio::task::JoinError> for DesignerError {
    fn from(error: tokio::task::JoinError) -> Self {
        DesignerError::StorageUnavailable(format!("storage task failed: {}", error))
    }
}
