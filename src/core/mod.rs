pub mod config;
pub mod errors;
pub mod models;

pub use config::{
    AutosaveConfig,
    DesignerConfig,
};
pub use errors::DesignerError;
pub use models::{
    Document,
    NoteType,
    SavedTemplate,
    TemplateBody,
    TemplateSide,
    UiFlags,
};
