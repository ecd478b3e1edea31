//! The in-memory document the UI edits.
//!
//! Every mutator either keeps the document consistent (see
//! [`Document::is_consistent`]) and returns a [`Change`], or rejects the edit
//! and returns `None` without touching anything.

pub mod change_detection;

use chrono::{
    DateTime,
    Utc,
};
use log::debug;

pub use change_detection::Snapshot;

use crate::core::{
    models::TemplateBody,
    DesignerError,
    Document,
    NoteType,
    SavedTemplate,
    TemplateSide,
    UiFlags,
};

const NEW_NOTE_TYPE_FIELDS: &[&str] = &["Front", "Back"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    FieldAdded { note_type: String, field: String },
    FieldRemoved { note_type: String, field: String },
    NoteTypeAdded(String),
    NoteTypeRemoved(String),
    NoteTypeSwitched(String),
    TemplateEdited(String),
    SampleDataEdited(String),
}

/// The saved template the document is currently tied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct EditableState {
    document: Document,
    binding: Option<Binding>,
    persisted: Option<String>,
    // Capture time of the snapshot behind `persisted`.
    saved_at: Option<DateTime<Utc>>,
    unsaved: bool,
    pub ui: UiFlags,
}

impl Default for EditableState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditableState {
    pub fn new() -> Self {
        Self {
            document: Document::default(),
            binding: None,
            persisted: None,
            saved_at: None,
            unsaved: true,
            ui: UiFlags::default(),
        }
    }

    pub fn from_saved(record: &SavedTemplate) -> Result<Self, DesignerError> {
        if !record.document.is_consistent() {
            return Err(DesignerError::Custom(format!(
                "saved template '{}' has an inconsistent document",
                record.name
            )));
        }

        let mut state = Self::new();
        state.document = record.document.clone();
        state.binding = Some(Binding { id: record.id.clone(), name: record.name.clone() });
        state.persisted = Some(change_detection::serialize(&record.document)?);
        state.saved_at = Some(record.updated_at);
        state.unsaved = false;
        Ok(state)
    }

    /// Starts over with the built-in note types. UI flags are kept.
    pub fn reset(&mut self) {
        let ui = self.ui;
        *self = Self::new();
        self.ui = ui;
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub fn bound_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.id.as_str())
    }

    pub fn bind(&mut self, id: &str, name: &str, saved: &Snapshot) {
        self.binding = Some(Binding { id: id.to_string(), name: name.to_string() });
        self.saved_at = None;
        self.mark_saved(saved);
    }

    pub fn rename_binding(&mut self, name: &str) {
        if let Some(binding) = self.binding.as_mut() {
            binding.name = name.to_string();
        }
    }

    /// Detaches from the saved template but keeps editing the same document.
    pub fn clear_binding(&mut self) {
        self.binding = None;
        self.persisted = None;
        self.saved_at = None;
        self.unsaved = true;
    }

    /// Records `saved` as the persisted state. Edits made after the snapshot
    /// was captured still count as unsaved. A snapshot captured before the one
    /// already recorded is ignored and `false` is returned.
    pub fn mark_saved(&mut self, saved: &Snapshot) -> bool {
        if self.saved_at.is_some_and(|saved_at| saved.captured_at < saved_at) {
            debug!("Ignoring save result older than the recorded one");
            return false;
        }

        self.persisted = Some(saved.serialized.clone());
        self.saved_at = Some(saved.captured_at);
        self.unsaved = change_detection::has_unsaved_changes(&self.document, self.persisted.as_deref());
        true
    }

    /// Always true while unbound.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn snapshot(&self) -> Result<Snapshot, DesignerError> {
        Snapshot::capture(&self.document)
    }

    pub fn active_note_type(&self) -> Option<&NoteType> {
        self.document.active()
    }

    pub fn active_template(&self) -> Option<&TemplateBody> {
        self.document.active_template()
    }

    pub fn fields(&self) -> &[String] {
        self.active_note_type().map(|n| n.fields.as_slice()).unwrap_or(&[])
    }

    pub fn sample_value(&self, field: &str) -> Option<&str> {
        self.document.sample_data.get(field).map(String::as_str)
    }

    pub fn add_field(&mut self, name: &str) -> Option<Change> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let active = self.document.active_note_type.clone();
        let note_type = self.document.note_types.iter_mut().find(|n| n.name == active)?;
        if note_type.has_field(name) {
            return None;
        }

        note_type.fields.push(name.to_string());
        self.document
            .sample_data
            .entry(name.to_string())
            .or_insert_with(|| format!("Sample {}", name));

        self.commit(Change::FieldAdded { note_type: active, field: name.to_string() })
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Change> {
        let active = self.document.active_note_type.clone();
        let note_type = self.document.note_types.iter_mut().find(|n| n.name == active)?;
        let position = note_type.fields.iter().position(|f| f == name)?;
        note_type.fields.remove(position);

        // Sample values are shared by name across note types.
        if !self.document.note_types.iter().any(|n| n.has_field(name)) {
            self.document.sample_data.remove(name);
        }

        self.commit(Change::FieldRemoved { note_type: active, field: name.to_string() })
    }

    pub fn add_note_type(&mut self, name: &str) -> Option<Change> {
        let name = name.trim();
        if name.is_empty() || self.document.note_type(name).is_some() {
            return None;
        }

        self.document.note_types.push(NoteType::new(name, NEW_NOTE_TYPE_FIELDS));
        self.document.templates_by_note_type.insert(name.to_string(), TemplateBody::basic());
        for field in NEW_NOTE_TYPE_FIELDS {
            self.document
                .sample_data
                .entry(field.to_string())
                .or_insert_with(|| format!("Sample {}", field));
        }
        self.document.active_note_type = name.to_string();

        self.commit(Change::NoteTypeAdded(name.to_string()))
    }

    pub fn remove_note_type(&mut self, name: &str) -> Option<Change> {
        if self.document.note_types.len() <= 1 {
            return None;
        }
        let position = self.document.note_types.iter().position(|n| n.name == name)?;

        self.document.note_types.remove(position);
        self.document.templates_by_note_type.remove(name);
        if self.document.active_note_type == name {
            self.document.active_note_type = self.document.note_types[0].name.clone();
        }

        self.commit(Change::NoteTypeRemoved(name.to_string()))
    }

    pub fn switch_note_type(&mut self, name: &str) -> Option<Change> {
        if self.document.active_note_type == name || self.document.note_type(name).is_none() {
            return None;
        }
        self.document.active_note_type = name.to_string();
        self.commit(Change::NoteTypeSwitched(name.to_string()))
    }

    pub fn set_template(&mut self, body: TemplateBody) -> Option<Change> {
        let active = self.document.active_note_type.clone();
        let current = self.document.templates_by_note_type.get_mut(&active)?;
        if *current == body {
            return None;
        }
        *current = body;
        self.commit(Change::TemplateEdited(active))
    }

    pub fn edit_template(&mut self, side: TemplateSide, text: &str) -> Option<Change> {
        let active = self.document.active_note_type.clone();
        let current = self.document.templates_by_note_type.get_mut(&active)?.side_mut(side);
        if current.as_str() == text {
            return None;
        }
        *current = text.to_string();
        self.commit(Change::TemplateEdited(active))
    }

    pub fn set_sample_value(&mut self, field: &str, value: &str) -> Option<Change> {
        if self.sample_value(field) == Some(value) {
            return None;
        }
        self.document.sample_data.insert(field.to_string(), value.to_string());
        self.commit(Change::SampleDataEdited(field.to_string()))
    }

    fn commit(&mut self, change: Change) -> Option<Change> {
        debug_assert!(self.document.is_consistent(), "document invariant broken by {:?}", change);
        debug!("Document changed: {:?}", change);
        self.unsaved =
            change_detection::has_unsaved_changes(&self.document, self.persisted.as_deref());
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::core::models::{
        BASIC_NOTE_TYPE,
        CLOZE_NOTE_TYPE,
    };

    fn bound_state() -> EditableState {
        let mut state = EditableState::new();
        let snapshot = state.snapshot().unwrap();
        state.bind("id-1", "MyCard", &snapshot);
        state
    }

    #[test]
    fn test_add_field() {
        let mut state = EditableState::new();
        let change = state.add_field("Extra");
        assert_eq!(
            change,
            Some(Change::FieldAdded { note_type: BASIC_NOTE_TYPE.into(), field: "Extra".into() })
        );
        assert_eq!(state.fields(), ["Front", "Back", "Extra"]);
        // The default sample value for Extra comes from the Cloze type and is kept.
        assert_eq!(state.sample_value("Extra"), Some("It is a beautiful city."));

        state.add_field("Hint");
        assert_eq!(state.sample_value("Hint"), Some("Sample Hint"));
    }

    #[test]
    fn test_add_field_rejections() {
        let mut state = EditableState::new();
        assert_eq!(state.add_field("Front"), None);
        assert_eq!(state.add_field("   "), None);
        assert_eq!(state.fields().len(), 2);
    }

    #[test]
    fn test_remove_field() {
        let mut state = EditableState::new();
        assert!(state.remove_field("Back").is_some());
        assert_eq!(state.fields(), ["Front"]);
        assert_eq!(state.sample_value("Back"), None);

        assert_eq!(state.remove_field("Nope"), None);
    }

    #[test]
    fn test_remove_field_keeps_shared_sample_data() {
        let mut state = EditableState::new();
        state.add_field("Extra");
        state.remove_field("Extra");
        // Cloze still declares Extra.
        assert!(state.sample_value("Extra").is_some());
    }

    #[test]
    fn test_note_type_lifecycle() {
        let mut state = EditableState::new();
        assert_eq!(state.add_note_type("Reversed"), Some(Change::NoteTypeAdded("Reversed".into())));
        assert_eq!(state.document().active_note_type, "Reversed");
        assert_eq!(state.active_template(), Some(&TemplateBody::basic()));
        assert_eq!(state.add_note_type("Reversed"), None);

        assert!(state.remove_note_type("Reversed").is_some());
        assert_eq!(state.document().active_note_type, BASIC_NOTE_TYPE);
        assert!(state.document().is_consistent());
    }

    #[test]
    fn test_last_note_type_cannot_be_removed() {
        let mut state = EditableState::new();
        assert!(state.remove_note_type(CLOZE_NOTE_TYPE).is_some());
        assert_eq!(state.remove_note_type(BASIC_NOTE_TYPE), None);
        assert_eq!(state.document().note_types.len(), 1);
        assert_eq!(state.remove_note_type("Ghost"), None);
    }

    #[test]
    fn test_switch_note_type() {
        let mut state = EditableState::new();
        assert_eq!(state.switch_note_type("Ghost"), None);
        assert_eq!(state.switch_note_type(BASIC_NOTE_TYPE), None);
        assert!(state.switch_note_type(CLOZE_NOTE_TYPE).is_some());
        assert_eq!(state.fields(), ["Text", "Extra"]);
    }

    #[test]
    fn test_template_and_sample_edits() {
        let mut state = EditableState::new();
        assert!(state.edit_template(TemplateSide::Front, "<b>{{Front}}</b>").is_some());
        assert_eq!(state.edit_template(TemplateSide::Front, "<b>{{Front}}</b>"), None);
        assert_eq!(state.active_template().map(|t| t.front.as_str()), Some("<b>{{Front}}</b>"));

        assert_eq!(state.set_template(TemplateBody::basic()), Some(Change::TemplateEdited(BASIC_NOTE_TYPE.into())));
        assert_eq!(state.set_sample_value("Back", "Paris"), None);
        assert!(state.set_sample_value("Back", "Lyon").is_some());
    }

    #[test]
    fn test_invariants_hold_over_mutation_sequence() {
        let mut state = EditableState::new();
        let names = ["A", "B", "Basic", "Cloze", "C"];
        for round in 0..40 {
            let name = names[round % names.len()];
            match round % 6 {
                0 => state.add_note_type(name),
                1 => state.remove_note_type(name),
                2 => state.switch_note_type(name),
                3 => state.add_field(name),
                4 => state.remove_field(name),
                _ => state.remove_note_type(&state.document().active_note_type.clone()),
            };
            assert!(state.document().is_consistent(), "broken after round {}", round);
            assert!(!state.document().note_types.is_empty());
        }
    }

    #[test]
    fn test_unsaved_tracking() {
        let mut state = EditableState::new();
        assert!(state.has_unsaved_changes());
        state.add_field("Extra");
        assert!(state.has_unsaved_changes());

        let mut state = bound_state();
        assert!(!state.has_unsaved_changes());
        state.set_sample_value("Front", "Changed");
        assert!(state.has_unsaved_changes());
        state.set_sample_value("Front", "What is the capital of France?");
        assert!(!state.has_unsaved_changes());
    }

    #[test]
    fn test_mark_saved_with_stale_snapshot() {
        let mut state = bound_state();
        state.add_field("Extra");
        let snapshot = state.snapshot().unwrap();
        state.add_field("Hint");

        state.mark_saved(&snapshot);
        assert!(state.has_unsaved_changes());
    }

    #[test]
    fn test_mark_saved_ignores_older_snapshot() {
        let mut state = bound_state();
        state.set_sample_value("Back", "Rome");
        let mut older = state.snapshot().unwrap();
        state.set_sample_value("Back", "Madrid");
        let newer = state.snapshot().unwrap();
        older.captured_at = newer.captured_at - chrono::Duration::seconds(1);

        assert!(state.mark_saved(&newer));
        assert!(!state.has_unsaved_changes());

        assert!(!state.mark_saved(&older));
        assert!(!state.has_unsaved_changes());
        assert_eq!(state.sample_value("Back"), Some("Madrid"));
    }

    #[test]
    fn test_from_saved_and_clear_binding() {
        let mut document = Document::default();
        document.sample_data.insert("Front".into(), "Hola".into());
        let now = Utc::now();
        let record = SavedTemplate {
            id: "abc".into(),
            name: "Spanish".into(),
            created_at: now,
            updated_at: now,
            document: document.clone(),
        };

        let mut state = EditableState::from_saved(&record).unwrap();
        assert_eq!(state.bound_id(), Some("abc"));
        assert_eq!(state.document(), &document);
        assert!(!state.has_unsaved_changes());

        state.clear_binding();
        assert_eq!(state.binding(), None);
        assert!(state.has_unsaved_changes());
        assert_eq!(state.document(), &document);

        state.ui.is_night = true;
        state.reset();
        assert_eq!(state.document(), &Document::default());
        assert!(state.ui.is_night);
    }

    #[test]
    fn test_from_saved_rejects_inconsistent_document() {
        let mut document = Document::default();
        document.active_note_type = "Missing".into();
        let now = Utc::now();
        let record = SavedTemplate {
            id: "abc".into(),
            name: "Broken".into(),
            created_at: now,
            updated_at: now,
            document,
        };
        assert!(EditableState::from_saved(&record).is_err());
    }
}
