use std::collections::BTreeMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

pub const BASIC_NOTE_TYPE: &str = "Basic";
pub const CLOZE_NOTE_TYPE: &str = "Cloze";

const CARD_CSS: &str = ".card {\n font-family: arial;\n font-size: 20px;\n text-align: center;\n color: black;\n background-color: white;\n}\n";

const CLOZE_CSS: &str = "\n.cloze {\n font-weight: bold;\n color: blue;\n}\n.night .cloze {\n color: lightblue;\n}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteType {
    pub name: String,
    pub fields: Vec<String>,
}

impl NoteType {
    pub fn new(name: &str, fields: &[&str]) -> Self {
        Self { name: name.to_string(), fields: fields.iter().map(|f| f.to_string()).collect() }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateSide {
    Front,
    Back,
    Css,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateBody {
    pub front: String,
    pub back: String,
    pub css: String,
}

impl TemplateBody {
    pub fn basic() -> Self {
        Self {
            front: "{{Front}}".to_string(),
            back: "{{FrontSide}}\n\n<hr id=answer>\n\n{{Back}}".to_string(),
            css: CARD_CSS.to_string(),
        }
    }

    pub fn cloze() -> Self {
        Self {
            front: "{{cloze:Text}}".to_string(),
            back: "{{cloze:Text}}\n\n<br>\n\n{{Extra}}".to_string(),
            css: format!("{}{}", CARD_CSS, CLOZE_CSS),
        }
    }

    pub fn side(&self, side: TemplateSide) -> &str {
        match side {
            TemplateSide::Front => &self.front,
            TemplateSide::Back => &self.back,
            TemplateSide::Css => &self.css,
        }
    }

    pub fn side_mut(&mut self, side: TemplateSide) -> &mut String {
        match side {
            TemplateSide::Front => &mut self.front,
            TemplateSide::Back => &mut self.back,
            TemplateSide::Css => &mut self.css,
        }
    }
}

/// Everything that gets persisted for a template. Maps are ordered so the
/// serialized form is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub note_types: Vec<NoteType>,
    pub active_note_type: String,
    pub templates_by_note_type: BTreeMap<String, TemplateBody>,
    pub sample_data: BTreeMap<String, String>,
}

impl Default for Document {
    fn default() -> Self {
        let mut templates_by_note_type = BTreeMap::new();
        templates_by_note_type.insert(BASIC_NOTE_TYPE.to_string(), TemplateBody::basic());
        templates_by_note_type.insert(CLOZE_NOTE_TYPE.to_string(), TemplateBody::cloze());

        let sample_data = [
            ("Front", "What is the capital of France?"),
            ("Back", "Paris"),
            ("Text", "The capital of France is {{c1::Paris}}."),
            ("Extra", "It is a beautiful city."),
        ]
        .iter()
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect();

        Self {
            note_types: vec![
                NoteType::new(BASIC_NOTE_TYPE, &["Front", "Back"]),
                NoteType::new(CLOZE_NOTE_TYPE, &["Text", "Extra"]),
            ],
            active_note_type: BASIC_NOTE_TYPE.to_string(),
            templates_by_note_type,
            sample_data,
        }
    }
}

impl Document {
    pub fn note_type(&self, name: &str) -> Option<&NoteType> {
        self.note_types.iter().find(|n| n.name == name)
    }

    pub fn active(&self) -> Option<&NoteType> {
        self.note_type(&self.active_note_type)
    }

    pub fn active_template(&self) -> Option<&TemplateBody> {
        self.templates_by_note_type.get(&self.active_note_type)
    }

    /// True when the active note type resolves and templates are keyed exactly by note type names.
    pub fn is_consistent(&self) -> bool {
        let names_match = self.note_types.len() == self.templates_by_note_type.len()
            && self.note_types.iter().all(|n| self.templates_by_note_type.contains_key(&n.name));
        names_match && self.active().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTemplate {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub document: Document,
}

impl SavedTemplate {
    pub fn format_updated_at(&self) -> String {
        let local_time = self.updated_at.with_timezone(&chrono::Local);
        local_time.format("%Y-%m-%d %H:%M").to_string()
    }

    pub fn field_count(&self) -> usize {
        self.document.active().map(|n| n.fields.len()).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UiFlags {
    pub is_mobile: bool,
    pub is_night: bool,
}
