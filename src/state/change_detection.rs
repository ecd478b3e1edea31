use chrono::{
    DateTime,
    Utc,
};

use crate::core::{
    DesignerError,
    Document,
};

/// A fully serialized copy of a document at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub document: Document,
    pub serialized: String,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn capture(document: &Document) -> Result<Self, DesignerError> {
        Ok(Self {
            document: document.clone(),
            serialized: serialize(document)?,
            captured_at: Utc::now(),
        })
    }
}

/// Deterministic because every map in `Document` is ordered.
pub fn serialize(document: &Document) -> Result<String, DesignerError> {
    Ok(serde_json::to_string(document)?)
}

/// `persisted` is `None` when the document is not bound to a saved template,
/// which always counts as unsaved.
pub fn has_unsaved_changes(current: &Document, persisted: Option<&str>) -> bool {
    match persisted {
        None => true,
        Some(saved) => serialize(current).map(|current| current != saved).unwrap_or(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_is_always_unsaved() {
        assert!(has_unsaved_changes(&Document::default(), None));
    }

    #[test]
    fn test_structural_equality() {
        let saved = Snapshot::capture(&Document::default()).unwrap();
        let rebuilt = Document::default();
        assert!(!has_unsaved_changes(&rebuilt, Some(&saved.serialized)));

        let mut edited = rebuilt.clone();
        edited.sample_data.insert("Back".into(), "Lyon".into());
        assert!(has_unsaved_changes(&edited, Some(&saved.serialized)));
    }

    #[test]
    fn test_serialization_is_stable_across_insert_order() {
        let mut a = Document::default();
        a.sample_data.insert("Zeta".into(), "z".into());
        a.sample_data.insert("Alpha".into(), "a".into());

        let mut b = Document::default();
        b.sample_data.insert("Alpha".into(), "a".into());
        b.sample_data.insert("Zeta".into(), "z".into());

        assert_eq!(serialize(&a).unwrap(), serialize(&b).unwrap());
    }
}
