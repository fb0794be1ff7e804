use crate::types::field::{Field, FieldKey};
use std::fmt;

/// What happens to one field while zapping
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "lowercase", tag = "action", content = "value"))]
pub enum FieldAction {
    /// Field is not touched
    Leave,
    /// Value is cleared
    Blank,
    /// Value is overwritten with the operator-supplied text
    Replace(String),
}

impl FieldAction {
    /// Decides the action for a single field
    ///
    /// 1. Non-editable with a value read → Blank
    /// 2. Editable and flagged for update → Replace with the current value
    /// 3. Otherwise → Leave
    pub fn for_field(field: &Field) -> Self {
        if !field.editable && field.has_value() {
            FieldAction::Blank
        } else if field.editable && field.update {
            FieldAction::Replace(field.value.clone().unwrap_or_default())
        } else {
            FieldAction::Leave
        }
    }

    /// Returns whether the field gets rewritten
    pub fn is_touched(&self) -> bool {
        !matches!(self, FieldAction::Leave)
    }

    /// Returns the text to write, given the backend's rendering of a blank value
    pub fn new_value<'a>(&'a self, blank: &'a str) -> Option<&'a str> {
        match self {
            FieldAction::Leave => None,
            FieldAction::Blank => Some(blank),
            FieldAction::Replace(value) => Some(value.as_str()),
        }
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            FieldAction::Leave => "leave",
            FieldAction::Blank => "blank",
            FieldAction::Replace(_) => "replace",
        }
    }
}

impl fmt::Display for FieldAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldAction::Replace(value) => write!(f, "replace with '{}'", value),
            other => write!(f, "{}", other.simple_name()),
        }
    }
}

/// Planned action for one catalog field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct PlannedEdit {
    #[cfg_attr(feature = "json", serde(serialize_with = "serialize_key"))]
    pub key: FieldKey,
    pub description: String,
    pub action: FieldAction,
}

/// Read-only view over a field set deciding, per field, what zapping does
///
/// Entries keep catalog iteration order. The plan is a snapshot: rebuild it
/// after changing any field.
///
/// # Example
///
/// ```
/// use dicomzap_core::{Field, FieldKey, ZappingPlan};
///
/// let mut name = Field::new(FieldKey::new(0x0010, 0x0010), "PatientName", false);
/// name.value = Some("Jane Doe".to_string());
///
/// let mut age = Field::new(FieldKey::new(0x0010, 0x1010), "PatientAge", true);
/// age.value = Some("040Y".to_string());
///
/// let plan = ZappingPlan::from_fields([&name, &age]);
/// assert_eq!(plan.changed_fields_count(), 1);
/// assert_eq!(plan.touched().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ZappingPlan {
    edits: Vec<PlannedEdit>,
}

impl ZappingPlan {
    /// Computes the plan for a sequence of fields
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = &'a Field>) -> Self {
        let edits = fields
            .into_iter()
            .map(|field| PlannedEdit {
                key: field.key,
                description: field.description.clone(),
                action: FieldAction::for_field(field),
            })
            .collect();
        Self { edits }
    }

    /// All entries, including untouched fields
    pub fn edits(&self) -> &[PlannedEdit] {
        &self.edits
    }

    /// Entries that rewrite their field
    pub fn touched(&self) -> impl Iterator<Item = &PlannedEdit> {
        self.edits.iter().filter(|edit| edit.action.is_touched())
    }

    /// Number of fields that get blanked or replaced
    ///
    /// Zero means no file is rewritten at all.
    pub fn changed_fields_count(&self) -> usize {
        self.touched().count()
    }

    /// Returns whether no field is touched
    pub fn is_identity(&self) -> bool {
        self.changed_fields_count() == 0
    }
}

#[cfg(feature = "json")]
fn serialize_key<S: serde::Serializer>(key: &FieldKey, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(key)
}
