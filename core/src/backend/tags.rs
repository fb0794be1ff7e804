use crate::types::FieldKey;
use dicom_core::dictionary::{DataDictionary, TagRange};
use dicom_core::Tag;
use dicom_dictionary_std::StandardDataDictionary;
use dicom_object::InMemDicomObject;

// Patient Tags
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);

// Study Tags
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const INSTITUTION_NAME: Tag = Tag(0x0008, 0x0080);

// SOP Tags
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);

impl From<FieldKey> for Tag {
    fn from(key: FieldKey) -> Self {
        Tag(key.group, key.element)
    }
}

/// Resolves a DICOM keyword (e.g. `PatientName`) to its tag
///
/// Returns `None` for unknown keywords and for keywords naming a tag range
/// rather than a single tag.
pub fn resolve_keyword(keyword: &str) -> Option<Tag> {
    match StandardDataDictionary.by_name(keyword.trim())?.tag {
        TagRange::Single(tag) => Some(tag),
        _ => None,
    }
}

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to string
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
}

/// Helper to get the string value of the element named by a keyword
///
/// Empty values count as absent.
pub fn get_value_by_keyword(dcm: &InMemDicomObject, keyword: &str) -> Option<String> {
    resolve_keyword(keyword)
        .and_then(|tag| get_string_value(dcm, tag))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{DataElement, PrimitiveValue, VR};

    #[test]
    fn test_tag_values() {
        assert_eq!(PATIENT_NAME, Tag(0x0010, 0x0010));
        assert_eq!(PATIENT_AGE, Tag(0x0010, 0x1010));
        assert_eq!(Tag::from(FieldKey::new(0x0008, 0x0020)), STUDY_DATE);
    }

    #[test]
    fn test_resolve_keyword() {
        assert_eq!(resolve_keyword("PatientName"), Some(PATIENT_NAME));
        assert_eq!(resolve_keyword("StudyDescription"), Some(STUDY_DESCRIPTION));
        assert_eq!(resolve_keyword("NotARealKeyword"), None);
    }

    #[test]
    fn test_get_value_by_keyword() {
        let dcm = InMemDicomObject::from_element_iter([
            DataElement::new(PATIENT_NAME, VR::PN, PrimitiveValue::from("Jane Doe ")),
            DataElement::new(INSTITUTION_NAME, VR::LO, PrimitiveValue::from("")),
        ]);

        assert_eq!(
            get_value_by_keyword(&dcm, "PatientName"),
            Some("Jane Doe".to_string())
        );
        assert_eq!(get_value_by_keyword(&dcm, "InstitutionName"), None);
        assert_eq!(get_value_by_keyword(&dcm, "PatientID"), None);
        assert_eq!(get_value_by_keyword(&dcm, "Bogus"), None);
    }
}
