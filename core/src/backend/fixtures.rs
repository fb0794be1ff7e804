use super::tags::{
    INSTITUTION_NAME, PATIENT_AGE, PATIENT_ID, PATIENT_NAME, SOP_CLASS_UID, SOP_INSTANCE_UID,
};
use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::InMemDicomObject;
use std::path::Path;

const SECONDARY_CAPTURE: &str = "1.2.840.10008.5.1.4.1.1.7";
const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";

/// Writes a small DICOM file carrying patient name, ID, age and institution
pub(crate) fn write_dicom(path: &Path, patient_name: &str, instance_uid: &str) {
    let obj = InMemDicomObject::from_element_iter([
        DataElement::new(SOP_CLASS_UID, VR::UI, PrimitiveValue::from(SECONDARY_CAPTURE)),
        DataElement::new(SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from(instance_uid)),
        DataElement::new(INSTITUTION_NAME, VR::LO, PrimitiveValue::from("General Hospital")),
        DataElement::new(PATIENT_NAME, VR::PN, PrimitiveValue::from(patient_name)),
        DataElement::new(PATIENT_ID, VR::LO, PrimitiveValue::from("12345")),
        DataElement::new(PATIENT_AGE, VR::AS, PrimitiveValue::from("040Y")),
    ]);

    let file_obj = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(SECONDARY_CAPTURE)
                .media_storage_sop_instance_uid(instance_uid),
        )
        .unwrap();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    file_obj.write_to_file(path).unwrap();
}
