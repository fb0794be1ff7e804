//! Field catalog loading
//!
//! A catalog is an XML document listing the header fields to read and zap:
//!
//! ```xml
//! <data>
//!   <item>
//!     <name>0010,0010</name>
//!     <description>PatientName</description>
//!     <editable>no</editable>
//!   </item>
//! </data>
//! ```
//!
//! `name` is the attribute key, `description` the DICOM keyword the backends
//! look the element up by, and `editable` is `yes` for fields the operator may
//! overwrite. Anything other than `yes` means the field is blanked.

use crate::error::{Result, ZapError};
use crate::types::{Field, FieldKey, ZappingPlan};
use log::debug;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Catalog shipped with the binary
pub const DEFAULT_CATALOG_XML: &str = include_str!("default_fields.xml");

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(rename = "item", default)]
    items: Vec<CatalogItem>,
}

#[derive(Debug, Deserialize)]
struct CatalogItem {
    name: String,
    description: String,
    #[serde(default)]
    editable: Option<String>,
}

/// Ordered set of fields, keyed by attribute key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldCatalog {
    fields: Vec<Field>,
}

impl FieldCatalog {
    /// Builds a catalog from fields, rejecting duplicate keys
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.key) {
                return Err(ZapError::Catalog(format!("duplicate field {}", field.key)));
            }
        }
        Ok(Self { fields })
    }

    /// Parses a catalog document
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document: CatalogDocument = quick_xml::de::from_str(xml)?;

        let fields = document
            .items
            .into_iter()
            .map(|item| {
                let key: FieldKey = item.name.parse().map_err(ZapError::Catalog)?;
                let description = item.description.trim();
                if description.is_empty() {
                    return Err(ZapError::Catalog(format!(
                        "field {} has no description",
                        key
                    )));
                }
                let editable = item.editable.as_deref().map(str::trim) == Some("yes");
                Ok(Field::new(key, description, editable))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded {} catalog fields", fields.len());
        Self::new(fields)
    }

    /// Reads and parses a catalog file
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml(&xml)
    }

    /// The embedded default catalog
    pub fn default_catalog() -> Result<Self> {
        Self::from_xml(DEFAULT_CATALOG_XML)
    }

    /// Fields in catalog order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Mutable access in catalog order
    ///
    /// Only values and update flags are meant to change.
    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the catalog has no field
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks a field up by key
    pub fn get(&self, key: &FieldKey) -> Option<&Field> {
        self.fields.iter().find(|field| field.key == *key)
    }

    /// Current value of a field, if any
    pub fn value_of(&self, key: &FieldKey) -> Option<&str> {
        self.get(key).and_then(|field| field.value.as_deref())
    }

    /// Sets an operator override: the field is rewritten with `value`
    ///
    /// # Errors
    ///
    /// `InvalidUpdate` if the key is unknown or the field is not editable
    pub fn apply_update(&mut self, key: &FieldKey, value: impl Into<String>) -> Result<()> {
        let field = self
            .fields
            .iter_mut()
            .find(|field| field.key == *key)
            .ok_or_else(|| ZapError::InvalidUpdate(format!("unknown field {}", key)))?;

        if !field.editable {
            return Err(ZapError::InvalidUpdate(format!(
                "field {} ({}) is not editable",
                key, field.description
            )));
        }

        field.value = Some(value.into());
        field.update = true;
        Ok(())
    }

    /// Computes the zapping plan for the current field state
    pub fn plan(&self) -> ZappingPlan {
        ZappingPlan::from_fields(&self.fields)
    }
}
