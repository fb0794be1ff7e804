use std::fmt;
use std::str::FromStr;

/// DICOM attribute key as written in the field catalog (`gggg,eeee`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub group: u16,
    pub element: u16,
}

impl FieldKey {
    /// Creates a new FieldKey
    pub const fn new(group: u16, element: u16) -> Self {
        Self { group, element }
    }

    /// Renders the key in the parenthesised form used by the DICOM toolkit,
    /// e.g. `(0010,0010)`
    pub fn to_toolkit_path(&self) -> String {
        format!("({})", self)
    }
}

impl FromStr for FieldKey {
    type Err = String;

    /// Parses a key such as `0010,0010`
    ///
    /// Surrounding parentheses and whitespace are tolerated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim();
        let (group, element) = trimmed
            .split_once(',')
            .ok_or_else(|| format!("Failed to parse field key from '{}'", s))?;

        let parse_part = |part: &str| {
            let part = part.trim();
            if part.len() != 4 {
                return Err(format!("Failed to parse field key from '{}'", s));
            }
            u16::from_str_radix(part, 16)
                .map_err(|e| format!("Failed to parse field key from '{}': {}", s, e))
        };

        Ok(FieldKey {
            group: parse_part(group)?,
            element: parse_part(element)?,
        })
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X},{:04X}", self.group, self.element)
    }
}

/// One header field of the catalog
///
/// The structure (key, description, editable) is fixed when the catalog is
/// loaded. Only `value` and `update` change afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Field {
    /// Attribute key
    #[cfg_attr(feature = "json", serde(serialize_with = "serialize_key"))]
    pub key: FieldKey,

    /// DICOM keyword used to look the element up (e.g. `PatientName`)
    pub description: String,

    /// Whether the operator may supply a replacement value
    pub editable: bool,

    /// Value read from the representative file, or the operator override
    pub value: Option<String>,

    /// Whether the field is overwritten with `value` while zapping
    pub update: bool,
}

impl Field {
    /// Creates a field without value
    pub fn new(key: FieldKey, description: impl Into<String>, editable: bool) -> Self {
        Self {
            key,
            description: description.into(),
            editable,
            value: None,
            update: false,
        }
    }

    /// Returns whether a value was read or supplied
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(feature = "json")]
fn serialize_key<S: serde::Serializer>(key: &FieldKey, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(key)
}
