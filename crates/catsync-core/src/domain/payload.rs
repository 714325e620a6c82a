//! Payload schema validation
//!
//! Every incoming record is checked against the fixed required-field set of
//! its kind before anything is written. A key counts as present only when it
//! is non-null. Type mismatches surface as [`RecordError::Malformed`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::catalog::{Product, ProjectJsonConfig, ProjectParameter};
use super::errors::{DomainError, RecordError};

/// Wire format of product timestamps, always UTC
pub const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Suffix marking a special-parameter value entry
const PARAMETER_VALUE_SUFFIX: &str = "_value";

/// Suffix marking a special-parameter description entry
const PARAMETER_DESCRIPTION_SUFFIX: &str = "_description";

/// A record kind that can be decoded from a snapshot payload
pub trait IncomingRecord: DeserializeOwned {
    /// Payload keys that must be present and non-null
    const REQUIRED: &'static [&'static str];
}

/// Checks that `raw` is an object carrying every field in `required`
pub fn check_required<'a>(
    raw: &'a Value,
    required: &[&'static str],
) -> Result<&'a Map<String, Value>, RecordError> {
    let object = raw.as_object().ok_or(RecordError::NotAnObject)?;
    for field in required {
        match object.get(*field) {
            None | Some(Value::Null) => return Err(RecordError::MissingField(field.to_string())),
            Some(_) => {}
        }
    }
    Ok(object)
}

/// Validates `raw` against `T::REQUIRED`, then decodes it
pub fn decode<T: IncomingRecord>(raw: &Value) -> Result<T, RecordError> {
    check_required(raw, T::REQUIRED)?;
    T::deserialize(raw).map_err(|e| RecordError::Malformed(e.to_string()))
}

/// Reads an integer external ID from `raw[field]`
pub fn read_id(raw: &Value, field: &'static str) -> Result<i64, RecordError> {
    let object = check_required(raw, &[field])?;
    object
        .get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| RecordError::Malformed(format!("{field} is not an integer")))
}

/// Parses a wire timestamp such as `Tue, 14 Jan 2025 10:30:00 GMT`
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::InvalidTimestamp(format!("{raw:?}: {e}")))
}

/// Renders a JSON value as stored text: strings verbatim, anything else as JSON
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads an optional text column that upstream sends either as a string or
/// as a bare number; `null` and absence both map to `None`
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_null()).map(|v| value_to_text(&v)))
}

// ============================================================================
// Product payload
// ============================================================================

/// A product entry as it arrives from the remote catalog
///
/// Nested sections stay raw: `None` means the key was absent and the
/// collection is left untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingProduct {
    #[serde(rename = "Product_ID")]
    pub id: i64,
    #[serde(rename = "Product_Name")]
    pub name: String,
    #[serde(rename = "OnMain")]
    pub on_main: bool,
    #[serde(rename = "Created_At", default)]
    pub created_at: Option<Value>,
    #[serde(rename = "Updated_At", default)]
    pub updated_at: Option<Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "moysklad_connector_products_data", default)]
    pub connector_data: Option<Value>,
    #[serde(skip)]
    pub sections: Map<String, Value>,
}

impl IncomingRecord for IncomingProduct {
    const REQUIRED: &'static [&'static str] = &["Product_ID", "Product_Name", "OnMain"];
}

/// Outcome of reading one product timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    Parsed(DateTime<Utc>),
    /// Absent or unparsable; carries the reason for the warning line
    Fallback(String),
}

impl IncomingProduct {
    /// Validates and decodes a product entry, keeping its nested sections
    pub fn decode(raw: &Value) -> Result<Self, RecordError> {
        let mut product: IncomingProduct = decode(raw)?;
        if let Some(object) = raw.as_object() {
            product.sections = object
                .iter()
                .filter(|(_, v)| v.is_array())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        Ok(product)
    }

    /// Raw entries of a nested section, or `None` when the key is absent
    pub fn section(&self, key: &str) -> Option<&[Value]> {
        self.sections.get(key).and_then(Value::as_array).map(Vec::as_slice)
    }

    pub fn created_at(&self) -> Timestamp {
        read_timestamp("Created_At", self.created_at.as_ref())
    }

    pub fn updated_at(&self) -> Timestamp {
        read_timestamp("Updated_At", self.updated_at.as_ref())
    }

    /// Connector blob as stored text
    pub fn connector_text(&self) -> Option<String> {
        match &self.connector_data {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_to_text(value)),
        }
    }

    /// Builds the scalar product row from resolved timestamps
    pub fn to_product(&self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Product {
        Product {
            id: self.id,
            name: self.name.clone(),
            on_main: self.on_main,
            created_at,
            updated_at,
            connector_data: self.connector_text(),
            tags: self.tags.clone(),
        }
    }
}

fn read_timestamp(field: &str, raw: Option<&Value>) -> Timestamp {
    match raw {
        None | Some(Value::Null) => Timestamp::Fallback(format!("{field} is missing")),
        Some(Value::String(s)) => match parse_timestamp(s) {
            Ok(ts) => Timestamp::Parsed(ts),
            Err(e) => Timestamp::Fallback(format!("{field}: {e}")),
        },
        Some(other) => Timestamp::Fallback(format!("{field} is not a string: {other}")),
    }
}

// ============================================================================
// Special sections
// ============================================================================

/// Extracts project parameters from the special-parameters map
///
/// Every `{key}_value` entry yields one parameter; a sibling
/// `{key}_description` string becomes its description. Other keys are ignored.
pub fn project_parameters(map: &Map<String, Value>) -> Vec<ProjectParameter> {
    map.iter()
        .filter_map(|(name, value)| {
            let key = name.strip_suffix(PARAMETER_VALUE_SUFFIX)?;
            let description = map
                .get(&format!("{key}{PARAMETER_DESCRIPTION_SUFFIX}"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Some(ProjectParameter {
                key: key.to_string(),
                value: value_to_text(value),
                description,
            })
        })
        .collect()
}

/// Extracts JSON configs from the special-json map, one per config type
pub fn json_configs(map: &Map<String, Value>) -> Vec<ProjectJsonConfig> {
    map.iter()
        .map(|(config_type, data)| ProjectJsonConfig {
            config_type: config_type.clone(),
            config_data: data.clone(),
        })
        .collect()
}
