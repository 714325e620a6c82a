//! Snapshot and selector types
//!
//! A [`Snapshot`] is one validated payload fetched from the remote catalog
//! for one [`Selector`] value. Sections are kept as raw JSON so that every
//! record can be validated individually by the reconcilers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::errors::DomainError;

/// Partition of the remote catalog requested by one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Products shown on the main page (`on_main=true`)
    OnMain,
    /// Everything else (`on_main=false`)
    OffMain,
}

impl Selector {
    /// Order in which the selectors run on every tick
    pub const ALL: [Selector; 2] = [Selector::OnMain, Selector::OffMain];

    /// Query-string value for `on_main`
    pub fn as_query(&self) -> &'static str {
        match self {
            Selector::OnMain => "true",
            Selector::OffMain => "false",
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "on_main={}", self.as_query())
    }
}

impl FromStr for Selector {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Selector::OnMain),
            "false" => Ok(Selector::OffMain),
            other => Err(DomainError::InvalidSelector(other.to_string())),
        }
    }
}

/// One fetched snapshot, split into its named sections
///
/// Missing or `null` sections deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub product_marks: Vec<Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<Value>,

    #[serde(
        default,
        rename = "special_project_parameters",
        deserialize_with = "null_as_default"
    )]
    pub special_parameters: Map<String, Value>,

    #[serde(
        default,
        rename = "special_project_parameters_actions",
        deserialize_with = "null_as_default"
    )]
    pub special_actions: Vec<Value>,

    #[serde(
        default,
        rename = "special_project_parameters_badges",
        deserialize_with = "null_as_default"
    )]
    pub special_badges: Vec<Value>,

    #[serde(
        default,
        rename = "special_project_parameters_json",
        deserialize_with = "null_as_default"
    )]
    pub special_json_configs: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
