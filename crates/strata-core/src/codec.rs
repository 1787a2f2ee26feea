//! Structured text to tree and back.
//!
//! Pages are YAML; prior exports and exported output are JSON.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use strata_common::error::{Result, StrataError};

use crate::value::{Mapping, Value};

/// Converts between structured text and the Document Tree.
pub trait Codec {
    /// Parses `text` into a tree.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Source`] if the text is malformed.
    fn parse(&self, text: &str) -> Result<Value>;

    /// Renders `value` as human-readable text.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    fn to_pretty(&self, value: &Value) -> Result<String>;
}

/// YAML codec backed by `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn parse(&self, text: &str) -> Result<Value> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| StrataError::Source {
            page: None,
            message: e.to_string(),
        })?;
        Ok(Value::from(yaml))
    }

    fn to_pretty(&self, value: &Value) -> Result<String> {
        serde_yaml::to_string(value).map_err(|e| StrataError::Source {
            page: None,
            message: e.to_string(),
        })
    }
}

/// JSON codec backed by `serde_json`; pretty output is indented by four spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn parse(&self, text: &str) -> Result<Value> {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| StrataError::Source {
                page: None,
                message: e.to_string(),
            })?;
        Ok(Value::from(json))
    }

    fn to_pretty(&self, value: &Value) -> Result<String> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        value.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Parses `text` and requires a mapping at the top level.
///
/// Blank text and an explicit null both yield an empty mapping.
///
/// # Errors
///
/// Returns [`StrataError::Source`] for malformed text or a non-mapping
/// top level.
pub fn parse_mapping<C: Codec + ?Sized>(codec: &C, text: &str) -> Result<Mapping> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match codec.parse(text)? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        other => Err(StrataError::Source {
            page: None,
            message: format!("expected a mapping at the top level, found a {}", other.kind()),
        }),
    }
}
