//! Request parameter binding
//!
//! Converts the flat string parameters of a form submission into typed
//! member values. Values are kept as JSON so every model shares one
//! representation:
//! - text fields: string
//! - checkboxes: bool
//! - timestamps: RFC 3339 string
//! - enum and reference fields: the choice value (ordinal or id) as a string
//! - absent values: null

use super::descriptor::{FieldDescriptor, FieldKind, ModelDescriptor};
use crate::models::{BlogType, FieldError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parameter naming the form session
pub const PARAM_FID: &str = "fid";
/// Parameter naming the parent form session
pub const PARAM_PARENT_FID: &str = "parentfid";
/// Parameter carrying the entity id
pub const PARAM_MID: &str = "mid";
pub const PARAM_TARGET_ON_COMPLETION: &str = "targetOnCompletion";
/// Comma separated subset of members to render
pub const PARAM_MODEL_FIELDS: &str = "modelfields";
/// Property addressed by `validateSingle` and `dependents`
pub const PARAM_PROPERTY_NAME: &str = "propertyName";

/// Form parameters that control the protocol rather than carry member values
pub const FORM_PARAMS: &[&str] = &[
    PARAM_FID,
    PARAM_PARENT_FID,
    PARAM_MID,
    PARAM_TARGET_ON_COMPLETION,
    PARAM_MODEL_FIELDS,
];

/// Flat request parameters, merged from the query string and the body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams(BTreeMap<String, String>);

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value of a parameter, treating empty strings as absent
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Merge `other` into `self`; values from `other` win
    pub fn merge(&mut self, other: FormParams) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Member values of one model after binding
#[derive(Debug, Clone)]
pub struct BoundModel {
    pub model: &'static ModelDescriptor,
    /// Stored entity the values belong to; `None` on create
    pub id: Option<i64>,
    pub values: Map<String, Value>,
    /// Conversion failures, reported alongside validation errors
    pub errors: Vec<FieldError>,
}

impl BoundModel {
    pub fn new(model: &'static ModelDescriptor, values: Map<String, Value>) -> Self {
        Self {
            model,
            id: None,
            values,
            errors: Vec::new(),
        }
    }

    pub fn value(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&Value::Null)
    }

    /// Overlay parameters onto the current values for the listed members
    pub fn bind<'a>(&mut self, params: &FormParams, members: impl IntoIterator<Item = &'a str>) {
        for name in members {
            let Some(field) = self.model.field(name) else {
                continue;
            };
            let Some(raw) = params.get(name) else {
                continue;
            };
            match convert(field, raw) {
                Ok(value) => {
                    self.values.insert(name.to_string(), value);
                }
                Err(message) => {
                    self.errors.push(FieldError::new(name, message));
                }
            }
        }
    }
}

/// Convert one raw parameter according to its field kind
pub fn convert(field: &FieldDescriptor, raw: &str) -> Result<Value, String> {
    match field.kind {
        FieldKind::Text | FieldKind::TextArea => Ok(Value::String(raw.to_string())),
        FieldKind::Checkbox => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| format!("invalid boolean value '{}'", raw)),
        FieldKind::DateTime => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            parse_datetime(raw)
                .map(|dt| Value::String(dt.to_rfc3339()))
                .ok_or_else(|| format!("invalid date '{}'", raw))
        }
        FieldKind::Enum => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            BlogType::from_str(raw)
                .map(|t| Value::String(t.ordinal().to_string()))
                .ok_or_else(|| format!("invalid value '{}'", raw))
        }
        FieldKind::Reference(_) => {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(Value::Null);
            }
            raw.parse::<i64>()
                .map(|id| Value::String(id.to_string()))
                .map_err(|_| format!("invalid id '{}'", raw))
        }
    }
}

/// HTML checkboxes post `on`; the form client posts `true`/`false`
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Accepts RFC 3339, `datetime-local` input values and plain dates (all UTC)
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Read a value as an id (reference and enum members store them as strings)
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn value_as_str(value: &Value) -> Option<&str> {
    value.as_str()
}

pub fn value_as_datetime(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_datetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::form::descriptor::BLOG;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> FormParams {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_form_params_merge_body_wins() {
        let mut query = params(&[("fid", "formq"), ("mid", "1")]);
        query.merge(params(&[("fid", "formb")]));

        assert_eq!(query.get("fid"), Some("formb"));
        assert_eq!(query.get("mid"), Some("1"));
        assert_eq!(params(&[("mid", " ")]).non_empty("mid"), None);
    }

    #[test]
    fn test_bind_converts_by_kind() {
        let mut bound = BoundModel::new(&BLOG, Map::new());
        bound.bind(
            &params(&[
                ("handle", "my blog"),
                ("type", "technology"),
                ("subtype", "12"),
                ("enabled", "on"),
                ("timeCreated", "2024-03-01T10:30"),
            ]),
            ["handle", "type", "subtype", "enabled", "timeCreated"],
        );

        assert!(bound.errors.is_empty(), "{:?}", bound.errors);
        assert_eq!(bound.value("handle"), &json!("my blog"));
        assert_eq!(bound.value("type"), &json!("2"));
        assert_eq!(bound.value("subtype"), &json!("12"));
        assert_eq!(bound.value("enabled"), &json!(true));
        assert_eq!(bound.value("timeCreated"), &json!("2024-03-01T10:30:00+00:00"));
    }

    #[test]
    fn test_bind_only_listed_members() {
        let mut bound = BoundModel::new(&BLOG, Map::new());
        bound.bind(&params(&[("handle", "x"), ("image", "y"), ("fid", "f")]), ["handle"]);

        assert_eq!(bound.value("handle"), &json!("x"));
        assert_eq!(bound.value("image"), &Value::Null);
        assert!(!bound.values.contains_key("fid"));
    }

    #[test]
    fn test_bind_records_conversion_errors() {
        let mut initial = Map::new();
        initial.insert("enabled".into(), json!(false));
        let mut bound = BoundModel::new(&BLOG, initial);
        bound.bind(
            &params(&[("enabled", "maybe"), ("type", "hobby"), ("subtype", "abc")]),
            ["enabled", "type", "subtype"],
        );

        let fields: Vec<&str> = bound.errors.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(fields, vec!["enabled", "type", "subtype"]);
        // Failed conversions keep the previous value
        assert_eq!(bound.value("enabled"), &json!(false));
    }

    #[test]
    fn test_empty_select_becomes_null() {
        let mut bound = BoundModel::new(&BLOG, Map::new());
        bound.bind(&params(&[("type", ""), ("handle", "")]), ["type", "handle"]);
        assert_eq!(bound.value("type"), &Value::Null);
        assert_eq!(bound.value("handle"), &json!(""));
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-01-02T03:04:05Z").is_some());
        assert!(parse_datetime("2024-01-02T03:04:05+02:00").is_some());
        assert!(parse_datetime("2024-01-02 03:04:05").is_some());
        assert!(parse_datetime("2024-01-02").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_value_as_i64() {
        assert_eq!(value_as_i64(&json!("42")), Some(42));
        assert_eq!(value_as_i64(&json!(7)), Some(7));
        assert_eq!(value_as_i64(&Value::Null), None);
        assert_eq!(value_as_i64(&json!("x")), None);
    }
}
