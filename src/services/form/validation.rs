//! Field constraint checks
//!
//! Messages follow the bean validation wording the form client displays:
//! `must not be null`, `must not be blank`, `size must be between 0 and N`.

use super::descriptor::{FieldDescriptor, ModelDescriptor};
use crate::models::FieldError;
use serde_json::{Map, Value};

pub const MSG_NOT_NULL: &str = "must not be null";
pub const MSG_NOT_BLANK: &str = "must not be blank";

pub fn size_message(max: usize) -> String {
    format!("size must be between 0 and {}", max)
}

/// Reference to a missing entity
pub fn not_found_message(model: &str, id: i64) -> String {
    format!("no {} found with id {}", model, id)
}

/// Check the declared constraints of every field, or of `property` only
pub fn check_constraints(
    model: &ModelDescriptor,
    values: &Map<String, Value>,
    property: Option<&str>,
) -> Vec<FieldError> {
    model
        .fields
        .iter()
        .filter(|f| property.map_or(true, |p| p == f.name))
        .flat_map(|f| check_field(f, values.get(f.name).unwrap_or(&Value::Null)))
        .collect()
}

/// Constraint violations of a single field; at most one per constraint
pub fn check_field(field: &FieldDescriptor, value: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if value.is_null() {
        if field.required {
            errors.push(FieldError::new(field.name, MSG_NOT_NULL));
        }
        return errors;
    }

    if let Some(s) = value.as_str() {
        if field.not_blank && s.trim().is_empty() {
            errors.push(FieldError::new(field.name, MSG_NOT_BLANK));
        }
        if let Some(max) = field.max_length {
            if s.chars().count() > max {
                errors.push(FieldError::new(field.name, size_message(max)));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::form::descriptor::{BLOG, BLOG_SUBTYPE};
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_required_and_blank() {
        let v = values(&[
            ("handle", json!("   ")),
            ("enabled", json!(false)),
            ("timeCreated", json!("2024-01-01T00:00:00+00:00")),
        ]);

        let errors = check_constraints(&BLOG, &v, None);

        assert_eq!(
            errors,
            vec![
                FieldError::new("handle", MSG_NOT_BLANK),
                FieldError::new("type", MSG_NOT_NULL),
            ]
        );
    }

    #[test]
    fn test_missing_not_blank_field_reports_null() {
        let errors = check_constraints(&BLOG, &Map::new(), Some("handle"));
        assert_eq!(errors, vec![FieldError::new("handle", MSG_NOT_NULL)]);
    }

    #[test]
    fn test_max_length_counts_characters() {
        let at_limit = "é".repeat(128);
        let over = "x".repeat(129);

        let ok = check_constraints(&BLOG_SUBTYPE, &values(&[("name", json!(at_limit))]), Some("name"));
        assert!(ok.is_empty());

        let err = check_constraints(&BLOG_SUBTYPE, &values(&[("name", json!(over))]), Some("name"));
        assert_eq!(err, vec![FieldError::new("name", "size must be between 0 and 128")]);
    }

    #[test]
    fn test_property_filter() {
        let errors = check_constraints(&BLOG, &Map::new(), Some("image"));
        assert!(errors.is_empty());

        let errors = check_constraints(&BLOG, &Map::new(), Some("type"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field_name, "type");
    }

    #[test]
    fn test_optional_empty_string_is_fine() {
        let v = values(&[("description", json!(""))]);
        assert!(check_constraints(&BLOG, &v, Some("description")).is_empty());
    }
}
