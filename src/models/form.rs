//! Form protocol types
//!
//! These types are the JSON contract between the form API and the browser
//! form client:
//! - `FormAction` / `FormStage` for addressing a form and tracking progress
//! - `Form` and `FormMember` describing the rendered fields
//! - `FormConfig`, the envelope returned by every form stage

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header line placed in front of field error messages
pub const ERRORS_HEADER: &str = "The following field(s) have errors";

/// Template rendered for form pages
pub const TEMPLATE_PAGE: &str = "webform";
/// Base path of the form pages
pub const BASEPATH: &str = "/webform";
/// Base path of the form API
pub const API_BASEPATH: &str = "/api/webform";

/// CRUD action a form performs on its model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormAction {
    Create,
    Read,
    Update,
    Delete,
}

impl FormAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormAction::Create => "create",
            FormAction::Read => "read",
            FormAction::Update => "update",
            FormAction::Delete => "delete",
        }
    }

    /// Parse an action name, case-insensitively
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "create" => Some(FormAction::Create),
            "read" => Some(FormAction::Read),
            "update" => Some(FormAction::Update),
            "delete" => Some(FormAction::Delete),
            _ => None,
        }
    }

    /// Actions whose fields are displayed but never bound
    pub fn is_read_only(&self) -> bool {
        matches!(self, FormAction::Read | FormAction::Delete)
    }

    /// Actions that operate on an existing entity
    pub fn requires_id(&self) -> bool {
        !matches!(self, FormAction::Create)
    }
}

impl std::fmt::Display for FormAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Protocol stage a form session has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStage {
    #[default]
    Begin,
    Validate,
    Submit,
}

/// One selectable option of an enum or reference member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub value: String,
}

impl Choice {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// A single field of a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMember {
    /// DOM id, unique within the page (`<fid>-<name>`)
    pub id: String,
    pub name: String,
    pub label: String,
    pub display_name: String,
    pub advice: String,
    pub value: serde_json::Value,
    pub choices: Vec<Choice>,
    /// Maximum input length, `-1` when unbounded
    pub max_length: i64,
    pub size: u32,
    pub number_of_lines: u32,
    /// Widget type (`text`, `textarea`, `number`, `checkbox`, `datetime`, `select`)
    #[serde(rename = "type")]
    pub member_type: String,
    pub data_type: String,
    pub referenced_form_href: Option<String>,
    pub optional: bool,
    pub required: bool,
    pub multi_choice: bool,
    pub multiple: bool,
    pub form_reference: bool,
}

/// Field layout of a form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    /// Form id, equal to the session `fid`
    pub id: String,
    /// Model name (lower case)
    pub name: String,
    pub display_name: String,
    pub members: Vec<FormMember>,
    pub member_names: Vec<String>,
    /// REST resource the form reads from and writes to
    pub data_source: String,
}

impl Form {
    pub fn member(&self, name: &str) -> Option<&FormMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_mut(&mut self, name: &str) -> Option<&mut FormMember> {
        self.members.iter_mut().find(|m| m.name == name)
    }
}

/// A validation failure on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_name: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field_name, self.message)
    }
}

/// Envelope exchanged at every form stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    pub action: FormAction,
    pub modelname: String,
    pub fid: String,
    pub mid: Option<i64>,
    pub parentfid: Option<String>,
    pub target_on_completion: Option<String>,
    pub modelfields: Option<String>,
    pub stage: FormStage,
    pub form: Form,
    #[serde(rename = "webform.messages.errors", with = "indexed_messages", default)]
    pub errors: Vec<String>,
    #[serde(rename = "webform.messages.infos", with = "indexed_messages", default)]
    pub infos: Vec<String>,
    #[serde(default)]
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl FormConfig {
    /// Replace the messages with the given field errors.
    ///
    /// An empty slice clears all error state.
    pub fn set_errors(&mut self, errors: &[FieldError]) {
        self.errors.clear();
        self.field_errors.clear();
        if errors.is_empty() {
            return;
        }
        self.errors.push(ERRORS_HEADER.to_string());
        for e in errors {
            self.errors.push(e.to_string());
            self.field_errors
                .entry(e.field_name.clone())
                .or_default()
                .push(e.message.clone());
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_info(&mut self, message: impl Into<String>) {
        self.infos.push(message.into());
    }
}

/// Serializes a message list as an object keyed by position
/// (`{"0": "...", "1": "..."}`), the shape the form client reads.
pub mod indexed_messages {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(messages: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(messages.len()))?;
        for (i, m) in messages.iter().enumerate() {
            map.serialize_entry(&i.to_string(), m)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut indexed = raw
            .into_iter()
            .map(|(k, v)| {
                k.parse::<usize>()
                    .map(|i| (i, v))
                    .map_err(|_| serde::de::Error::custom(format!("invalid message index '{}'", k)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        indexed.sort_by_key(|(i, _)| *i);
        Ok(indexed.into_iter().map(|(_, v)| v).collect())
    }
}
