//! Per-step input checks applied before answers are merged.
//!
//! These run in the core regardless of what the UI already checked, so
//! the accumulator only ever holds values that passed them.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::steps::{ChoiceOption, ContactField, FieldKind};

/// `local@domain.tld` with no whitespace.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Digits, spaces, `+`, parentheses and dashes.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s+()\-]+$").expect("valid regex"));

pub const MSG_REQUIRED: &str = "This field is required";
pub const MSG_INVALID_EMAIL: &str = "Invalid email address";
pub const MSG_INVALID_PHONE: &str = "Invalid phone number";
pub const MSG_EMPTY_TEXT: &str = "Please enter an answer";
pub const MSG_UNKNOWN_OPTION: &str = "Unknown option";

/// A single field that failed its check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check a free-text answer, returning the trimmed value.
pub fn validate_text(field_name: &str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field_name, MSG_EMPTY_TEXT));
    }
    Ok(trimmed.to_string())
}

/// Check that a picked option belongs to the step.
pub fn validate_choice(
    field_name: &str,
    options: &[ChoiceOption],
    option_id: &str,
) -> Result<(), FieldError> {
    if options.iter().any(|o| o.id == option_id) {
        Ok(())
    } else {
        Err(FieldError::new(field_name, MSG_UNKNOWN_OPTION))
    }
}

/// Check one contact field value. Format checks only apply to non-empty
/// values, so optional fields may be left blank.
pub fn validate_contact_field(field: &ContactField, value: &str) -> Result<(), FieldError> {
    let value = value.trim();
    if value.is_empty() {
        if field.required {
            return Err(FieldError::new(&field.name, MSG_REQUIRED));
        }
        return Ok(());
    }

    match field.kind {
        FieldKind::Email if !EMAIL_RE.is_match(value) => {
            Err(FieldError::new(&field.name, MSG_INVALID_EMAIL))
        }
        FieldKind::Phone if !PHONE_RE.is_match(value) => {
            Err(FieldError::new(&field.name, MSG_INVALID_PHONE))
        }
        _ => Ok(()),
    }
}

/// Check every declared field of a contact form in declaration order.
///
/// Returns the first offending field's error, or the full set of
/// `(name, trimmed value)` pairs to merge. Undeclared keys in `values`
/// are ignored; declared but absent fields are treated as empty.
pub fn validate_contact_form(
    fields: &[ContactField],
    values: &BTreeMap<String, String>,
) -> Result<Vec<(String, String)>, FieldError> {
    let mut accepted = Vec::with_capacity(fields.len());
    for field in fields {
        let value = values.get(&field.name).map(String::as_str).unwrap_or("");
        validate_contact_field(field, value)?;
        accepted.push((field.name.clone(), value.trim().to_string()));
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, kind: FieldKind, required: bool) -> ContactField {
        ContactField {
            name: name.to_string(),
            label: name.to_string(),
            kind,
            required,
            placeholder: None,
        }
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn text_rejects_blank_and_trims() {
        assert_eq!(validate_text("about", "   ").unwrap_err().message, MSG_EMPTY_TEXT);
        assert_eq!(validate_text("about", "  hello ").unwrap(), "hello");
    }

    #[test]
    fn email_shape() {
        let f = field("email", FieldKind::Email, true);
        assert!(validate_contact_field(&f, "jane@example.com").is_ok());
        assert!(validate_contact_field(&f, "not-an-email").is_err());
        assert!(validate_contact_field(&f, "jane@example").is_err());
        assert!(validate_contact_field(&f, "ja ne@example.com").is_err());
    }

    #[test]
    fn phone_shape() {
        let f = field("phone", FieldKind::Phone, false);
        assert!(validate_contact_field(&f, "+33 (0)6 12-34-56-78").is_ok());
        assert_eq!(
            validate_contact_field(&f, "call me").unwrap_err().message,
            MSG_INVALID_PHONE
        );
    }

    #[test]
    fn optional_fields_may_be_blank() {
        let f = field("phone", FieldKind::Phone, false);
        assert!(validate_contact_field(&f, "").is_ok());
    }

    #[test]
    fn required_fields_must_be_present() {
        let f = field("name", FieldKind::Text, true);
        assert_eq!(validate_contact_field(&f, "  ").unwrap_err().message, MSG_REQUIRED);
    }

    #[test]
    fn form_reports_first_offending_field() {
        let fields = vec![
            field("name", FieldKind::Text, true),
            field("email", FieldKind::Email, true),
            field("phone", FieldKind::Phone, true),
        ];
        let err = validate_contact_form(&fields, &values(&[("name", "Jane"), ("phone", "x")]))
            .unwrap_err();
        assert_eq!(err.field, "email");
        assert_eq!(err.message, MSG_REQUIRED);
    }

    #[test]
    fn form_returns_declared_fields_only() {
        let fields = vec![
            field("name", FieldKind::Text, true),
            field("phone", FieldKind::Phone, false),
        ];
        let accepted =
            validate_contact_form(&fields, &values(&[("name", " Jane "), ("extra", "x")])).unwrap();
        assert_eq!(
            accepted,
            vec![
                ("name".to_string(), "Jane".to_string()),
                ("phone".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn choice_must_be_declared_option() {
        let options = vec![ChoiceOption {
            id: "red".to_string(),
            label: "Red".to_string(),
        }];
        assert!(validate_choice("color", &options, "red").is_ok());
        assert!(validate_choice("color", &options, "green").is_err());
    }
}
