use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Field name → human-readable message, keyed by the share-link field names.
///
/// An empty map means the form is valid; callers must not run an engine while any
/// entry is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("invalid input: {}", describe(.0))]
pub struct FieldErrors(BTreeMap<&'static str, String>);

fn describe(fields: &BTreeMap<&'static str, String>) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Later messages for the same field replace earlier ones.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_fields_in_name_order() {
        let mut errors = FieldErrors::new();
        errors.insert("tenure", "1-360 months");
        errors.insert("interestRate", "0-100%");
        assert_eq!(
            errors.to_string(),
            "invalid input: interestRate: 0-100%; tenure: 1-360 months"
        );
    }

    #[test]
    fn later_message_replaces_earlier_one() {
        let mut errors = FieldErrors::single("desiredEmi", "Valid EMI required");
        errors.insert("desiredEmi", "EMI exceeds 40% of salary");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("desiredEmi"), Some("EMI exceeds 40% of salary"));
    }

    #[test]
    fn serializes_as_flat_object() {
        let errors = FieldErrors::single("ctc", "CTC must be at least ₹2,50,000.");
        let json = serde_json::to_string(&errors).expect("serializable");
        assert_eq!(json, r#"{"ctc":"CTC must be at least ₹2,50,000."}"#);
    }

    #[test]
    fn into_result_passes_value_through_when_empty() {
        assert_eq!(FieldErrors::new().into_result(7), Ok(7));
        assert!(FieldErrors::single("ctc", "x").into_result(7).is_err());
    }
}
