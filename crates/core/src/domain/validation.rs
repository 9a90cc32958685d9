//! Field-level validation of JSON request payloads.
//!
//! Every check appends to one error list so a caller sees all problems with a
//! payload at once instead of only the first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    InvalidType,
    InvalidJson,
    TooSmall,
    TooBig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub code: FieldErrorCode,
    pub path: Vec<String>,
    pub message: String,
}

#[derive(Clone, Debug, Default, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{} invalid field(s)", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                code: FieldErrorCode::InvalidJson,
                path: Vec::new(),
                message: message.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().filter_map(|error| error.path.first().map(String::as_str))
    }

    fn push(&mut self, field: &str, code: FieldErrorCode, message: impl Into<String>) {
        self.errors.push(FieldError { code, path: vec![field.to_string()], message: message.into() });
    }
}

/// Collects typed fields out of a JSON object, recording every violation.
pub struct FieldReader<'a> {
    object: Option<&'a Map<String, Value>>,
    errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(payload: &'a Value) -> Self {
        let mut errors = ValidationErrors::default();
        let object = payload.as_object();
        if object.is_none() {
            errors.errors.push(FieldError {
                code: FieldErrorCode::InvalidType,
                path: Vec::new(),
                message: "Expected object".to_string(),
            });
        }
        Self { object, errors }
    }

    fn raw(&self, field: &str) -> Option<&'a Value> {
        self.object.and_then(|object| object.get(field)).filter(|value| !value.is_null())
    }

    /// Required string whose length in UTF-16 code units is in `min..=max`.
    ///
    /// Browser clients count `varchar` limits in UTF-16 units, so a character
    /// outside the BMP uses two of them.
    pub fn string(&mut self, field: &str, min: usize, max: usize) -> Option<String> {
        let Some(value) = self.raw(field) else {
            if self.object.is_some() {
                self.errors.push(field, FieldErrorCode::InvalidType, "Required");
            }
            return None;
        };
        let Some(text) = value.as_str() else {
            self.errors.push(
                field,
                FieldErrorCode::InvalidType,
                format!("Expected string, received {}", type_name(value)),
            );
            return None;
        };

        let length = text.encode_utf16().count();
        if length < min {
            self.errors.push(
                field,
                FieldErrorCode::TooSmall,
                format!("String must contain at least {min} character(s)"),
            );
            return None;
        }
        if length > max {
            self.errors.push(
                field,
                FieldErrorCode::TooBig,
                format!("String must contain at most {max} character(s)"),
            );
            return None;
        }

        Some(text.to_string())
    }

    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        let value = self.raw(field)?;
        match value.as_str() {
            Some(text) => Some(text.to_string()),
            None => {
                self.errors.push(
                    field,
                    FieldErrorCode::InvalidType,
                    format!("Expected string, received {}", type_name(value)),
                );
                None
            }
        }
    }

    /// Required finite number; `positive` additionally rejects values `<= 0`.
    pub fn number(&mut self, field: &str, positive: bool) -> Option<f64> {
        let Some(value) = self.raw(field) else {
            if self.object.is_some() {
                self.errors.push(field, FieldErrorCode::InvalidType, "Required");
            }
            return None;
        };
        let Some(number) = value.as_f64().filter(|number| number.is_finite()) else {
            self.errors.push(
                field,
                FieldErrorCode::InvalidType,
                format!("Expected number, received {}", type_name(value)),
            );
            return None;
        };

        if positive && number <= 0.0 {
            self.errors.push(field, FieldErrorCode::TooSmall, "Number must be greater than 0");
            return None;
        }

        Some(number)
    }

    /// Required positive number no greater than `max`.
    pub fn bounded_number(&mut self, field: &str, max: f64) -> Option<f64> {
        let number = self.number(field, true)?;
        if number > max {
            self.errors.push(
                field,
                FieldErrorCode::TooBig,
                format!("Number must be less than or equal to {max}"),
            );
            return None;
        }
        Some(number)
    }

    pub fn optional_bounded_number(&mut self, field: &str, max: f64) -> Option<f64> {
        self.raw(field)?;
        self.bounded_number(field, max)
    }

    /// Finishes reading; `build` only runs when no field was rejected.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, ValidationErrors> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        build().ok_or_else(|| ValidationErrors::malformed("payload could not be read"))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FieldErrorCode, FieldReader};

    #[test]
    fn collects_every_invalid_field() {
        let payload = json!({ "name": 12, "length": "long" });
        let mut reader = FieldReader::new(&payload);
        let name = reader.string("name", 1, 10);
        let length = reader.number("length", true);
        let missing = reader.number("girth", true);

        let errors = reader
            .finish(|| Some((name?, length?, missing?)))
            .expect_err("three invalid fields");

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "length", "girth"]);
        assert!(errors.errors.iter().all(|error| error.code == FieldErrorCode::InvalidType));
    }

    #[test]
    fn string_length_bounds_are_inclusive() {
        let payload = json!({ "short": "", "exact": "abcde", "long": "abcdef" });
        let mut reader = FieldReader::new(&payload);

        assert_eq!(reader.string("short", 1, 5), None);
        assert_eq!(reader.string("exact", 1, 5).as_deref(), Some("abcde"));
        assert_eq!(reader.string("long", 1, 5), None);

        let errors = reader.finish(|| Some(())).expect_err("two bound violations");
        assert_eq!(errors.errors[0].code, FieldErrorCode::TooSmall);
        assert_eq!(errors.errors[1].code, FieldErrorCode::TooBig);
    }

    #[test]
    fn string_length_counts_utf16_units() {
        let payload = json!({ "wide": "\u{1F45E}".repeat(3), "narrow": "é".repeat(5) });
        let mut reader = FieldReader::new(&payload);

        assert_eq!(reader.string("wide", 1, 5), None);
        assert_eq!(reader.string("narrow", 1, 5).as_deref(), Some("ééééé"));

        let errors = reader.finish(|| Some(())).expect_err("six units exceed five");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["wide"]);
        assert_eq!(errors.errors[0].code, FieldErrorCode::TooBig);
    }

    #[test]
    fn bounded_numbers_reject_values_above_the_limit() {
        let payload = json!({ "length": 1e308, "girth": 400, "width": 0 });
        let mut reader = FieldReader::new(&payload);

        assert_eq!(reader.bounded_number("length", 1000.0), None);
        assert_eq!(reader.bounded_number("girth", 1000.0), Some(400.0));
        assert_eq!(reader.bounded_number("width", 1000.0), None);
        assert_eq!(reader.optional_bounded_number("absent", 1000.0), None);

        let errors = reader.finish(|| Some(())).expect_err("two out-of-range values");
        let codes = errors.errors.iter().map(|error| error.code).collect::<Vec<_>>();
        assert_eq!(codes, vec![FieldErrorCode::TooBig, FieldErrorCode::TooSmall]);
    }

    #[test]
    fn non_object_payload_is_rejected_at_root() {
        let payload = json!([1, 2, 3]);
        let mut reader = FieldReader::new(&payload);
        let _ = reader.string("name", 1, 10);

        let errors = reader.finish(|| Some(())).expect_err("array payload");
        assert_eq!(errors.errors.len(), 1);
        assert!(errors.errors[0].path.is_empty());
    }

    #[test]
    fn positive_numbers_reject_zero() {
        let payload = json!({ "length": 0, "girth": 240.5 });
        let mut reader = FieldReader::new(&payload);

        assert_eq!(reader.number("length", true), None);
        assert_eq!(reader.number("girth", true), Some(240.5));
    }
}
