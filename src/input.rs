use serde_json::{Map, Value};

use crate::error::{DocError, DocResult};

/// Typed access to the `arguments` object of a tool call.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    pub fn new(value: &'a Value) -> DocResult<Self> {
        value
            .as_object()
            .map(|map| Self { map })
            .ok_or_else(|| DocError::Validation("arguments must be an object".to_string()))
    }

    /// Absent and `null` are the same thing.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    pub fn required_str(&self, key: &str) -> DocResult<&'a str> {
        self.optional_str(key)?
            .ok_or_else(|| DocError::Validation(format!("missing required parameter: {key}")))
    }

    pub fn optional_str(&self, key: &str) -> DocResult<Option<&'a str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(DocError::Validation(format!("{key} must be a string"))),
        }
    }

    pub fn str_or(&self, key: &str, default: &'a str) -> DocResult<&'a str> {
        Ok(self.optional_str(key)?.unwrap_or(default))
    }

    /// A document index. Anything that is not a whole number is an index
    /// error, not a validation error.
    pub fn index(&self, key: &str) -> DocResult<i64> {
        self.optional_index(key)?
            .ok_or_else(|| DocError::Index(format!("missing required index: {key}")))
    }

    pub fn index_or(&self, key: &str, default: i64) -> DocResult<i64> {
        Ok(self.optional_index(key)?.unwrap_or(default))
    }

    pub fn optional_index(&self, key: &str) -> DocResult<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => whole_number(value).map(Some).ok_or_else(|| {
                DocError::Index(format!("{key} must be an integer, got {value}"))
            }),
        }
    }

    pub fn integer(&self, key: &str) -> DocResult<i64> {
        self.optional_integer(key)?
            .ok_or_else(|| DocError::Validation(format!("missing required parameter: {key}")))
    }

    pub fn integer_or(&self, key: &str, default: i64) -> DocResult<i64> {
        Ok(self.optional_integer(key)?.unwrap_or(default))
    }

    fn optional_integer(&self, key: &str) -> DocResult<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => whole_number(value).map(Some).ok_or_else(|| {
                DocError::Validation(format!("{key} must be an integer, got {value}"))
            }),
        }
    }

    pub fn optional_f64(&self, key: &str) -> DocResult<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .filter(|number| number.is_finite())
                .map(Some)
                .ok_or_else(|| DocError::Validation(format!("{key} must be a number, got {value}"))),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> DocResult<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(*value),
            Some(_) => Err(DocError::Validation(format!("{key} must be a boolean"))),
        }
    }
}

/// Integers, and floats with no fractional part.
fn whole_number(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    let number = value.as_f64()?;
    if number.fract() == 0.0 && number >= i64::MIN as f64 && number <= i64::MAX as f64 {
        Some(number as i64)
    } else {
        None
    }
}
