/*
 * variables.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Variable values and the variable store.
//!
//! A [`Variables`] store maps names to [`Value`]s of three logical kinds:
//! strings, integers and booleans. Numbers arriving from JSON that are not
//! exact integers are carried as [`Value::Float`]; whole-valued floats behave
//! as integers everywhere (typed lookup and rendering).

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean value.
    Bool(bool),

    /// An integer value.
    Int(i64),

    /// A number that did not arrive as an exact integer.
    Float(f64),

    /// A string value.
    String(String),
}

/// The kind requested by a typed lookup or a type annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Int,
    Bool,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
        }
    }

    /// Parse a type annotation (`string`, `int` or `bool`).
    pub fn from_annotation(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ValueType::String),
            "int" => Some(ValueType::Int),
            "bool" => Some(ValueType::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Value {
    /// Parse a literal the way directive defaults are parsed.
    ///
    /// Exactly `true`/`false` become booleans, whole numbers become integers,
    /// and anything else is a string.
    pub fn parse_literal(text: &str) -> Value {
        match text {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => match text.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::String(text.to_string()),
            },
        }
    }

    /// Human-readable name of the stored kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(f) if whole_float(*f).is_some() => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; whole-valued floats count as integers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) => whole_float(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this value can be read as the given type.
    pub fn matches_type(&self, ty: ValueType) -> bool {
        match ty {
            ValueType::String => self.as_str().is_some(),
            ValueType::Int => self.as_int().is_some(),
            ValueType::Bool => self.as_bool().is_some(),
        }
    }

    /// Render this value for interpolation.
    ///
    /// - String: as-is
    /// - Bool: `true` or `false`
    /// - Int and whole-valued Float: decimal integer
    /// - Other Float: shortest decimal form
    pub fn render(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => match whole_float(*f) {
                Some(n) => n.to_string(),
                None => f.to_string(),
            },
        }
    }

    /// Convert a JSON value. Only strings, booleans and numbers are accepted.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            _ => None,
        }
    }

    /// Convert back to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Value::from(*f),
        }
    }
}

fn whole_float(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= LIMIT {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Name-to-value store consulted by every directive.
///
/// The store is only read while a template is processed, so a single store
/// can be shared by reference across files rendered in parallel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, Value>,
}

impl Variables {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON object.
    ///
    /// Fails with a type mismatch for `null`, arrays and nested objects.
    pub fn from_json(object: &serde_json::Map<String, serde_json::Value>) -> ParseResult<Self> {
        let mut vars = Variables::new();
        for (name, json) in object {
            let value = Value::from_json(json).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::TypeMismatch,
                    format!(
                        "variable '{}' must be a string, number or boolean, found {}",
                        name,
                        json_kind(json)
                    ),
                )
            })?;
            vars.insert(name.clone(), value);
        }
        Ok(vars)
    }

    /// Assign a variable, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Point lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Look up a string variable.
    pub fn get_string(&self, name: &str) -> ParseResult<&str> {
        let value = self.require(name)?;
        value
            .as_str()
            .ok_or_else(|| ParseError::type_mismatch(name, "string", value.type_name()))
    }

    /// Look up an integer variable. Whole-valued floats are accepted.
    pub fn get_int(&self, name: &str) -> ParseResult<i64> {
        let value = self.require(name)?;
        value
            .as_int()
            .ok_or_else(|| ParseError::type_mismatch(name, "int", value.type_name()))
    }

    /// Look up a boolean variable.
    pub fn get_bool(&self, name: &str) -> ParseResult<bool> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| ParseError::type_mismatch(name, "bool", value.type_name()))
    }

    fn require(&self, name: &str) -> ParseResult<&Value> {
        self.get(name)
            .ok_or_else(|| ParseError::missing_variable(name))
    }

    /// Iterate over all variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy every variable of `other` into this store, overwriting on conflict.
    pub fn extend_from(&mut self, other: &Variables) {
        for (name, value) in other.iter() {
            self.insert(name, value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Variables::new();
        for (k, v) in iter {
            vars.insert(k, v);
        }
        vars
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render() {
        assert_eq!(Value::from("text").render(), "text");
        assert_eq!(Value::Bool(true).render(), "true");
        assert_eq!(Value::Bool(false).render(), "false");
        assert_eq!(Value::Int(-42).render(), "-42");
        assert_eq!(Value::Float(8080.0).render(), "8080");
        assert_eq!(Value::Float(1.5).render(), "1.5");
        assert_eq!(Value::Float(0.1).render(), "0.1");
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(Value::parse_literal("true"), Value::Bool(true));
        assert_eq!(Value::parse_literal("false"), Value::Bool(false));
        assert_eq!(Value::parse_literal("8080"), Value::Int(8080));
        assert_eq!(Value::parse_literal("-3"), Value::Int(-3));
        assert_eq!(Value::parse_literal("True"), Value::from("True"));
        assert_eq!(Value::parse_literal("1.5"), Value::from("1.5"));
        assert_eq!(Value::parse_literal(""), Value::from(""));
    }

    #[test]
    fn test_typed_lookup() {
        let vars: Variables = [
            ("name", Value::from("app")),
            ("port", Value::Int(8080)),
            ("debug", Value::Bool(true)),
        ]
        .into_iter()
        .collect();

        assert_eq!(vars.get_string("name").unwrap(), "app");
        assert_eq!(vars.get_int("port").unwrap(), 8080);
        assert!(vars.get_bool("debug").unwrap());

        let err = vars.get_string("port").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TypeMismatch);

        let err = vars.get_bool("missing").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingVariable);
    }

    #[test]
    fn test_whole_float_is_int() {
        let mut vars = Variables::new();
        vars.insert("count", 3.0);
        vars.insert("ratio", 0.25);

        assert_eq!(vars.get_int("count").unwrap(), 3);
        assert_eq!(
            vars.get_int("ratio").unwrap_err().kind,
            ParseErrorKind::TypeMismatch
        );
        assert!(Value::Float(3.0).matches_type(ValueType::Int));
        assert!(!Value::Float(3.0).matches_type(ValueType::String));
    }

    #[test]
    fn test_from_json() {
        let object = json!({
            "name": "svc",
            "port": 8080,
            "ratio": 0.5,
            "enabled": false,
        });
        let vars = Variables::from_json(object.as_object().unwrap()).unwrap();

        assert_eq!(vars.len(), 4);
        assert_eq!(vars.get("port"), Some(&Value::Int(8080)));
        assert_eq!(vars.get("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(vars.get("enabled"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_from_json_rejects_nested_values() {
        let object = json!({ "items": [1, 2] });
        let err = Variables::from_json(object.as_object().unwrap()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::TypeMismatch);
        assert!(err.message.contains("array"));
    }

    #[test]
    fn test_deserialize_store() {
        let vars: Variables =
            serde_json::from_str(r#"{"a": "x", "b": 2, "c": 2.5, "d": true}"#).unwrap();
        assert_eq!(vars.get("a"), Some(&Value::from("x")));
        assert_eq!(vars.get("b"), Some(&Value::Int(2)));
        assert_eq!(vars.get("c"), Some(&Value::Float(2.5)));
        assert_eq!(vars.get("d"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_iteration_is_name_ordered() {
        let vars: Variables = [("b", 1i64), ("a", 2i64)].into_iter().collect();
        let names: Vec<&str> = vars.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
