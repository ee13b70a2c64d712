/*
 * definitions.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Variable definitions declared by a template manifest.
 *
 * A definition describes one variable a template expects: its type,
 * whether it must be supplied, an optional default, and constraints
 * (`pattern` for strings, `min`/`max` for integers). Resolution merges
 * supplied values with these definitions into the final variable store
 * handed to the directive engine.
 */

use crate::types::CreateError;
use ign_template::{Value, ValueType, Variables};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_type() -> ValueType {
    ValueType::String
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A variable declared in `ign.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    /// Declared type; `string` when omitted
    #[serde(rename = "type", default = "default_type")]
    pub ty: ValueType,

    /// Human-readable description, shown by front ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether generation fails when no value is available
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    /// Value used when none is supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Regular expression a string value must match in full
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Smallest accepted integer value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,

    /// Largest accepted integer value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl VariableDefinition {
    /// Create a definition of the given type with no constraints.
    pub fn new(ty: ValueType) -> Self {
        Self {
            ty,
            description: None,
            required: false,
            default: None,
            pattern: None,
            min: None,
            max: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Check that the definition is self-consistent.
    ///
    /// Constraints must fit the declared type, the pattern must compile,
    /// and a default must satisfy every constraint.
    pub fn check(&self, name: &str) -> Result<(), CreateError> {
        let invalid = |message: String| CreateError::InvalidDefinition {
            name: name.to_string(),
            message,
        };

        if self.pattern.is_some() && self.ty != ValueType::String {
            return Err(invalid(format!(
                "'pattern' applies to string variables, not {}",
                self.ty
            )));
        }
        if (self.min.is_some() || self.max.is_some()) && self.ty != ValueType::Int {
            return Err(invalid(format!(
                "'min' and 'max' apply to int variables, not {}",
                self.ty
            )));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid(format!("'min' ({}) is greater than 'max' ({})", min, max)));
            }
        }
        self.compiled_pattern(name)?;

        if let Some(default) = &self.default {
            self.coerce(name, default).map_err(|e| match e {
                CreateError::InvalidValue { message, .. } => {
                    invalid(format!("default {}", message))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    /// Convert `value` to the declared type and enforce the constraints.
    ///
    /// Strings that read as the declared type are accepted (`"8080"` for an
    /// int, `"true"` for a bool), and any value is accepted for a string
    /// variable in its rendered form.
    pub fn coerce(&self, name: &str, value: &Value) -> Result<Value, CreateError> {
        let invalid = |message: String| CreateError::InvalidValue {
            name: name.to_string(),
            message,
        };

        let typed = match self.ty {
            ValueType::String => Value::String(value.render()),
            ValueType::Int => value
                .as_int()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
                .map(Value::Int)
                .ok_or_else(|| invalid(format!("expected int, found {}", describe(value))))?,
            ValueType::Bool => value
                .as_bool()
                .or_else(|| match value.as_str().map(str::trim) {
                    Some("true") => Some(true),
                    Some("false") => Some(false),
                    _ => None,
                })
                .map(Value::Bool)
                .ok_or_else(|| invalid(format!("expected bool, found {}", describe(value))))?,
        };

        if let (Some(pattern), Some(text)) = (self.compiled_pattern(name)?, typed.as_str()) {
            if !pattern.is_match(text) {
                return Err(invalid(format!(
                    "'{}' does not match pattern '{}'",
                    text,
                    self.pattern.as_deref().unwrap_or_default()
                )));
            }
        }
        if let Some(n) = typed.as_int() {
            if let Some(min) = self.min.filter(|min| n < *min) {
                return Err(invalid(format!("{} is less than the minimum {}", n, min)));
            }
            if let Some(max) = self.max.filter(|max| n > *max) {
                return Err(invalid(format!("{} is greater than the maximum {}", n, max)));
            }
        }

        Ok(typed)
    }

    fn compiled_pattern(&self, name: &str) -> Result<Option<Regex>, CreateError> {
        let Some(pattern) = &self.pattern else {
            return Ok(None);
        };
        Regex::new(&format!("^(?:{})$", pattern))
            .map(Some)
            .map_err(|e| CreateError::InvalidDefinition {
                name: name.to_string(),
                message: format!("invalid pattern: {}", e),
            })
    }
}

fn describe(value: &Value) -> String {
    format!("{} '{}'", value.type_name(), value.render())
}

/// Merge supplied values with the manifest's definitions.
///
/// Supplied values win over defaults and are converted to the declared
/// type. Variables without a definition pass through untouched. Every
/// required variable left without a value is reported at once.
pub fn resolve_variables(
    definitions: &BTreeMap<String, VariableDefinition>,
    supplied: &Variables,
) -> Result<Variables, CreateError> {
    let mut resolved = Variables::new();
    for (name, value) in supplied.iter() {
        if !definitions.contains_key(name) {
            resolved.insert(name, value.clone());
        }
    }

    let mut missing = Vec::new();
    for (name, definition) in definitions {
        let value = match supplied.get(name).or(definition.default.as_ref()) {
            Some(value) => definition.coerce(name, value)?,
            None => {
                if definition.required {
                    missing.push(name.clone());
                }
                continue;
            }
        };
        resolved.insert(name.as_str(), value);
    }

    if !missing.is_empty() {
        return Err(CreateError::MissingVariables(missing));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn defs(entries: Vec<(&str, VariableDefinition)>) -> BTreeMap<String, VariableDefinition> {
        entries
            .into_iter()
            .map(|(name, def)| (name.to_string(), def))
            .collect()
    }

    #[test]
    fn test_deserialize_definition() {
        let def: VariableDefinition = serde_json::from_str(
            r#"{ "type": "int", "description": "Listen port", "default": 8080, "min": 1, "max": 65535 }"#,
        )
        .unwrap();
        assert_eq!(
            def,
            VariableDefinition {
                description: Some("Listen port".to_string()),
                ..VariableDefinition::new(ValueType::Int)
                    .with_default(Value::Int(8080))
                    .with_range(Some(1), Some(65535))
            }
        );
    }

    #[test]
    fn test_type_defaults_to_string() {
        let def: VariableDefinition = serde_json::from_str(r#"{ "required": true }"#).unwrap();
        assert_eq!(def.ty, ValueType::String);
        assert!(def.required);
    }

    #[test]
    fn test_supplied_values_win_over_defaults() {
        let definitions = defs(vec![(
            "port",
            VariableDefinition::new(ValueType::Int).with_default(Value::Int(8080)),
        )]);
        let supplied: Variables = [("port", Value::Int(9000))].into_iter().collect();
        let resolved = resolve_variables(&definitions, &supplied).unwrap();
        assert_eq!(resolved.get("port"), Some(&Value::Int(9000)));

        let resolved = resolve_variables(&definitions, &Variables::new()).unwrap();
        assert_eq!(resolved.get("port"), Some(&Value::Int(8080)));
    }

    #[test]
    fn test_undeclared_values_pass_through() {
        let supplied: Variables = [("extra", Value::from("x"))].into_iter().collect();
        let resolved = resolve_variables(&BTreeMap::new(), &supplied).unwrap();
        assert_eq!(resolved.get("extra"), Some(&Value::from("x")));
    }

    #[test]
    fn test_missing_required_variables_are_all_reported() {
        let definitions = defs(vec![
            ("name", VariableDefinition::new(ValueType::String).required()),
            ("module", VariableDefinition::new(ValueType::String).required()),
            ("optional", VariableDefinition::new(ValueType::String)),
        ]);
        let err = resolve_variables(&definitions, &Variables::new()).unwrap_err();
        match err {
            CreateError::MissingVariables(names) => assert_eq!(names, vec!["module", "name"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_optional_without_default_stays_unset() {
        let definitions = defs(vec![("optional", VariableDefinition::new(ValueType::Bool))]);
        let resolved = resolve_variables(&definitions, &Variables::new()).unwrap();
        assert!(!resolved.contains("optional"));
    }

    #[test]
    fn test_string_values_convert_to_declared_type() {
        let definitions = defs(vec![
            ("port", VariableDefinition::new(ValueType::Int)),
            ("debug", VariableDefinition::new(ValueType::Bool)),
            ("version", VariableDefinition::new(ValueType::String)),
        ]);
        let supplied: Variables = [
            ("port", Value::from("8080")),
            ("debug", Value::from("true")),
            ("version", Value::Int(2)),
        ]
        .into_iter()
        .collect();
        let resolved = resolve_variables(&definitions, &supplied).unwrap();
        assert_eq!(resolved.get("port"), Some(&Value::Int(8080)));
        assert_eq!(resolved.get("debug"), Some(&Value::Bool(true)));
        assert_eq!(resolved.get("version"), Some(&Value::from("2")));
    }

    #[test]
    fn test_type_violation() {
        let definitions = defs(vec![("port", VariableDefinition::new(ValueType::Int))]);
        let supplied: Variables = [("port", Value::from("http"))].into_iter().collect();
        let err = resolve_variables(&definitions, &supplied).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for variable 'port': expected int, found string 'http'"
        );
    }

    #[test]
    fn test_pattern_is_anchored() {
        let def = VariableDefinition::new(ValueType::String).with_pattern("[a-z]+");
        assert!(def.coerce("name", &Value::from("svc")).is_ok());
        assert!(def.coerce("name", &Value::from("svc-1")).is_err());
        assert!(def.coerce("name", &Value::from("1svc")).is_err());
    }

    #[test]
    fn test_range_constraints() {
        let def = VariableDefinition::new(ValueType::Int).with_range(Some(1), Some(10));
        assert_eq!(def.coerce("n", &Value::Int(1)).unwrap(), Value::Int(1));
        assert!(def.coerce("n", &Value::Int(0)).is_err());
        assert!(def.coerce("n", &Value::Int(11)).is_err());
    }

    #[test]
    fn test_check_rejects_inconsistent_definitions() {
        let bad_pattern = VariableDefinition::new(ValueType::String).with_pattern("(");
        assert!(matches!(
            bad_pattern.check("x"),
            Err(CreateError::InvalidDefinition { .. })
        ));

        let pattern_on_int = VariableDefinition::new(ValueType::Int).with_pattern("\\d+");
        assert!(pattern_on_int.check("x").is_err());

        let range_on_bool = VariableDefinition::new(ValueType::Bool).with_range(Some(0), None);
        assert!(range_on_bool.check("x").is_err());

        let inverted = VariableDefinition::new(ValueType::Int).with_range(Some(5), Some(1));
        assert!(inverted.check("x").is_err());

        let bad_default = VariableDefinition::new(ValueType::Int)
            .with_range(None, Some(10))
            .with_default(Value::Int(20));
        let err = bad_default.check("x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid definition for variable 'x': default 20 is greater than the maximum 10"
        );

        assert!(
            VariableDefinition::new(ValueType::Int)
                .with_default(Value::Int(8080))
                .check("port")
                .is_ok()
        );
    }
}
