// scenebridge/src/registry/params.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Parameter schemas, checked before a handler is invoked.

use serde_json::Value;

use scenebridge_proto::Params;

use crate::error::{HandlerError, HandlerResult};
use crate::scene::{Rgba, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Bool,
    /// Array of exactly 3 numbers.
    Vector3,
    /// Array of 3 or 4 numbers; a missing alpha is filled in as 1.0.
    Color,
    Any,
}

impl ParamType {
    pub fn expected(&self) -> &'static str {
        match self {
            ParamType::String => "a string",
            ParamType::Number => "a number",
            ParamType::Bool => "a boolean",
            ParamType::Vector3 => "an array of 3 numbers",
            ParamType::Color => "an array of 3 or 4 numbers",
            ParamType::Any => "any value",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Bool => value.is_boolean(),
            ParamType::Vector3 => numbers(value).map_or(false, |n| n.len() == 3),
            ParamType::Color => numbers(value).map_or(false, |n| n.len() == 3 || n.len() == 4),
            ParamType::Any => true,
        }
    }
}

fn numbers(value: &Value) -> Option<Vec<f64>> {
    value.as_array()?.iter().map(Value::as_f64).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
        }
    }

    pub fn with_default(name: &'static str, ty: ParamType, default: Value) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: Some(default),
        }
    }
}

/// Ordered list of parameters a command accepts.
///
/// Keys not named in the schema are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    specs: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    /// Checks `raw` and returns a copy with defaults filled in.
    ///
    /// A `null` value counts as absent. Colors come out with 4 components.
    pub fn validate(&self, raw: &Params) -> HandlerResult<Params> {
        let mut params = raw.clone();
        for spec in &self.specs {
            match params.get(spec.name) {
                None | Some(Value::Null) => {
                    params.remove(spec.name);
                    if spec.required {
                        return Err(HandlerError::MissingParam(spec.name.to_string()));
                    }
                    if let Some(default) = &spec.default {
                        params.insert(spec.name.to_string(), default.clone());
                    }
                }
                Some(value) if !spec.ty.accepts(value) => {
                    return Err(HandlerError::InvalidParam {
                        name: spec.name.to_string(),
                        expected: spec.ty.expected().to_string(),
                    });
                }
                Some(_) => {
                    if spec.ty == ParamType::Color {
                        if let Some(Value::Array(components)) = params.get_mut(spec.name) {
                            if components.len() == 3 {
                                components.push(Value::from(1.0));
                            }
                        }
                    }
                }
            }
        }
        Ok(params)
    }
}

/// Typed reads from validated parameters.
pub trait ParamsExt {
    fn str_param(&self, name: &str) -> Option<&str>;
    fn f64_param(&self, name: &str) -> Option<f64>;
    fn bool_param(&self, name: &str) -> Option<bool>;
    fn vec3_param(&self, name: &str) -> Option<Vec3>;
    fn color_param(&self, name: &str) -> Option<Rgba>;

    fn require_str(&self, name: &str) -> HandlerResult<&str> {
        self.str_param(name)
            .ok_or_else(|| HandlerError::MissingParam(name.to_string()))
    }
}

impl ParamsExt for Params {
    fn str_param(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    fn f64_param(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    fn bool_param(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    fn vec3_param(&self, name: &str) -> Option<Vec3> {
        match numbers(self.get(name)?)?.as_slice() {
            [x, y, z] => Some([*x, *y, *z]),
            _ => None,
        }
    }

    fn color_param(&self, name: &str) -> Option<Rgba> {
        crate::scene::rgba_from_slice(&numbers(self.get(name)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn schema() -> ParamSchema {
        ParamSchema::new()
            .param(ParamSpec::required("name", ParamType::String))
            .param(ParamSpec::optional("location", ParamType::Vector3))
            .param(ParamSpec::optional("color", ParamType::Color))
            .param(ParamSpec::with_default("intensity", ParamType::Number, json!(1.0)))
    }

    #[test]
    fn test_defaults_and_color_alpha() {
        let validated = schema()
            .validate(&params(json!({"name": "Cube", "color": [1, 0, 0], "extra": true})))
            .unwrap();
        assert_eq!(validated.f64_param("intensity"), Some(1.0));
        assert_eq!(validated.color_param("color"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(validated.bool_param("extra"), Some(true));
        assert_eq!(validated.require_str("name").unwrap(), "Cube");
        assert_eq!(validated.vec3_param("location"), None);
    }

    #[test]
    fn test_missing_and_null_required() {
        let err = schema().validate(&Params::new()).unwrap_err();
        assert_eq!(err, HandlerError::MissingParam("name".to_string()));

        let err = schema().validate(&params(json!({"name": null}))).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter 'name'");
    }

    #[test]
    fn test_null_optional_takes_default() {
        let validated = schema()
            .validate(&params(json!({"name": "Cube", "intensity": null, "location": null})))
            .unwrap();
        assert_eq!(validated.f64_param("intensity"), Some(1.0));
        assert!(!validated.contains_key("location"));
    }

    #[test]
    fn test_wrong_shapes() {
        let err = schema()
            .validate(&params(json!({"name": "Cube", "location": [1, 2]})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'location': expected an array of 3 numbers"
        );

        let err = schema()
            .validate(&params(json!({"name": 5})))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid parameter 'name': expected a string");

        let err = schema()
            .validate(&params(json!({"name": "Cube", "color": [1, "x", 0]})))
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParam { .. }));
    }
}
