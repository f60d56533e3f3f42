// scenebridge/src/handlers/code.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Script execution and natural-language passthrough.

use serde_json::Value;

use scenebridge_proto::{Command, Params};

use crate::error::HandlerResult;
use crate::registry::ParamsExt;
use crate::scene::Scene;
use crate::script;
use crate::translator;

/// Characters of code or text kept in a history description.
pub const CODE_PREVIEW_CHARS: usize = 50;

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(CODE_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn describe_execute(params: &Params) -> String {
    format!("Executing code: {}", preview(params.str_param("code").unwrap_or("")))
}

pub fn describe_natural_language(params: &Params) -> String {
    format!("Processing: {}", preview(params.str_param("text").unwrap_or("")))
}

pub fn execute_code(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let code = params.require_str("code")?;
    let result = script::run(code, scene)?;
    Ok(Value::String(result))
}

/// Runs `code` with the named object active. Nothing changes if either step fails.
pub fn modify_active_object(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let name = params.require_str("name")?;
    let code = params.require_str("code")?;

    let mut staged = scene.clone();
    staged.set_active(name)?;
    let result = script::run(code, &mut staged)?;
    *scene = staged;
    Ok(Value::String(result))
}

pub fn natural_language(params: &Params) -> HandlerResult<Command> {
    let text = params.require_str("text")?;
    tracing::debug!(rule = translator::matching_rule(text), "Translated instruction");
    Ok(translator::translate(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    #[test]
    fn test_execute_code_result() {
        let mut scene = Scene::new("Test");
        let result = execute_code(
            &mut scene,
            &params(json!({"code": "add cube name=\"A\"\nresult \"made A\""})),
        )
        .unwrap();
        assert_eq!(result, json!("made A"));
        assert!(scene.object("A").is_some());

        let err = execute_code(&mut scene, &params(json!({"code": "explode"}))).unwrap_err();
        assert_eq!(err.to_string(), "Syntax error on line 1: unknown statement 'explode'");
    }

    #[test]
    fn test_modify_active_object() {
        let mut scene = Scene::with_default_contents();
        modify_active_object(
            &mut scene,
            &params(json!({"name": "Light", "code": "move (0, 0, 9)"})),
        )
        .unwrap();
        assert_eq!(scene.object("Light").unwrap().location, [0.0, 0.0, 9.0]);
        assert_eq!(scene.active_object(), Some("Light"));

        let before = scene.clone();
        let err = modify_active_object(
            &mut scene,
            &params(json!({"name": "Cube", "code": "move (1, 1, 1)\nselect \"Ghost\""})),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Error on line 2: Object 'Ghost' not found");
        assert_eq!(scene, before);

        let err = modify_active_object(&mut scene, &params(json!({"name": "Ghost", "code": ""}))).unwrap_err();
        assert_eq!(err.to_string(), "Object 'Ghost' not found");
    }

    #[test]
    fn test_natural_language_produces_script() {
        let command = natural_language(&params(json!({"text": "make a blue cube"}))).unwrap();
        assert_eq!(command.kind, "execute_code");
        assert!(command.params["code"].as_str().unwrap().contains("BlueCube"));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(60);
        let described = describe_natural_language(&params(json!({ "text": long })));
        assert_eq!(described, format!("Processing: {}...", "é".repeat(50)));
        assert_eq!(describe_execute(&Params::new()), "Executing code: ");
    }
}
