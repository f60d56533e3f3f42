// scenebridge/src/handlers/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Built-in command vocabulary.

mod camera;
mod code;
mod lighting;
mod materials;
mod objects;
mod query;

use serde_json::json;

use crate::registry::{CommandRegistry, HandlerEntry, ParamSpec, ParamType, ParamsExt};
use crate::scene::DEFAULT_MATERIAL_COLOR;

pub use code::CODE_PREVIEW_CHARS;

/// Builds the registry of every built-in command.
pub fn builtin() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry
        .register(HandlerEntry::scene(
            "get_scene_info",
            "Retrieving scene info",
            query::get_scene_info,
        ))
        .register(HandlerEntry::scene(
            "get_objects",
            "Retrieving all objects",
            query::get_objects,
        ))
        .register(HandlerEntry::scene(
            "get_materials",
            "Retrieving all materials",
            query::get_materials,
        ))
        .register(
            HandlerEntry::scene("create_object", "Creating object", objects::create_object)
                .param(ParamSpec::with_default("object_type", ParamType::String, json!("CUBE")))
                .param(ParamSpec::optional("name", ParamType::String))
                .param(ParamSpec::with_default("location", ParamType::Vector3, json!([0.0, 0.0, 0.0])))
                .param(ParamSpec::with_default("size", ParamType::Vector3, json!([1.0, 1.0, 1.0])))
                .param(ParamSpec::with_default("color", ParamType::Color, json!(DEFAULT_MATERIAL_COLOR)))
                .describe_with(|p| format!("Creating {} object", p.str_param("object_type").unwrap_or("CUBE"))),
        )
        .register(
            HandlerEntry::scene("delete_object", "Deleting object", objects::delete_object)
                .param(ParamSpec::required("name", ParamType::String))
                .describe_with(|p| format!("Deleting object: {}", p.str_param("name").unwrap_or("unknown"))),
        )
        .register(
            HandlerEntry::scene("modify_object", "Modifying object", objects::modify_object)
                .param(ParamSpec::required("name", ParamType::String))
                .param(ParamSpec::optional("location", ParamType::Vector3))
                .param(ParamSpec::optional("size", ParamType::Vector3))
                .param(ParamSpec::optional("rotation", ParamType::Vector3))
                .param(ParamSpec::optional("color", ParamType::Color))
                .describe_with(|p| format!("Modifying object: {}", p.str_param("name").unwrap_or("unknown"))),
        )
        .register(
            HandlerEntry::scene("create_material", "Creating material", materials::create_material)
                .param(ParamSpec::required("name", ParamType::String))
                .param(ParamSpec::with_default("color", ParamType::Color, json!(DEFAULT_MATERIAL_COLOR)))
                .param(ParamSpec::with_default("metallic", ParamType::Number, json!(0.0)))
                .param(ParamSpec::with_default("roughness", ParamType::Number, json!(0.5)))
                .describe_with(|p| format!("Creating material: {}", p.str_param("name").unwrap_or("unknown"))),
        )
        .register(
            HandlerEntry::scene("assign_material", "Assigning material", materials::assign_material)
                .param(ParamSpec::required("object_name", ParamType::String))
                .param(ParamSpec::required("material_name", ParamType::String))
                .describe_with(|p| {
                    format!(
                        "Assigning material {} to {}",
                        p.str_param("material_name").unwrap_or("unknown"),
                        p.str_param("object_name").unwrap_or("unknown")
                    )
                }),
        )
        .register(
            HandlerEntry::scene("set_camera", "Setting camera parameters", camera::set_camera)
                .param(ParamSpec::optional("location", ParamType::Vector3))
                .param(ParamSpec::optional("rotation", ParamType::Vector3))
                .param(ParamSpec::optional("target", ParamType::String))
                .param(ParamSpec::with_default("camera_type", ParamType::String, json!("PERSP"))),
        )
        .register(
            HandlerEntry::scene("set_lighting", "Setting lighting", lighting::set_lighting)
                .param(ParamSpec::with_default("lighting_type", ParamType::String, json!("STUDIO")))
                .param(ParamSpec::with_default("intensity", ParamType::Number, json!(1.0)))
                .param(ParamSpec::with_default("color", ParamType::Color, json!([1.0, 1.0, 1.0])))
                .describe_with(|p| format!("Setting lighting to {}", p.str_param("lighting_type").unwrap_or("default"))),
        );

    for name in ["execute_code", "execute_blender_code"] {
        registry.register(
            HandlerEntry::scene(name, "Executing code", code::execute_code)
                .param(ParamSpec::required("code", ParamType::String))
                .describe_with(code::describe_execute),
        );
    }

    registry
        .register(
            HandlerEntry::scene(
                "modify_active_object",
                "Modifying active object",
                code::modify_active_object,
            )
            .param(ParamSpec::required("name", ParamType::String))
            .param(ParamSpec::required("code", ParamType::String))
            .describe_with(|p| format!("Modifying active object: {}", p.str_param("name").unwrap_or("unknown"))),
        )
        .register(
            HandlerEntry::translate(
                "natural_language",
                "Processing natural language",
                code::natural_language,
            )
            .param(ParamSpec::required("text", ParamType::String))
            .describe_with(code::describe_natural_language),
        );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenebridge_proto::Command;

    #[test]
    fn test_builtin_vocabulary() {
        let registry = builtin();
        for name in [
            "get_scene_info",
            "get_objects",
            "get_materials",
            "create_object",
            "delete_object",
            "modify_object",
            "create_material",
            "assign_material",
            "set_camera",
            "set_lighting",
            "execute_code",
            "execute_blender_code",
            "modify_active_object",
            "natural_language",
        ] {
            assert!(registry.contains(name), "missing {}", name);
        }
        assert_eq!(registry.len(), 14);
    }

    #[test]
    fn test_history_descriptions() {
        let registry = builtin();
        assert_eq!(
            registry.describe(&Command::new("create_object")),
            "Creating CUBE object"
        );
        assert_eq!(
            registry.describe(&Command::new("delete_object").param("name", "Cube")),
            "Deleting object: Cube"
        );
        assert_eq!(
            registry.describe(
                &Command::new("assign_material")
                    .param("object_name", "Cube")
                    .param("material_name", "Red")
            ),
            "Assigning material Red to Cube"
        );
        assert_eq!(
            registry.describe(&Command::new("set_camera")),
            "Setting camera parameters"
        );
    }
}
