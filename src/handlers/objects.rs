// scenebridge/src/handlers/objects.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use serde_json::{json, Value};

use scenebridge_proto::Params;

use crate::error::{HandlerError, HandlerResult};
use crate::registry::ParamsExt;
use crate::scene::{
    ObjectData, Primitive, Scene, DEFAULT_MATERIAL_COLOR, DEFAULT_METALLIC, DEFAULT_ROUGHNESS, ORIGIN,
};

pub fn create_object(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let object_type = params.str_param("object_type").unwrap_or("CUBE").to_uppercase();
    let location = params.vec3_param("location").unwrap_or(ORIGIN);
    let size = params.vec3_param("size").unwrap_or([1.0, 1.0, 1.0]);
    let color = params.color_param("color").unwrap_or(DEFAULT_MATERIAL_COLOR);

    let (data, scale) = match object_type.as_str() {
        "CUBE" => (ObjectData::Mesh(Primitive::Cube { size: 1.0 }), Some(size)),
        "SPHERE" => (
            ObjectData::Mesh(Primitive::UvSphere { radius: size[0] / 2.0 }),
            None,
        ),
        "CYLINDER" => (
            ObjectData::Mesh(Primitive::Cylinder {
                radius: size[0] / 2.0,
                depth: size[2],
            }),
            None,
        ),
        "CONE" => (
            ObjectData::Mesh(Primitive::Cone {
                radius: size[0] / 2.0,
                depth: size[2],
            }),
            None,
        ),
        "PLANE" => (
            ObjectData::Mesh(Primitive::Plane { size: 1.0 }),
            Some([size[0], size[1], 1.0]),
        ),
        "EMPTY" => (ObjectData::Empty, None),
        other => {
            return Err(HandlerError::Unsupported(format!(
                "Unsupported object type: {}",
                other
            )))
        }
    };

    let base = match (params.str_param("name"), &data) {
        (Some(name), _) => name,
        (None, ObjectData::Mesh(primitive)) => primitive.label(),
        (None, _) => "Empty",
    };
    let base = base.to_string();
    let name = scene.add_object(&base, data, location);

    let obj = scene.require_object_mut(&name)?;
    if let Some(scale) = scale {
        obj.scale = scale;
    }
    if obj.can_have_materials() {
        let material = scene.add_material(
            &format!("{}_Mat", name),
            color,
            DEFAULT_METALLIC,
            DEFAULT_ROUGHNESS,
        );
        scene.append_material(&name, &material)?;
    }

    Ok(json!({ "name": name, "type": object_type }))
}

pub fn delete_object(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let name = params.require_str("name")?;
    scene
        .remove_object(name)
        .ok_or_else(|| HandlerError::object_not_found(name))?;
    Ok(json!({ "name": name, "deleted": true }))
}

pub fn modify_object(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let name = params.require_str("name")?;
    let obj = scene.require_object_mut(name)?;

    if let Some(location) = params.vec3_param("location") {
        obj.location = location;
    }
    if let Some(size) = params.vec3_param("size") {
        obj.scale = size;
    }
    if let Some(rotation) = params.vec3_param("rotation") {
        obj.rotation = rotation;
    }

    if let Some(color) = params.color_param("color") {
        match obj.materials.first().cloned() {
            Some(material) => {
                scene
                    .material_mut(&material)
                    .ok_or_else(|| HandlerError::material_not_found(&material))?
                    .base_color = color;
            }
            None => {
                if !obj.can_have_materials() {
                    return Err(HandlerError::Unsupported(format!(
                        "Object '{}' cannot have materials",
                        name
                    )));
                }
                let material = scene.add_material(
                    &format!("{}_Mat", name),
                    color,
                    DEFAULT_METALLIC,
                    DEFAULT_ROUGHNESS,
                );
                scene.append_material(name, &material)?;
            }
        }
    }

    Ok(json!({ "name": name, "modified": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandRegistry;
    use serde_json::json;

    fn validated(command: &str, value: Value) -> Params {
        let registry = CommandRegistry::builtin();
        let raw = match value {
            Value::Object(map) => map,
            _ => Params::new(),
        };
        registry.get(command).unwrap().schema.validate(&raw).unwrap()
    }

    #[test]
    fn test_create_cube_with_material() {
        let mut scene = Scene::new("Test");
        let params = validated(
            "create_object",
            json!({"name": "Box", "location": [1, 2, 3], "size": [2, 2, 2], "color": [0, 1, 0]}),
        );
        let result = create_object(&mut scene, &params).unwrap();
        assert_eq!(result, json!({"name": "Box", "type": "CUBE"}));

        let obj = scene.object("Box").unwrap();
        assert_eq!(obj.location, [1.0, 2.0, 3.0]);
        assert_eq!(obj.scale, [2.0, 2.0, 2.0]);
        assert_eq!(obj.materials, vec!["Box_Mat".to_string()]);
        assert_eq!(scene.material("Box_Mat").unwrap().base_color, [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_create_defaults_and_types() {
        let mut scene = Scene::new("Test");
        let result = create_object(&mut scene, &validated("create_object", json!({}))).unwrap();
        assert_eq!(result["name"], "Cube");

        let result = create_object(
            &mut scene,
            &validated("create_object", json!({"object_type": "sphere", "size": [3, 3, 3]})),
        )
        .unwrap();
        assert_eq!(result, json!({"name": "Sphere", "type": "SPHERE"}));
        assert_eq!(
            scene.object("Sphere").unwrap().data,
            ObjectData::Mesh(Primitive::UvSphere { radius: 1.5 })
        );

        let result = create_object(
            &mut scene,
            &validated("create_object", json!({"object_type": "EMPTY"})),
        )
        .unwrap();
        assert_eq!(result["name"], "Empty");
        assert!(scene.object("Empty").unwrap().materials.is_empty());
        assert!(scene.material("Empty_Mat").is_none());

        let err = create_object(
            &mut scene,
            &validated("create_object", json!({"object_type": "TORUS"})),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported object type: TORUS");
    }

    #[test]
    fn test_delete_object() {
        let mut scene = Scene::with_default_contents();
        let result = delete_object(&mut scene, &validated("delete_object", json!({"name": "Cube"}))).unwrap();
        assert_eq!(result, json!({"name": "Cube", "deleted": true}));

        let err = delete_object(&mut scene, &validated("delete_object", json!({"name": "Cube"}))).unwrap_err();
        assert_eq!(err.to_string(), "Object 'Cube' not found");
    }

    #[test]
    fn test_modify_object() {
        let mut scene = Scene::with_default_contents();
        let params = validated(
            "modify_object",
            json!({"name": "Cube", "location": [0, 0, 1], "rotation": [0, 0, 0.5], "color": [1, 0, 0, 1]}),
        );
        let result = modify_object(&mut scene, &params).unwrap();
        assert_eq!(result, json!({"name": "Cube", "modified": true}));

        let cube = scene.object("Cube").unwrap();
        assert_eq!(cube.location, [0.0, 0.0, 1.0]);
        assert_eq!(cube.rotation, [0.0, 0.0, 0.5]);
        assert_eq!(scene.material("Material").unwrap().base_color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_modify_color_creates_material() {
        let mut scene = Scene::new("Test");
        scene.add_object("Ball", ObjectData::Mesh(Primitive::UvSphere { radius: 1.0 }), ORIGIN);
        modify_object(
            &mut scene,
            &validated("modify_object", json!({"name": "Ball", "color": [0, 0, 1]})),
        )
        .unwrap();
        assert_eq!(scene.object("Ball").unwrap().materials, vec!["Ball_Mat".to_string()]);

        let err = modify_object(
            &mut Scene::with_default_contents(),
            &validated("modify_object", json!({"name": "Light", "color": [0, 0, 1]})),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Object 'Light' cannot have materials");
    }
}
