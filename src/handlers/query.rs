// scenebridge/src/handlers/query.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use serde_json::{json, Map, Value};

use scenebridge_proto::Params;

use crate::error::HandlerResult;
use crate::scene::{Material, Scene, SceneObject};

pub fn get_scene_info(scene: &mut Scene, _params: &Params) -> HandlerResult<Value> {
    let mut info = Map::new();
    info.insert("scene_name".into(), json!(scene.name));
    info.insert("frame_current".into(), json!(scene.frame_current));
    info.insert("frame_start".into(), json!(scene.frame_start));
    info.insert("frame_end".into(), json!(scene.frame_end));
    info.insert("render_engine".into(), json!(scene.render_engine));
    info.insert(
        "dimensions".into(),
        json!({
            "width": scene.resolution.width,
            "height": scene.resolution.height,
            "percentage": scene.resolution.percentage,
        }),
    );
    if let Some(camera) = scene.camera() {
        info.insert(
            "camera".into(),
            json!({
                "name": camera.name,
                "location": camera.location,
                "rotation": camera.rotation,
            }),
        );
    }
    info.insert("object_count".into(), json!(scene.object_count()));
    info.insert("material_count".into(), json!(scene.material_count()));
    Ok(Value::Object(info))
}

pub fn get_objects(scene: &mut Scene, _params: &Params) -> HandlerResult<Value> {
    Ok(Value::Array(scene.objects().map(object_summary).collect()))
}

pub fn get_materials(scene: &mut Scene, _params: &Params) -> HandlerResult<Value> {
    let scene: &Scene = scene;
    Ok(Value::Array(
        scene
            .materials()
            .map(|m| material_summary(m, scene.material_users(&m.name) > 0))
            .collect(),
    ))
}

fn object_summary(obj: &SceneObject) -> Value {
    let mut summary = json!({
        "name": obj.name,
        "type": obj.data.type_name(),
        "location": obj.location,
        "rotation": obj.rotation,
        "scale": obj.scale,
        "visible": obj.visible,
    });
    if !obj.materials.is_empty() {
        summary["materials"] = json!(obj.materials);
    }
    summary
}

fn material_summary(material: &Material, used: bool) -> Value {
    let [r, g, b, _] = material.base_color;
    json!({
        "name": material.name,
        "used": used,
        "color": [r, g, b],
        "metallic": material.metallic,
        "roughness": material.roughness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_info_of_default_scene() {
        let mut scene = Scene::with_default_contents();
        let info = get_scene_info(&mut scene, &Params::new()).unwrap();
        assert_eq!(info["scene_name"], "Scene");
        assert_eq!(info["frame_end"], 250);
        assert_eq!(info["dimensions"]["width"], 1920);
        assert_eq!(info["camera"]["name"], "Camera");
        assert_eq!(info["object_count"], 3);
        assert_eq!(info["material_count"], 1);
    }

    #[test]
    fn test_scene_info_without_camera() {
        let mut scene = Scene::new("Empty");
        let info = get_scene_info(&mut scene, &Params::new()).unwrap();
        assert!(info.get("camera").is_none());
        assert_eq!(info["object_count"], 0);
    }

    #[test]
    fn test_object_and_material_listing() {
        let mut scene = Scene::with_default_contents();
        scene.add_material("Spare", [0.1, 0.2, 0.3, 1.0], 1.0, 0.2);

        let objects = get_objects(&mut scene, &Params::new()).unwrap();
        let objects = objects.as_array().unwrap();
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0]["type"], "MESH");
        assert_eq!(objects[0]["materials"], json!(["Material"]));
        assert_eq!(objects[1]["type"], "LIGHT");
        assert!(objects[1].get("materials").is_none());

        let materials = get_materials(&mut scene, &Params::new()).unwrap();
        assert_eq!(materials[0]["used"], true);
        assert_eq!(materials[1]["used"], false);
        assert_eq!(materials[1]["color"], json!([0.1, 0.2, 0.3]));
        assert_eq!(materials[1]["metallic"], 1.0);
    }
}
