// scenebridge/src/handlers/camera.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use serde_json::{json, Value};
use tracing::warn;

use scenebridge_proto::Params;

use crate::error::{HandlerError, HandlerResult};
use crate::registry::ParamsExt;
use crate::scene::{ObjectData, Projection, Scene, DEFAULT_ORTHO_SCALE, ORIGIN};

fn parse_projection(camera_type: &str) -> HandlerResult<Projection> {
    match camera_type.to_uppercase().as_str() {
        "PERSP" | "PERSPECTIVE" => Ok(Projection::Perspective),
        "ORTHO" | "ORTHOGRAPHIC" => Ok(Projection::Orthographic {
            scale: DEFAULT_ORTHO_SCALE,
        }),
        "PANO" | "PANORAMIC" => Ok(Projection::Panoramic),
        _ => Err(HandlerError::Unsupported(format!(
            "Unsupported camera type: {}",
            camera_type
        ))),
    }
}

/// Poses the scene camera, creating one when the scene has none.
pub fn set_camera(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let projection = parse_projection(params.str_param("camera_type").unwrap_or("PERSP"))?;

    let camera = match scene.camera_name() {
        Some(name) => name.to_string(),
        None => {
            let name = scene.add_object("Camera", ObjectData::Camera(Projection::Perspective), ORIGIN);
            scene.set_camera(&name)?;
            name
        }
    };

    let target = match params.str_param("target") {
        Some(target) if target != camera && scene.object(target).is_some() => Some(target.to_string()),
        Some(target) => {
            warn!(camera_target = target, "Camera target not usable, ignoring");
            None
        }
        None => None,
    };

    let obj = scene.require_object_mut(&camera)?;
    if let Some(location) = params.vec3_param("location") {
        obj.location = location;
    }
    if let Some(rotation) = params.vec3_param("rotation") {
        obj.rotation = rotation;
    }
    if target.is_some() {
        obj.track_to = target;
    }
    obj.data = ObjectData::Camera(projection);

    Ok(json!({ "camera": camera, "updated": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    #[test]
    fn test_updates_existing_camera() {
        let mut scene = Scene::with_default_contents();
        let result = set_camera(
            &mut scene,
            &params(json!({
                "location": [0, -10, 2],
                "rotation": [1.5, 0, 0],
                "target": "Cube",
                "camera_type": "orthographic"
            })),
        )
        .unwrap();
        assert_eq!(result, json!({"camera": "Camera", "updated": true}));

        let camera = scene.camera().unwrap();
        assert_eq!(camera.location, [0.0, -10.0, 2.0]);
        assert_eq!(camera.track_to.as_deref(), Some("Cube"));
        assert_eq!(
            camera.data,
            ObjectData::Camera(Projection::Orthographic { scale: 10.0 })
        );
    }

    #[test]
    fn test_creates_camera_when_missing() {
        let mut scene = Scene::new("Test");
        let result = set_camera(&mut scene, &params(json!({"camera_type": "PANO"}))).unwrap();
        assert_eq!(result["camera"], "Camera");
        assert_eq!(scene.camera().unwrap().data, ObjectData::Camera(Projection::Panoramic));
    }

    #[test]
    fn test_unknown_target_is_ignored_and_bad_type_rejected() {
        let mut scene = Scene::with_default_contents();
        set_camera(&mut scene, &params(json!({"target": "Ghost"}))).unwrap();
        assert!(scene.camera().unwrap().track_to.is_none());

        let before = scene.clone();
        let err = set_camera(&mut scene, &params(json!({"camera_type": "FISHEYE"}))).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported camera type: FISHEYE");
        assert_eq!(scene, before);
    }
}
