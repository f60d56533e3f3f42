// scenebridge/src/client/commands.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! One convenience call per built-in command.

use serde::Serialize;
use serde_json::Value;

use scenebridge_proto::{Params, Response};

use crate::scene::{Rgba, Vec3};

use super::SceneClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metallic: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CameraSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LightingSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec3>,
}

fn to_params<T: Serialize>(value: &T) -> Params {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Params::new(),
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> Params {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

impl SceneClient {
    pub async fn get_scene_info(&mut self) -> Response {
        self.send_command("get_scene_info", None).await
    }

    pub async fn get_objects(&mut self) -> Response {
        self.send_command("get_objects", None).await
    }

    pub async fn get_materials(&mut self) -> Response {
        self.send_command("get_materials", None).await
    }

    pub async fn create_object(&mut self, spec: &ObjectSpec) -> Response {
        self.send_command("create_object", Some(to_params(spec))).await
    }

    pub async fn delete_object(&mut self, name: &str) -> Response {
        self.send_command("delete_object", Some(params([("name", name.into())])))
            .await
    }

    pub async fn modify_object(&mut self, name: &str, changes: &ObjectChanges) -> Response {
        let mut params = to_params(changes);
        params.insert("name".to_string(), name.into());
        self.send_command("modify_object", Some(params)).await
    }

    pub async fn create_material(&mut self, spec: &MaterialSpec) -> Response {
        self.send_command("create_material", Some(to_params(spec))).await
    }

    pub async fn assign_material(&mut self, object_name: &str, material_name: &str) -> Response {
        let params = params([
            ("object_name", object_name.into()),
            ("material_name", material_name.into()),
        ]);
        self.send_command("assign_material", Some(params)).await
    }

    pub async fn set_camera(&mut self, settings: &CameraSettings) -> Response {
        self.send_command("set_camera", Some(to_params(settings))).await
    }

    pub async fn set_lighting(&mut self, settings: &LightingSettings) -> Response {
        self.send_command("set_lighting", Some(to_params(settings))).await
    }

    /// Runs a scene script on the host.
    pub async fn execute_code(&mut self, code: &str) -> Response {
        self.send_command("execute_code", Some(params([("code", code.into())])))
            .await
    }

    /// Runs a scene script with `name` as the active object.
    pub async fn modify_active_object(&mut self, name: &str, code: &str) -> Response {
        let params = params([("name", name.into()), ("code", code.into())]);
        self.send_command("modify_active_object", Some(params)).await
    }

    pub async fn natural_language(&mut self, text: &str) -> Response {
        self.send_command("natural_language", Some(params([("text", text.into())])))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_specs_skip_unset_fields() {
        let spec = ObjectSpec {
            object_type: Some("SPHERE".into()),
            location: Some([1.0, 2.0, 3.0]),
            ..Default::default()
        };
        assert_eq!(
            Value::Object(to_params(&spec)),
            json!({"object_type": "SPHERE", "location": [1.0, 2.0, 3.0]})
        );
        assert!(to_params(&LightingSettings::default()).is_empty());
    }

    #[test]
    fn test_material_spec_keeps_name() {
        let spec = MaterialSpec {
            name: "Gold".into(),
            metallic: Some(1.0),
            ..Default::default()
        };
        assert_eq!(
            Value::Object(to_params(&spec)),
            json!({"name": "Gold", "metallic": 1.0})
        );
    }
}
