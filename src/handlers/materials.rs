// scenebridge/src/handlers/materials.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use serde_json::{json, Value};

use scenebridge_proto::Params;

use crate::error::HandlerResult;
use crate::registry::ParamsExt;
use crate::scene::{Scene, DEFAULT_MATERIAL_COLOR, DEFAULT_METALLIC, DEFAULT_ROUGHNESS};

pub fn create_material(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let name = params.require_str("name")?;
    let created = scene.add_material(
        name,
        params.color_param("color").unwrap_or(DEFAULT_MATERIAL_COLOR),
        params.f64_param("metallic").unwrap_or(DEFAULT_METALLIC),
        params.f64_param("roughness").unwrap_or(DEFAULT_ROUGHNESS),
    );
    Ok(json!({ "name": created, "created": true }))
}

/// Replaces every material slot of the object with the named material.
pub fn assign_material(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let object = params.require_str("object_name")?;
    let material = params.require_str("material_name")?;
    scene.assign_material(object, material)?;
    Ok(json!({ "object": object, "material": material, "assigned": true }))
}
