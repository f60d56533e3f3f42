// scenebridge/src/handlers/lighting.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Lighting presets. Applying a preset removes every existing light first.

use rand::Rng;
use serde_json::{json, Value};

use scenebridge_proto::Params;

use crate::error::HandlerResult;
use crate::registry::ParamsExt;
use crate::scene::{LightData, LightKind, ObjectData, Scene, Vec3, World};

const SUN_ROTATION: Vec3 = [0.5, 0.2, 0.3];
const ACCENT_LIGHTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    Studio,
    Outdoor,
    Night,
    Point,
}

impl Preset {
    fn parse(lighting_type: &str) -> Self {
        match lighting_type.to_uppercase().as_str() {
            "STUDIO" => Preset::Studio,
            "OUTDOOR" | "OUTDOORS" => Preset::Outdoor,
            "NIGHT" => Preset::Night,
            _ => Preset::Point,
        }
    }
}

fn add_light(scene: &mut Scene, name: &str, light: LightData, location: Vec3, rotation: Option<Vec3>) {
    let name = scene.add_object(name, ObjectData::Light(light), location);
    if let (Some(rotation), Some(obj)) = (rotation, scene.object_mut(&name)) {
        obj.rotation = rotation;
    }
}

pub fn set_lighting(scene: &mut Scene, params: &Params) -> HandlerResult<Value> {
    let lighting_type = params.str_param("lighting_type").unwrap_or("STUDIO");
    let intensity = params.f64_param("intensity").unwrap_or(1.0);
    let color = params
        .color_param("color")
        .map_or([1.0, 1.0, 1.0], |[r, g, b, _]| [r, g, b]);

    let removed = scene.remove_lights();
    tracing::debug!(removed, lighting_type, "Applying lighting preset");

    match Preset::parse(lighting_type) {
        Preset::Studio => {
            for (name, location, energy, size) in [
                ("Key_Light", [4.0, -4.0, 5.0], 100.0, 5.0),
                ("Fill_Light", [-4.0, -2.0, 3.0], 50.0, 3.0),
                ("Back_Light", [0.0, 6.0, 4.0], 75.0, 4.0),
            ] {
                add_light(
                    scene,
                    name,
                    LightData::new(LightKind::Area { size }, energy * intensity),
                    location,
                    None,
                );
            }
        }
        Preset::Outdoor => {
            add_light(
                scene,
                "Sun",
                LightData::new(LightKind::Sun, 2.0 * intensity),
                [0.0, 0.0, 10.0],
                Some(SUN_ROTATION),
            );
            *scene.world_mut() = World {
                background: [0.5, 0.7, 1.0, 1.0],
                strength: intensity,
            };
        }
        Preset::Night => {
            let moon = LightData {
                kind: LightKind::Sun,
                energy: 0.5 * intensity,
                color,
            };
            add_light(scene, "Moon", moon, [0.0, 0.0, 10.0], Some(SUN_ROTATION));
            *scene.world_mut() = World {
                background: [0.01, 0.01, 0.05, 1.0],
                strength: 1.0,
            };

            let mut rng = rand::thread_rng();
            for i in 0..ACCENT_LIGHTS {
                let location = [
                    rng.gen_range(-5.0..=5.0),
                    rng.gen_range(-5.0..=5.0),
                    rng.gen_range(0.5..=3.0),
                ];
                let accent = LightData {
                    kind: LightKind::Point,
                    energy: rng.gen_range(5.0..=15.0) * intensity,
                    color: [
                        rng.gen_range(0.5..=1.0),
                        rng.gen_range(0.5..=1.0),
                        rng.gen_range(0.5..=1.0),
                    ],
                };
                add_light(scene, &format!("Accent_Light_{}", i), accent, location, None);
            }
        }
        Preset::Point => {
            let light = LightData {
                kind: LightKind::Point,
                energy: 1000.0 * intensity,
                color,
            };
            add_light(scene, "Light", light, [0.0, 0.0, 5.0], None);
        }
    }

    Ok(json!({ "lighting": lighting_type, "updated": true }))
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

    fn lights(scene: &Scene) -> Vec<(String, LightData)> {
        scene
            .objects()
            .filter_map(|o| match &o.data {
                ObjectData::Light(light) => Some((o.name.clone(), *light)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_studio_replaces_existing_lights() {
        let mut scene = Scene::with_default_contents();
        let result = set_lighting(&mut scene, &params(json!({"intensity": 2.0}))).unwrap();
        assert_eq!(result, json!({"lighting": "STUDIO", "updated": true}));

        let lights = lights(&scene);
        let names: Vec<_> = lights.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Key_Light", "Fill_Light", "Back_Light"]);
        assert_eq!(lights[0].1.energy, 200.0);
        assert_eq!(lights[0].1.kind, LightKind::Area { size: 5.0 });
        assert!(scene.object("Light").is_none());
    }

    #[test]
    fn test_outdoor_sets_sky() {
        let mut scene = Scene::new("Test");
        set_lighting(&mut scene, &params(json!({"lighting_type": "outdoors"}))).unwrap();
        let sun = scene.object("Sun").unwrap();
        assert_eq!(sun.rotation, SUN_ROTATION);
        assert_eq!(scene.world.unwrap().background, [0.5, 0.7, 1.0, 1.0]);
    }

    #[test]
    fn test_night_accents_within_ranges() {
        let mut scene = Scene::new("Test");
        set_lighting(
            &mut scene,
            &params(json!({"lighting_type": "NIGHT", "color": [0.8, 0.8, 1.0]})),
        )
        .unwrap();

        let lights = lights(&scene);
        assert_eq!(lights.len(), 1 + ACCENT_LIGHTS);
        assert_eq!(lights[0].0, "Moon");
        assert_eq!(lights[0].1.color, [0.8, 0.8, 1.0]);

        for i in 0..ACCENT_LIGHTS {
            let obj = scene.object(&format!("Accent_Light_{}", i)).unwrap();
            assert!((-5.0..=5.0).contains(&obj.location[0]));
            assert!((0.5..=3.0).contains(&obj.location[2]));
            if let ObjectData::Light(light) = obj.data {
                assert!((5.0..=15.0).contains(&light.energy));
            }
        }
    }

    #[test]
    fn test_unknown_preset_falls_back_to_point_light() {
        let mut scene = Scene::new("Test");
        let result = set_lighting(
            &mut scene,
            &params(json!({"lighting_type": "disco", "color": [1, 0, 0]})),
        )
        .unwrap();
        assert_eq!(result["lighting"], "disco");
        let lights = lights(&scene);
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].1.energy, 1000.0);
        assert_eq!(lights[0].1.color, [1.0, 0.0, 0.0]);
    }
}
