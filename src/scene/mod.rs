// scenebridge/src/scene/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! In-process model of the host application's scene.
//!
//! Objects and materials are kept in insertion order. Names are unique per
//! kind; a colliding name gets a numeric suffix (`Cube`, `Cube.001`, ...).
//! The scene is only ever touched from the main context, see [`crate::host`].

use indexmap::IndexMap;

use crate::error::{HandlerError, HandlerResult};

pub type Vec3 = [f64; 3];
pub type Rgba = [f64; 4];

pub const ORIGIN: Vec3 = [0.0, 0.0, 0.0];
pub const DEFAULT_MATERIAL_COLOR: Rgba = [0.8, 0.8, 0.8, 1.0];
pub const DEFAULT_METALLIC: f64 = 0.0;
pub const DEFAULT_ROUGHNESS: f64 = 0.5;
pub const DEFAULT_ORTHO_SCALE: f64 = 10.0;

/// Builds an RGBA color from 3 or 4 components; alpha defaults to 1.0.
pub fn rgba_from_slice(values: &[f64]) -> Option<Rgba> {
    match values {
        [r, g, b] => Some([*r, *g, *b, 1.0]),
        [r, g, b, a] => Some([*r, *g, *b, *a]),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Cube { size: f64 },
    UvSphere { radius: f64 },
    Cylinder { radius: f64, depth: f64 },
    Cone { radius: f64, depth: f64 },
    Plane { size: f64 },
}

impl Primitive {
    /// Default object name for the primitive.
    pub fn label(&self) -> &'static str {
        match self {
            Primitive::Cube { .. } => "Cube",
            Primitive::UvSphere { .. } => "Sphere",
            Primitive::Cylinder { .. } => "Cylinder",
            Primitive::Cone { .. } => "Cone",
            Primitive::Plane { .. } => "Plane",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective,
    Orthographic { scale: f64 },
    Panoramic,
}

impl Projection {
    pub fn type_name(&self) -> &'static str {
        match self {
            Projection::Perspective => "PERSP",
            Projection::Orthographic { .. } => "ORTHO",
            Projection::Panoramic => "PANO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Area { size: f64 },
    Sun,
    Point,
}

impl LightKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            LightKind::Area { .. } => "AREA",
            LightKind::Sun => "SUN",
            LightKind::Point => "POINT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    pub kind: LightKind,
    pub energy: f64,
    pub color: Vec3,
}

impl LightData {
    pub fn new(kind: LightKind, energy: f64) -> Self {
        Self {
            kind,
            energy,
            color: [1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Mesh(Primitive),
    Empty,
    Camera(Projection),
    Light(LightData),
}

impl ObjectData {
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectData::Mesh(_) => "MESH",
            ObjectData::Empty => "EMPTY",
            ObjectData::Camera(_) => "CAMERA",
            ObjectData::Light(_) => "LIGHT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub data: ObjectData,
    pub location: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub visible: bool,
    /// Material slots, by material name.
    pub materials: Vec<String>,
    /// Track-to constraint target, by object name.
    pub track_to: Option<String>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, data: ObjectData, location: Vec3) -> Self {
        Self {
            name: name.into(),
            data,
            location,
            rotation: ORIGIN,
            scale: [1.0, 1.0, 1.0],
            visible: true,
            materials: Vec::new(),
            track_to: None,
        }
    }

    pub fn can_have_materials(&self) -> bool {
        matches!(self.data, ObjectData::Mesh(_))
    }

    pub fn is_light(&self) -> bool {
        matches!(self.data, ObjectData::Light(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: Rgba,
    pub metallic: f64,
    pub roughness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct World {
    pub background: Rgba,
    pub strength: f64,
}

impl Default for World {
    fn default() -> Self {
        Self {
            background: [0.05, 0.05, 0.05, 1.0],
            strength: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub name: String,
    pub frame_current: i64,
    pub frame_start: i64,
    pub frame_end: i64,
    pub render_engine: String,
    pub resolution: Resolution,
    pub world: Option<World>,
    objects: IndexMap<String, SceneObject>,
    materials: IndexMap<String, Material>,
    camera: Option<String>,
    active: Option<String>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Scene")
    }
}

impl Scene {
    /// An empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frame_current: 1,
            frame_start: 1,
            frame_end: 250,
            render_engine: "EEVEE".to_string(),
            resolution: Resolution {
                width: 1920,
                height: 1080,
                percentage: 100,
            },
            world: None,
            objects: IndexMap::new(),
            materials: IndexMap::new(),
            camera: None,
            active: None,
        }
    }

    /// The usual startup scene: a cube with a material, a camera and a point light.
    pub fn with_default_contents() -> Self {
        let mut scene = Self::new("Scene");
        scene.world = Some(World::default());

        let cube = scene.add_object("Cube", ObjectData::Mesh(Primitive::Cube { size: 2.0 }), ORIGIN);
        let material = scene.add_material("Material", DEFAULT_MATERIAL_COLOR, DEFAULT_METALLIC, DEFAULT_ROUGHNESS);
        if let Some(obj) = scene.object_mut(&cube) {
            obj.materials.push(material);
        }

        let light = scene.add_object(
            "Light",
            ObjectData::Light(LightData::new(LightKind::Point, 1000.0)),
            [4.08, 1.0, 5.9],
        );
        if let Some(obj) = scene.object_mut(&light) {
            obj.rotation = [0.65, 0.055, 1.87];
        }

        let camera = scene.add_object("Camera", ObjectData::Camera(Projection::Perspective), [7.36, -6.93, 4.96]);
        if let Some(obj) = scene.object_mut(&camera) {
            obj.rotation = [1.109, 0.0, 0.815];
        }
        scene.camera = Some(camera);
        scene.active = Some(cube);
        scene
    }

    // ---- objects ----

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    pub fn object_mut(&mut self, name: &str) -> Option<&mut SceneObject> {
        self.objects.get_mut(name)
    }

    pub fn require_object_mut(&mut self, name: &str) -> HandlerResult<&mut SceneObject> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| HandlerError::object_not_found(name))
    }

    /// Adds an object under a unique name derived from `base` and makes it active.
    ///
    /// Returns the name actually used.
    pub fn add_object(&mut self, base: &str, data: ObjectData, location: Vec3) -> String {
        let name = unique_name(base, |n| self.objects.contains_key(n));
        self.objects
            .insert(name.clone(), SceneObject::new(name.clone(), data, location));
        self.active = Some(name.clone());
        name
    }

    /// Removes an object and every reference to it.
    pub fn remove_object(&mut self, name: &str) -> Option<SceneObject> {
        let removed = self.objects.shift_remove(name)?;
        if self.camera.as_deref() == Some(name) {
            self.camera = None;
        }
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        for obj in self.objects.values_mut() {
            if obj.track_to.as_deref() == Some(name) {
                obj.track_to = None;
            }
        }
        Some(removed)
    }

    /// Renames an object in place, keeping its position in the scene order.
    ///
    /// Returns the name actually used, which may carry a suffix.
    pub fn rename_object(&mut self, old: &str, new_base: &str) -> HandlerResult<String> {
        if old == new_base {
            return if self.objects.contains_key(old) {
                Ok(old.to_string())
            } else {
                Err(HandlerError::object_not_found(old))
            };
        }

        let index = self
            .objects
            .get_index_of(old)
            .ok_or_else(|| HandlerError::object_not_found(old))?;
        let (_, mut obj) = self
            .objects
            .shift_remove_index(index)
            .ok_or_else(|| HandlerError::object_not_found(old))?;

        let name = unique_name(new_base, |n| self.objects.contains_key(n));
        obj.name = name.clone();
        self.objects.insert(name.clone(), obj);
        let last = self.objects.len() - 1;
        self.objects.move_index(last, index);

        for slot in [&mut self.camera, &mut self.active] {
            if slot.as_deref() == Some(old) {
                *slot = Some(name.clone());
            }
        }
        for other in self.objects.values_mut() {
            if other.track_to.as_deref() == Some(old) {
                other.track_to = Some(name.clone());
            }
        }
        Ok(name)
    }

    /// Removes every light object and returns how many were removed.
    pub fn remove_lights(&mut self) -> usize {
        let lights: Vec<String> = self
            .objects
            .values()
            .filter(|o| o.is_light())
            .map(|o| o.name.clone())
            .collect();
        for name in &lights {
            self.remove_object(name);
        }
        lights.len()
    }

    pub fn active_object(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Makes `name` the active object; fails when it does not exist.
    pub fn set_active(&mut self, name: &str) -> HandlerResult<()> {
        if !self.objects.contains_key(name) {
            return Err(HandlerError::object_not_found(name));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    pub fn camera(&self) -> Option<&SceneObject> {
        self.camera.as_deref().and_then(|name| self.objects.get(name))
    }

    pub fn camera_name(&self) -> Option<&str> {
        self.camera.as_deref()
    }

    pub fn set_camera(&mut self, name: &str) -> HandlerResult<()> {
        match self.objects.get(name) {
            Some(obj) if matches!(obj.data, ObjectData::Camera(_)) => {
                self.camera = Some(name.to_string());
                Ok(())
            }
            Some(_) => Err(HandlerError::Unsupported(format!("Object '{}' is not a camera", name))),
            None => Err(HandlerError::object_not_found(name)),
        }
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.world.get_or_insert_with(World::default)
    }

    // ---- materials ----

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn material_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.get_mut(name)
    }

    /// Adds a material under a unique name derived from `base`.
    pub fn add_material(&mut self, base: &str, base_color: Rgba, metallic: f64, roughness: f64) -> String {
        let name = unique_name(base, |n| self.materials.contains_key(n));
        self.materials.insert(
            name.clone(),
            Material {
                name: name.clone(),
                base_color,
                metallic,
                roughness,
            },
        );
        name
    }

    /// Number of material slots, across all objects, that use `name`.
    pub fn material_users(&self, name: &str) -> usize {
        self.objects
            .values()
            .flat_map(|o| o.materials.iter())
            .filter(|m| m.as_str() == name)
            .count()
    }

    /// Appends a material slot to an object.
    pub fn append_material(&mut self, object: &str, material: &str) -> HandlerResult<()> {
        if !self.materials.contains_key(material) {
            return Err(HandlerError::material_not_found(material));
        }
        let obj = self.require_object_mut(object)?;
        if !obj.can_have_materials() {
            return Err(HandlerError::Unsupported(format!("Object '{}' cannot have materials", object)));
        }
        obj.materials.push(material.to_string());
        Ok(())
    }

    /// Replaces all material slots of an object with a single one.
    pub fn assign_material(&mut self, object: &str, material: &str) -> HandlerResult<()> {
        if !self.objects.contains_key(object) {
            return Err(HandlerError::object_not_found(object));
        }
        if !self.materials.contains_key(material) {
            return Err(HandlerError::material_not_found(material));
        }
        let obj = self.require_object_mut(object)?;
        if !obj.can_have_materials() {
            return Err(HandlerError::Unsupported(format!("Object '{}' cannot have materials", object)));
        }
        obj.materials.clear();
        obj.materials.push(material.to_string());
        Ok(())
    }
}

/// `base`, or `base.NNN` with the first free counter.
fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{}.{:03}", base, i))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_contents() {
        let scene = Scene::with_default_contents();
        assert_eq!(scene.object_count(), 3);
        assert_eq!(scene.material_count(), 1);
        assert_eq!(scene.camera_name(), Some("Camera"));
        assert_eq!(scene.active_object(), Some("Cube"));
        assert_eq!(scene.material_users("Material"), 1);
    }

    #[test]
    fn test_colliding_names_get_suffix() {
        let mut scene = Scene::new("Test");
        let a = scene.add_object("Cube", ObjectData::Mesh(Primitive::Cube { size: 1.0 }), ORIGIN);
        let b = scene.add_object("Cube", ObjectData::Mesh(Primitive::Cube { size: 1.0 }), ORIGIN);
        let c = scene.add_object("Cube", ObjectData::Empty, ORIGIN);
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("Cube", "Cube.001", "Cube.002"));
        assert_eq!(scene.active_object(), Some("Cube.002"));

        let m1 = scene.add_material("Mat", DEFAULT_MATERIAL_COLOR, 0.0, 0.5);
        let m2 = scene.add_material("Mat", DEFAULT_MATERIAL_COLOR, 0.0, 0.5);
        assert_eq!((m1.as_str(), m2.as_str()), ("Mat", "Mat.001"));
    }

    #[test]
    fn test_rename_keeps_order_and_references() {
        let mut scene = Scene::with_default_contents();
        scene.object_mut("Camera").unwrap().track_to = Some("Cube".to_string());

        let name = scene.rename_object("Cube", "Box").unwrap();
        assert_eq!(name, "Box");

        let order: Vec<_> = scene.objects().map(|o| o.name.as_str()).collect();
        assert_eq!(order, vec!["Box", "Light", "Camera"]);
        assert_eq!(scene.active_object(), Some("Box"));
        assert_eq!(scene.object("Camera").unwrap().track_to.as_deref(), Some("Box"));

        assert_eq!(scene.rename_object("Box", "Box").unwrap(), "Box");
        assert!(scene.rename_object("Nope", "X").is_err());
    }

    #[test]
    fn test_rename_onto_existing_name() {
        let mut scene = Scene::new("Test");
        scene.add_object("Sphere", ObjectData::Mesh(Primitive::UvSphere { radius: 1.0 }), ORIGIN);
        let second = scene.add_object("Sphere", ObjectData::Mesh(Primitive::UvSphere { radius: 1.0 }), ORIGIN);
        assert_eq!(second, "Sphere.001");
        assert_eq!(scene.rename_object(&second, "Sphere").unwrap(), "Sphere.001");
    }

    #[test]
    fn test_remove_object_clears_references() {
        let mut scene = Scene::with_default_contents();
        scene.object_mut("Camera").unwrap().track_to = Some("Cube".to_string());
        assert!(scene.remove_object("Cube").is_some());
        assert!(scene.active_object().is_none());
        assert!(scene.object("Camera").unwrap().track_to.is_none());
        assert_eq!(scene.material_users("Material"), 0);

        assert!(scene.remove_object("Camera").is_some());
        assert!(scene.camera().is_none());
    }

    #[test]
    fn test_materials_only_on_meshes() {
        let mut scene = Scene::with_default_contents();
        let err = scene.assign_material("Camera", "Material").unwrap_err();
        assert_eq!(err.to_string(), "Object 'Camera' cannot have materials");

        let err = scene.assign_material("Cube", "Missing").unwrap_err();
        assert_eq!(err.to_string(), "Material 'Missing' not found");

        let red = scene.add_material("Red", [1.0, 0.0, 0.0, 1.0], 0.0, 0.5);
        scene.assign_material("Cube", &red).unwrap();
        assert_eq!(scene.object("Cube").unwrap().materials, vec!["Red".to_string()]);
    }

    #[test]
    fn test_remove_lights() {
        let mut scene = Scene::with_default_contents();
        assert_eq!(scene.remove_lights(), 1);
        assert_eq!(scene.remove_lights(), 0);
        assert_eq!(scene.object_count(), 2);
    }

    #[test]
    fn test_rgba_from_slice() {
        assert_eq!(rgba_from_slice(&[1.0, 0.5, 0.0]), Some([1.0, 0.5, 0.0, 1.0]));
        assert_eq!(rgba_from_slice(&[1.0, 0.5, 0.0, 0.2]), Some([1.0, 0.5, 0.0, 0.2]));
        assert_eq!(rgba_from_slice(&[1.0]), None);
    }
}
