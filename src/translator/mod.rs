// scenebridge/src/translator/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Natural-language instructions to commands.
//!
//! Translation is an ordered list of [`Rule`]s over the lower-cased words of
//! the input; the first rule that matches builds the command. Specific
//! multi-keyword phrases come before the generic creation rule. Input no rule
//! matches becomes a script that only reports it was not understood.
//!
//! Every produced command is an `execute_code` command carrying a scene
//! script, and goes through the registry like any other command.

use serde_json::Value;

use scenebridge_proto::Command;

use crate::scene::{Rgba, Vec3, ORIGIN};
use crate::script::quote;

pub const EXECUTE_CODE: &str = "execute_code";

pub const NOT_UNDERSTOOD: &str =
    "I couldn't understand that command. Try saying 'create a red sphere in the middle' or similar.";

pub const FALLBACK_RULE: &str = "not_understood";

/// Verbs that enable shape creation.
pub const CREATION_VERBS: &[&str] = &["create", "make", "add"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Cube,
    Sphere,
    Cylinder,
    Cone,
    Plane,
}

impl Shape {
    pub fn word(&self) -> &'static str {
        match self {
            Shape::Cube => "cube",
            Shape::Sphere => "sphere",
            Shape::Cylinder => "cylinder",
            Shape::Cone => "cone",
            Shape::Plane => "plane",
        }
    }

    fn add_statement(&self, location: Vec3) -> String {
        let at = format_vec(&location);
        match self {
            Shape::Cube => format!("add cube size=1.0 location={}", at),
            Shape::Sphere => format!("add uv_sphere radius=1.0 location={}", at),
            Shape::Cylinder => format!("add cylinder radius=1.0 depth=2.0 location={}", at),
            Shape::Cone => format!("add cone radius=1.0 depth=2.0 location={}", at),
            Shape::Plane => format!("add plane size=2.0 location={}", at),
        }
    }
}

/// Shape keywords, in precedence order.
const SHAPES: &[(Shape, &[&str])] = &[
    (Shape::Cube, &["cube"]),
    (Shape::Sphere, &["sphere", "ball"]),
    (Shape::Cylinder, &["cylinder"]),
    (Shape::Cone, &["cone"]),
    (Shape::Plane, &["plane"]),
];

/// Color keywords, in precedence order.
const COLORS: &[(&str, Rgba)] = &[
    ("red", [1.0, 0.0, 0.0, 1.0]),
    ("green", [0.0, 1.0, 0.0, 1.0]),
    ("blue", [0.0, 0.0, 1.0, 1.0]),
    ("yellow", [1.0, 1.0, 0.0, 1.0]),
    ("white", [1.0, 1.0, 1.0, 1.0]),
    ("black", [0.0, 0.0, 0.0, 1.0]),
];

/// Location phrases and the coordinate they stand for.
const LOCATIONS: &[(&[&str], Vec3)] = &[(&["middle", "center"], ORIGIN)];

/// One translation rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    matches: fn(&Words) -> bool,
    build: fn(&Words) -> String,
}

/// Rules in precedence order; the first match wins.
pub const RULES: &[Rule] = &[
    Rule {
        name: "red_sphere_in_middle",
        matches: red_sphere_in_middle,
        build: build_red_sphere_in_middle,
    },
    Rule {
        name: "create_shape",
        matches: has_creation_verb,
        build: build_shape,
    },
];

/// Lower-cased words of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Words(Vec<String>);

impl Words {
    pub fn new(text: &str) -> Self {
        Words(
            text.to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.iter().any(|w| w == word)
    }

    pub fn contains_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.contains(w))
    }

    /// Like [`Words::contains`], but also accepts the plural `-s`/`-es` form.
    pub fn contains_noun(&self, noun: &str) -> bool {
        self.0.iter().any(|w| match w.strip_prefix(noun) {
            Some(rest) => matches!(rest, "" | "s" | "es"),
            None => false,
        })
    }

    pub fn contains_any_noun(&self, nouns: &[&str]) -> bool {
        nouns.iter().any(|n| self.contains_noun(n))
    }
}

/// Translates `text` into the command to dispatch.
pub fn translate(text: &str) -> Command {
    let words = Words::new(text);
    let code = match find_rule(&words) {
        Some(rule) => (rule.build)(&words),
        None => not_understood(),
    };
    execute_code(code)
}

/// Name of the rule `text` would be translated by.
pub fn matching_rule(text: &str) -> &'static str {
    find_rule(&Words::new(text)).map_or(FALLBACK_RULE, |rule| rule.name)
}

fn find_rule(words: &Words) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.matches)(words))
}

fn execute_code(code: String) -> Command {
    Command::new(EXECUTE_CODE).param("code", Value::String(code))
}

fn not_understood() -> String {
    format!("# No matching instruction\nresult {}\n", quote(NOT_UNDERSTOOD))
}

fn red_sphere_in_middle(words: &Words) -> bool {
    words.contains("red") && words.contains_any_noun(&["sphere", "ball"]) && words.contains_any(&["middle", "center"])
}

fn build_red_sphere_in_middle(_words: &Words) -> String {
    colored_object(
        &Shape::Sphere.add_statement(ORIGIN),
        "RedSphere",
        [1.0, 0.0, 0.0, 1.0],
        "Created a red sphere in the middle",
    )
}

fn has_creation_verb(words: &Words) -> bool {
    words.contains_any(CREATION_VERBS)
}

fn build_shape(words: &Words) -> String {
    let shape = SHAPES
        .iter()
        .find(|(_, keywords)| words.contains_any_noun(keywords))
        .map(|(shape, _)| *shape);
    let color = COLORS.iter().find(|(name, _)| words.contains(name));
    let location = LOCATIONS
        .iter()
        .find(|(phrases, _)| words.contains_any(phrases))
        .map_or(ORIGIN, |(_, at)| *at);

    let add = match shape {
        Some(shape) => shape.add_statement(location),
        None => format!("add cube size=1.0 location={}", format_vec(&ORIGIN)),
    };
    let noun = shape.map_or("object", |s| s.word());

    match color {
        Some((color_name, rgba)) => {
            let name = match shape {
                Some(shape) => format!("{}{}", capitalize(color_name), capitalize(shape.word())),
                None => "Object".to_string(),
            };
            let message = format!("Created a {} {} at location {}", color_name, noun, format_list(&location));
            colored_object(&add, &name, *rgba, &message)
        }
        None => {
            let name = shape.map_or("Object".to_string(), |s| capitalize(s.word()));
            let message = format!("Created a {} at location {}", noun, format_list(&location));
            format!(
                "# Create a {noun}\n{add}\nrename {name}\nresult {message}\n",
                noun = noun,
                add = add,
                name = quote(&name),
                message = quote(&message),
            )
        }
    }
}

fn colored_object(add: &str, name: &str, color: Rgba, message: &str) -> String {
    format!(
        "{add}\nrename {name}\n\n# Add a material\nmaterial {material}\nassign\ncolor {color}\n\nresult {message}\n",
        add = add,
        name = quote(name),
        material = quote(&format!("{}_Mat", name)),
        color = format_color(&color),
        message = quote(message),
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `(0, 0, 0)`
fn format_vec(v: &Vec3) -> String {
    format!("({}, {}, {})", v[0], v[1], v[2])
}

/// `[0, 0, 0]`
fn format_list(v: &Vec3) -> String {
    format!("[{}, {}, {}]", v[0], v[1], v[2])
}

/// `(1.0, 0.0, 0.0, 1.0)`
fn format_color(c: &Rgba) -> String {
    format!("({:.1}, {:.1}, {:.1}, {:.1})", c[0], c[1], c[2], c[3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use crate::script;

    fn code_of(command: &Command) -> &str {
        assert_eq!(command.kind, EXECUTE_CODE);
        command.params.get("code").and_then(Value::as_str).unwrap()
    }

    fn run(text: &str) -> (Scene, String) {
        let mut scene = Scene::new("Test");
        let result = script::run(code_of(&translate(text)), &mut scene).unwrap();
        (scene, result)
    }

    #[test]
    fn test_red_sphere_in_the_middle() {
        assert_eq!(matching_rule("Create a red sphere in the middle"), "red_sphere_in_middle");

        let command = translate("Create a red sphere in the middle");
        let code = code_of(&command);
        assert!(code.contains("(1.0, 0.0, 0.0, 1.0)"));
        assert!(code.contains("location=(0, 0, 0)"));

        let (scene, result) = run("Create a red sphere in the middle");
        assert_eq!(result, "Created a red sphere in the middle");
        let sphere = scene.object("RedSphere").unwrap();
        assert_eq!(sphere.location, ORIGIN);
        assert_eq!(sphere.materials, vec!["RedSphere_Mat".to_string()]);
        assert_eq!(scene.material("RedSphere_Mat").unwrap().base_color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_specific_phrase_wins_without_verb() {
        // The specific rule does not need a creation verb.
        assert_eq!(matching_rule("red ball at the center"), "red_sphere_in_middle");
        assert_eq!(matching_rule("add a red ball"), "create_shape");
    }

    #[test]
    fn test_blue_cube() {
        assert_eq!(matching_rule("make a blue cube"), "create_shape");
        let (scene, result) = run("make a blue cube");
        assert_eq!(result, "Created a blue cube at location [0, 0, 0]");
        let cube = scene.object("BlueCube").unwrap();
        assert_eq!(cube.location, ORIGIN);
        assert_eq!(scene.material("BlueCube_Mat").unwrap().base_color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_shape_precedence() {
        // Cube is checked before sphere.
        let (scene, _) = run("add a sphere next to a cube");
        assert!(scene.object("Cube").is_some());
        assert!(scene.object("Sphere").is_none());
    }

    #[test]
    fn test_color_precedence_and_missing_shape() {
        let (scene, result) = run("make something green and red");
        assert_eq!(result, "Created a red object at location [0, 0, 0]");
        assert!(scene.object("Object").is_some());
        assert_eq!(scene.material("Object_Mat").unwrap().base_color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_uncolored_shape() {
        let (scene, result) = run("please add a cone");
        assert_eq!(result, "Created a cone at location [0, 0, 0]");
        assert!(scene.object("Cone").is_some());
        assert_eq!(scene.material_count(), 0);
    }

    #[test]
    fn test_plural_shapes() {
        assert_eq!(matching_rule("create two red spheres in the middle"), "red_sphere_in_middle");
        let (scene, result) = run("create two red spheres in the middle");
        assert_eq!(result, "Created a red sphere in the middle");
        assert!(scene.object("RedSphere").is_some());

        let (scene, result) = run("make some blue cubes");
        assert_eq!(result, "Created a blue cube at location [0, 0, 0]");
        assert!(scene.object("BlueCube").is_some());

        let (scene, _) = run("add cones");
        assert!(scene.object("Cone").is_some());

        let words = Words::new("red balls and boxes");
        assert!(words.contains_noun("ball"));
        assert!(!words.contains_noun("bal"));
        assert!(!Words::new("cubed").contains_noun("cube"));
    }

    #[test]
    fn test_not_understood() {
        assert_eq!(matching_rule("hello there"), FALLBACK_RULE);
        let (scene, result) = run("hello there");
        assert_eq!(result, NOT_UNDERSTOOD);
        assert_eq!(scene.object_count(), 0);

        // Verbs only count as whole words.
        assert_eq!(matching_rule("my address"), FALLBACK_RULE);
        assert_eq!(matching_rule(""), FALLBACK_RULE);
    }
}
