// scenebridge/src/script/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Scene scripts: the sandboxed language carried by `execute_code`.
//!
//! A script is a sequence of line-oriented statements. It can only reach the
//! scene through the statements below; there is no file, network or process
//! access.
//!
//! ```text
//! add <cube|uv_sphere|sphere|cylinder|cone|plane|empty> [name="N"] [location=(x, y, z)]
//!     [size=S] [radius=R] [depth=D]
//! select "Name"
//! rename "Name"
//! move (x, y, z)      rotate (x, y, z)      scale (x, y, z)
//! delete ["Name"]
//! material "Name" [color=(r, g, b[, a])] [metallic=M] [roughness=R]
//! assign ["Material"]
//! color (r, g, b[, a])
//! result "text"
//! ```
//!
//! `#` starts a comment. `add` and `select` set the active object, `material`
//! sets the active material. The whole script is parsed before anything
//! runs, and it runs against a copy of the scene that replaces the original
//! only when every statement succeeds.

mod lexer;

use thiserror::Error;

use crate::error::HandlerError;
use crate::scene::{
    rgba_from_slice, ObjectData, Primitive, Rgba, Scene, Vec3, DEFAULT_MATERIAL_COLOR, DEFAULT_METALLIC,
    DEFAULT_ROUGHNESS, ORIGIN,
};
use lexer::Token;

/// Result text when a script does not set one.
pub const DEFAULT_RESULT: &str = "Code executed";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("Syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Error on line {line}: {message}")]
    Runtime { line: usize, message: String },
}

impl ScriptError {
    pub fn line(&self) -> usize {
        match self {
            ScriptError::Syntax { line, .. } | ScriptError::Runtime { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddKind {
    Cube,
    UvSphere,
    Cylinder,
    Cone,
    Plane,
    Empty,
}

impl AddKind {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "cube" => Some(AddKind::Cube),
            "uv_sphere" | "sphere" => Some(AddKind::UvSphere),
            "cylinder" => Some(AddKind::Cylinder),
            "cone" => Some(AddKind::Cone),
            "plane" => Some(AddKind::Plane),
            "empty" => Some(AddKind::Empty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Add {
        kind: AddKind,
        name: Option<String>,
        location: Option<Vec3>,
        size: Option<f64>,
        radius: Option<f64>,
        depth: Option<f64>,
    },
    Select(String),
    Rename(String),
    Move(Vec3),
    Rotate(Vec3),
    Scale(Vec3),
    Delete(Option<String>),
    Material {
        name: String,
        color: Option<Rgba>,
        metallic: Option<f64>,
        roughness: Option<f64>,
    },
    Assign(Option<String>),
    Color(Rgba),
    Result(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    number: usize,
    statement: Statement,
}

/// A fully parsed script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    lines: Vec<Line>,
}

impl Script {
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let mut lines = Vec::new();
        for (index, text) in source.lines().enumerate() {
            let number = index + 1;
            let tokens = lexer::tokenize(text).map_err(|message| ScriptError::Syntax {
                line: number,
                message,
            })?;
            if tokens.is_empty() {
                continue;
            }
            let statement = parse_statement(tokens).map_err(|message| ScriptError::Syntax {
                line: number,
                message,
            })?;
            lines.push(Line { number, statement });
        }
        Ok(Self { lines })
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.lines.iter().map(|l| &l.statement)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Runs the script. On failure `scene` is left untouched.
    pub fn execute(&self, scene: &mut Scene) -> Result<String, ScriptError> {
        let mut exec = Executor {
            scene: scene.clone(),
            material: None,
            result: None,
        };
        for line in &self.lines {
            exec.apply(&line.statement).map_err(|e| ScriptError::Runtime {
                line: line.number,
                message: e.to_string(),
            })?;
        }
        *scene = exec.scene;
        Ok(exec.result.unwrap_or_else(|| DEFAULT_RESULT.to_string()))
    }
}

/// Parses and executes `source` against `scene`.
pub fn run(source: &str, scene: &mut Scene) -> Result<String, ScriptError> {
    Script::parse(source)?.execute(scene)
}

/// Quotes `text` as a script string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

// ---- parsing ----

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Word(String),
    Str(String),
    Number(f64),
    Tuple(Vec<f64>),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Word(_) => "word",
            Arg::Str(_) => "string",
            Arg::Number(_) => "number",
            Arg::Tuple(_) => "tuple",
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    positional: Vec<Arg>,
    named: Vec<(String, Arg)>,
}

impl Args {
    fn take_named(&mut self, key: &str) -> Option<Arg> {
        let index = self.named.iter().position(|(k, _)| k == key)?;
        Some(self.named.remove(index).1)
    }

    fn named_string(&mut self, key: &str) -> Result<Option<String>, String> {
        match self.take_named(key) {
            None => Ok(None),
            Some(Arg::Str(s)) => Ok(Some(s)),
            Some(other) => Err(format!("'{}' expects a string, got a {}", key, other.kind())),
        }
    }

    fn named_number(&mut self, key: &str) -> Result<Option<f64>, String> {
        match self.take_named(key) {
            None => Ok(None),
            Some(Arg::Number(n)) => Ok(Some(n)),
            Some(other) => Err(format!("'{}' expects a number, got a {}", key, other.kind())),
        }
    }

    fn named_vec3(&mut self, key: &str) -> Result<Option<Vec3>, String> {
        match self.take_named(key) {
            None => Ok(None),
            Some(arg) => as_vec3(arg).map(Some),
        }
    }

    fn named_color(&mut self, key: &str) -> Result<Option<Rgba>, String> {
        match self.take_named(key) {
            None => Ok(None),
            Some(arg) => as_color(arg).map(Some),
        }
    }

    fn finish(self, keyword: &str) -> Result<(), String> {
        if let Some((key, _)) = self.named.first() {
            return Err(format!("'{}' does not accept '{}'", keyword, key));
        }
        if !self.positional.is_empty() {
            return Err(format!("too many arguments for '{}'", keyword));
        }
        Ok(())
    }
}

fn as_vec3(arg: Arg) -> Result<Vec3, String> {
    match arg {
        Arg::Tuple(values) if values.len() == 3 => Ok([values[0], values[1], values[2]]),
        Arg::Tuple(values) => Err(format!("expected 3 components, got {}", values.len())),
        other => Err(format!("expected (x, y, z), got a {}", other.kind())),
    }
}

fn as_color(arg: Arg) -> Result<Rgba, String> {
    match arg {
        Arg::Tuple(values) => rgba_from_slice(&values)
            .ok_or_else(|| format!("expected 3 or 4 color components, got {}", values.len())),
        other => Err(format!("expected (r, g, b[, a]), got a {}", other.kind())),
    }
}

fn parse_args(tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>) -> Result<Args, String> {
    let mut args = Args::default();
    while let Some(token) = tokens.next() {
        match token {
            Token::Word(word) if tokens.peek() == Some(&Token::Equals) => {
                tokens.next();
                let value = match tokens.next() {
                    Some(token) => parse_value(token, tokens)?,
                    None => return Err(format!("missing value for '{}'", word)),
                };
                if args.named.iter().any(|(k, _)| k == &word) {
                    return Err(format!("'{}' given twice", word));
                }
                args.named.push((word, value));
            }
            token => {
                if !args.named.is_empty() {
                    return Err("positional argument after named argument".to_string());
                }
                let value = parse_value(token, tokens)?;
                args.positional.push(value);
            }
        }
    }
    Ok(args)
}

fn parse_value(
    token: Token,
    tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
) -> Result<Arg, String> {
    match token {
        Token::Word(w) => Ok(Arg::Word(w)),
        Token::Str(s) => Ok(Arg::Str(s)),
        Token::Number(n) => Ok(Arg::Number(n)),
        Token::LParen => {
            let mut values = Vec::new();
            loop {
                match tokens.next() {
                    Some(Token::Number(n)) => values.push(n),
                    Some(other) => return Err(format!("expected a number, found {}", other.describe())),
                    None => return Err("unclosed '('".to_string()),
                }
                match tokens.next() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    Some(other) => return Err(format!("expected ',' or ')', found {}", other.describe())),
                    None => return Err("unclosed '('".to_string()),
                }
            }
            Ok(Arg::Tuple(values))
        }
        other => Err(format!("unexpected {}", other.describe())),
    }
}

fn parse_statement(tokens: Vec<Token>) -> Result<Statement, String> {
    let mut tokens = tokens.into_iter().peekable();
    let keyword = match tokens.next() {
        Some(Token::Word(w)) => w,
        Some(other) => return Err(format!("expected a statement, found {}", other.describe())),
        None => return Err("empty statement".to_string()),
    };
    let mut args = parse_args(&mut tokens)?;

    let statement = match keyword.as_str() {
        "add" => {
            let kind = match take_positional(&mut args) {
                Some(Arg::Word(word)) => {
                    AddKind::from_word(&word).ok_or_else(|| format!("unknown object type '{}'", word))?
                }
                Some(other) => return Err(format!("expected an object type, got a {}", other.kind())),
                None => return Err("'add' needs an object type".to_string()),
            };
            Statement::Add {
                kind,
                name: args.named_string("name")?,
                location: args.named_vec3("location")?,
                size: args.named_number("size")?,
                radius: args.named_number("radius")?,
                depth: args.named_number("depth")?,
            }
        }
        "select" => Statement::Select(required_string(&mut args, &keyword)?),
        "rename" => Statement::Rename(required_string(&mut args, &keyword)?),
        "move" => Statement::Move(required_vec3(&mut args, &keyword)?),
        "rotate" => Statement::Rotate(required_vec3(&mut args, &keyword)?),
        "scale" => Statement::Scale(required_vec3(&mut args, &keyword)?),
        "delete" => Statement::Delete(optional_string(&mut args)?),
        "material" => Statement::Material {
            name: required_string(&mut args, &keyword)?,
            color: args.named_color("color")?,
            metallic: args.named_number("metallic")?,
            roughness: args.named_number("roughness")?,
        },
        "assign" => Statement::Assign(optional_string(&mut args)?),
        "color" => match take_positional(&mut args) {
            Some(arg) => Statement::Color(as_color(arg)?),
            None => return Err("'color' needs (r, g, b[, a])".to_string()),
        },
        "result" => Statement::Result(required_string(&mut args, &keyword)?),
        other => return Err(format!("unknown statement '{}'", other)),
    };

    args.finish(&keyword)?;
    Ok(statement)
}

fn take_positional(args: &mut Args) -> Option<Arg> {
    if args.positional.is_empty() {
        None
    } else {
        Some(args.positional.remove(0))
    }
}

fn required_string(args: &mut Args, keyword: &str) -> Result<String, String> {
    match take_positional(args) {
        Some(Arg::Str(s)) => Ok(s),
        Some(other) => Err(format!("'{}' expects a quoted string, got a {}", keyword, other.kind())),
        None => Err(format!("'{}' needs a quoted string", keyword)),
    }
}

fn optional_string(args: &mut Args) -> Result<Option<String>, String> {
    match take_positional(args) {
        None => Ok(None),
        Some(Arg::Str(s)) => Ok(Some(s)),
        Some(other) => Err(format!("expected a quoted string, got a {}", other.kind())),
    }
}

fn required_vec3(args: &mut Args, keyword: &str) -> Result<Vec3, String> {
    match take_positional(args) {
        Some(arg) => as_vec3(arg),
        None => Err(format!("'{}' needs (x, y, z)", keyword)),
    }
}

// ---- execution ----

struct Executor {
    scene: Scene,
    material: Option<String>,
    result: Option<String>,
}

impl Executor {
    fn active(&self) -> Result<String, HandlerError> {
        self.scene
            .active_object()
            .map(str::to_string)
            .ok_or_else(|| HandlerError::Failed("no active object".to_string()))
    }

    fn apply(&mut self, statement: &Statement) -> Result<(), HandlerError> {
        match statement {
            Statement::Add {
                kind,
                name,
                location,
                size,
                radius,
                depth,
            } => {
                let data = match kind {
                    AddKind::Cube => ObjectData::Mesh(Primitive::Cube {
                        size: size.unwrap_or(2.0),
                    }),
                    AddKind::UvSphere => ObjectData::Mesh(Primitive::UvSphere {
                        radius: radius.unwrap_or(1.0),
                    }),
                    AddKind::Cylinder => ObjectData::Mesh(Primitive::Cylinder {
                        radius: radius.unwrap_or(1.0),
                        depth: depth.unwrap_or(2.0),
                    }),
                    AddKind::Cone => ObjectData::Mesh(Primitive::Cone {
                        radius: radius.unwrap_or(1.0),
                        depth: depth.unwrap_or(2.0),
                    }),
                    AddKind::Plane => ObjectData::Mesh(Primitive::Plane {
                        size: size.unwrap_or(2.0),
                    }),
                    AddKind::Empty => ObjectData::Empty,
                };
                let base = match (name, &data) {
                    (Some(name), _) => name.as_str(),
                    (None, ObjectData::Mesh(primitive)) => primitive.label(),
                    (None, _) => "Empty",
                };
                let base = base.to_string();
                self.scene.add_object(&base, data, location.unwrap_or(ORIGIN));
            }
            Statement::Select(name) => self.scene.set_active(name)?,
            Statement::Rename(name) => {
                let active = self.active()?;
                self.scene.rename_object(&active, name)?;
            }
            Statement::Move(v) => {
                let active = self.active()?;
                self.scene.require_object_mut(&active)?.location = *v;
            }
            Statement::Rotate(v) => {
                let active = self.active()?;
                self.scene.require_object_mut(&active)?.rotation = *v;
            }
            Statement::Scale(v) => {
                let active = self.active()?;
                self.scene.require_object_mut(&active)?.scale = *v;
            }
            Statement::Delete(name) => {
                let target = match name {
                    Some(name) => name.clone(),
                    None => self.active()?,
                };
                self.scene
                    .remove_object(&target)
                    .ok_or_else(|| HandlerError::object_not_found(&target))?;
            }
            Statement::Material {
                name,
                color,
                metallic,
                roughness,
            } => {
                let created = self.scene.add_material(
                    name,
                    color.unwrap_or(DEFAULT_MATERIAL_COLOR),
                    metallic.unwrap_or(DEFAULT_METALLIC),
                    roughness.unwrap_or(DEFAULT_ROUGHNESS),
                );
                self.material = Some(created);
            }
            Statement::Assign(name) => {
                let material = match name {
                    Some(name) => name.clone(),
                    None => self
                        .material
                        .clone()
                        .ok_or_else(|| HandlerError::Failed("no active material".to_string()))?,
                };
                let active = self.active()?;
                self.scene.append_material(&active, &material)?;
                self.material = Some(material);
            }
            Statement::Color(color) => {
                let material = self
                    .material
                    .clone()
                    .ok_or_else(|| HandlerError::Failed("no active material".to_string()))?;
                self.scene
                    .material_mut(&material)
                    .ok_or_else(|| HandlerError::material_not_found(&material))?
                    .base_color = *color;
            }
            Statement::Result(text) => self.result = Some(text.clone()),
        }
        Ok(())
    }
}
