// scenebridge/scenebridge-cli/src/main.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use scenebridge::client::{
    CameraSettings, LightingSettings, MaterialSpec, ObjectChanges, ObjectSpec, SceneClient,
};
use scenebridge::scene::{Rgba, Vec3};
use scenebridge::{config, Params, Response};

/// Scenebridge CLI: send commands to a running host application
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config file, if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host application address
    #[arg(long, global = true)]
    host: Option<String>,

    /// Host application port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show scene information
    Scene,
    /// List all objects
    Objects,
    /// List all materials
    Materials,
    /// Create an object
    Create {
        /// CUBE, SPHERE, CYLINDER, CONE, PLANE or EMPTY
        #[arg(default_value = "CUBE")]
        object_type: String,
        #[arg(long)]
        name: Option<String>,
        /// x,y,z
        #[arg(long, value_parser = parse_vec3)]
        location: Option<Vec3>,
        /// x,y,z
        #[arg(long, value_parser = parse_vec3)]
        size: Option<Vec3>,
        /// r,g,b[,a]
        #[arg(long, value_parser = parse_color)]
        color: Option<Rgba>,
    },
    /// Delete an object
    Delete { name: String },
    /// Change an object's transform or color
    Modify {
        name: String,
        #[arg(long, value_parser = parse_vec3)]
        location: Option<Vec3>,
        #[arg(long, value_parser = parse_vec3)]
        size: Option<Vec3>,
        #[arg(long, value_parser = parse_vec3)]
        rotation: Option<Vec3>,
        #[arg(long, value_parser = parse_color)]
        color: Option<Rgba>,
    },
    /// Create a material
    Material {
        name: String,
        #[arg(long, value_parser = parse_color)]
        color: Option<Rgba>,
        #[arg(long)]
        metallic: Option<f64>,
        #[arg(long)]
        roughness: Option<f64>,
    },
    /// Assign a material to an object
    Assign { object: String, material: String },
    /// Pose the scene camera
    Camera {
        #[arg(long, value_parser = parse_vec3)]
        location: Option<Vec3>,
        #[arg(long, value_parser = parse_vec3)]
        rotation: Option<Vec3>,
        /// Object the camera should track
        #[arg(long)]
        target: Option<String>,
        /// PERSP, ORTHO or PANO
        #[arg(long = "type")]
        camera_type: Option<String>,
    },
    /// Apply a lighting preset
    Lighting {
        /// STUDIO, OUTDOOR, NIGHT or anything else for a single point light
        #[arg(default_value = "STUDIO")]
        lighting_type: String,
        #[arg(long)]
        intensity: Option<f64>,
        #[arg(long, value_parser = parse_vec3)]
        color: Option<Vec3>,
    },
    /// Run a scene script
    Exec {
        /// Script text
        #[arg(required_unless_present = "file")]
        code: Option<String>,
        /// Read the script from a file
        #[arg(short, long, conflicts_with = "code")]
        file: Option<PathBuf>,
        /// Run with this object active
        #[arg(long)]
        active: Option<String>,
    },
    /// Send a natural-language instruction
    Say {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Send any command with JSON parameters
    Raw {
        kind: String,
        /// JSON object
        params: Option<String>,
    },
}

fn parse_numbers(s: &str) -> Result<Vec<f64>, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", part.trim()))
        })
        .collect()
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    match parse_numbers(s)?.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        other => Err(format!("expected x,y,z, got {} values", other.len())),
    }
}

fn parse_color(s: &str) -> Result<Rgba, String> {
    let values = parse_numbers(s)?;
    scenebridge::scene::rgba_from_slice(&values)
        .ok_or_else(|| format!("expected r,g,b[,a], got {} values", values.len()))
}

fn print_response(response: Response) {
    match response.into_result() {
        Ok(Value::String(text)) => println!("{}", text),
        Ok(result) => println!("{:#}", result),
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    }
}

async fn handle_command(client: &mut SceneClient, cmd: Commands) -> anyhow::Result<Response> {
    let response = match cmd {
        Commands::Scene => client.get_scene_info().await,
        Commands::Objects => client.get_objects().await,
        Commands::Materials => client.get_materials().await,
        Commands::Create {
            object_type,
            name,
            location,
            size,
            color,
        } => {
            let spec = ObjectSpec {
                object_type: Some(object_type),
                name,
                location,
                size,
                color,
            };
            client.create_object(&spec).await
        }
        Commands::Delete { name } => client.delete_object(&name).await,
        Commands::Modify {
            name,
            location,
            size,
            rotation,
            color,
        } => {
            let changes = ObjectChanges {
                location,
                size,
                rotation,
                color,
            };
            client.modify_object(&name, &changes).await
        }
        Commands::Material {
            name,
            color,
            metallic,
            roughness,
        } => {
            let spec = MaterialSpec {
                name,
                color,
                metallic,
                roughness,
            };
            client.create_material(&spec).await
        }
        Commands::Assign { object, material } => client.assign_material(&object, &material).await,
        Commands::Camera {
            location,
            rotation,
            target,
            camera_type,
        } => {
            let settings = CameraSettings {
                location,
                rotation,
                target,
                camera_type,
            };
            client.set_camera(&settings).await
        }
        Commands::Lighting {
            lighting_type,
            intensity,
            color,
        } => {
            let settings = LightingSettings {
                lighting_type: Some(lighting_type),
                intensity,
                color,
            };
            client.set_lighting(&settings).await
        }
        Commands::Exec { code, file, active } => {
            let code = match (code, file) {
                (Some(code), _) => code,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to read script {}: {}", path.display(), e))?,
                (None, None) => anyhow::bail!("No script given"),
            };
            match active {
                Some(name) => client.modify_active_object(&name, &code).await,
                None => client.execute_code(&code).await,
            }
        }
        Commands::Say { text } => client.natural_language(&text.join(" ")).await,
        Commands::Raw { kind, params } => {
            let params: Option<Params> = match params {
                Some(json) => match serde_json::from_str::<Value>(&json)? {
                    Value::Object(map) => Some(map),
                    Value::Null => None,
                    _ => anyhow::bail!("Parameters must be a JSON object"),
                },
                None => None,
            };
            client.send_command(&kind, params).await
        }
    };
    Ok(response)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, _warnings) = config::load(cli.config.as_deref()).await?;

    let mut client_config = config.client;
    if let Some(host) = cli.host {
        client_config.host = host;
    }
    if let Some(port) = cli.port {
        client_config.port = port;
    }

    let mut client = SceneClient::new(client_config);
    let response = handle_command(&mut client, cli.command).await?;
    client.disconnect().await;
    print_response(response);
    Ok(())
}
