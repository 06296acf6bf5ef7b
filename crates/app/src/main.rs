//! Entry point: asset inspector.
//! Loads meshes and textures the way the renderer would and reports what an
//! upload would transfer.

mod inspect;

use std::path::PathBuf;

use anyhow::{Context, Result};
use asset::{dds::DdsOptions, obj::ObjOptions};

/// Settings collected from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub obj: ObjOptions,
    pub dds: DdsOptions,
    pub tangents: bool,
    pub skybox: Option<PathBuf>,
    pub assets: Vec<PathBuf>,
}

fn parse_args(args: &[String]) -> Config {
    // Accept: --no-flip-v --lenient-dds --tangents --skybox=<dir> <asset>...
    let mut config = Config {
        obj: ObjOptions::default(),
        dds: DdsOptions::default(),
        tangents: false,
        skybox: None,
        assets: Vec::new(),
    };

    for arg in args {
        if arg == "--no-flip-v" {
            config.obj.flip_v = false;
        } else if arg == "--lenient-dds" {
            config.dds.strict_payload = false;
        } else if arg == "--tangents" {
            config.tangents = true;
        } else if let Some(dir) = arg.strip_prefix("--skybox=") {
            config.skybox = Some(PathBuf::from(dir));
        } else if arg.starts_with("--") {
            log::warn!("Unknown flag '{}', ignoring.", arg);
        } else {
            config.assets.push(PathBuf::from(arg));
        }
    }
    config
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_args(&args);
    log::info!(
        "Inspecting {} asset(s). flip_v={}, strict_dds={}, tangents={}, skybox={:?}",
        config.assets.len(),
        config.obj.flip_v,
        config.dds.strict_payload,
        config.tangents,
        config.skybox
    );

    let mut uploader = inspect::UploadReport::default();
    for path in &config.assets {
        inspect::inspect_asset(path, &config, &mut uploader)
            .with_context(|| format!("Failed to load asset {}", path.display()))?;
    }
    if let Some(dir) = &config.skybox {
        inspect::inspect_skybox(dir, &mut uploader)
            .with_context(|| format!("Failed to load skybox {}", dir.display()))?;
    }

    log::info!(
        "Done: {} bytes of vertex/index data, {} bytes of texture data.",
        uploader.mesh_bytes,
        uploader.texture_bytes
    );
    Ok(())
}
