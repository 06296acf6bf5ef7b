//! Per-asset loading and the logging upload target.

use std::path::Path;

use anyhow::{Result, bail};
use asset::{
    bmp, dds,
    dds::CompressionFormat,
    obj,
    texture::{CubemapData, TextureData},
    upload::{self, MeshUpload, TextureUpload},
};

use crate::Config;

/// Upload target that only tallies and logs what would be sent to the GPU.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub mesh_bytes: usize,
    pub texture_bytes: usize,
}

impl MeshUpload for UploadReport {
    fn upload_mesh(&mut self, label: &str, vertices: &[u8], indices: &[u8], index_count: u32) {
        log::info!(
            "[{}] vertex buffer {} bytes, index buffer {} bytes ({} indices)",
            label,
            vertices.len(),
            indices.len(),
            index_count
        );
        self.mesh_bytes += vertices.len() + indices.len();
    }
}

impl TextureUpload for UploadReport {
    fn upload_compressed_level(
        &mut self,
        label: &str,
        format: CompressionFormat,
        level: u32,
        width: u32,
        height: u32,
        blocks: &[u8],
    ) {
        log::debug!(
            "[{}] {} (0x{:08x}) level {}: {}x{}, {} bytes",
            label,
            format,
            format.fourcc(),
            level,
            width,
            height,
            blocks.len()
        );
        self.texture_bytes += blocks.len();
    }

    fn upload_image(&mut self, label: &str, face: Option<usize>, texture: &TextureData) {
        log::debug!(
            "[{}] face {:?}: {}x{} {:?}, {} bytes",
            label,
            face,
            texture.width,
            texture.height,
            texture.format,
            texture.data.len()
        );
        self.texture_bytes += texture.data.len();
    }
}

/// Load one asset by extension and push it through `target`.
pub fn inspect_asset<T>(path: &Path, config: &Config, target: &mut T) -> Result<()>
where
    T: MeshUpload + TextureUpload,
{
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "obj" => {
            let mut mesh = obj::load_obj_from_path(path, config.obj)?;
            if config.tangents {
                mesh = mesh.with_tangent_basis()?;
            }
            upload::upload_mesh(target, &label, &mesh);
        }
        "dds" => {
            let texture = dds::load_dds_from_path(path, config.dds)?;
            upload::upload_dds(target, &label, &texture);
        }
        "bmp" => {
            let texture = bmp::load_bmp_from_path(path)?;
            target.upload_image(&label, None, &texture);
        }
        other => bail!("Unrecognized asset extension '{}'", other),
    }
    Ok(())
}

pub fn inspect_skybox<T: TextureUpload>(dir: &Path, target: &mut T) -> Result<()> {
    let cubemap = CubemapData::load_dir(dir)?;
    log::info!("Skybox faces are {}px", cubemap.face_size());
    upload::upload_cubemap(target, "skybox", &cubemap);
    Ok(())
}
