//! GPU upload interface.
//!
//! The renderer implements these traits to turn CPU asset data into GPU
//! resources; loaders never talk to the graphics API themselves.

use crate::{
    dds::{CompressionFormat, DdsTexture},
    mesh::IndexedMesh,
    texture::{CubemapData, TextureData},
};

/// Receives vertex/index bytes for one mesh.
pub trait MeshUpload {
    fn upload_mesh(&mut self, label: &str, vertices: &[u8], indices: &[u8], index_count: u32);
}

/// Receives texture images, one call per mip level or cubemap face.
pub trait TextureUpload {
    fn upload_compressed_level(
        &mut self,
        label: &str,
        format: CompressionFormat,
        level: u32,
        width: u32,
        height: u32,
        blocks: &[u8],
    );

    /// `face` is `None` for a 2D texture, otherwise the cubemap face index (+X first).
    fn upload_image(&mut self, label: &str, face: Option<usize>, texture: &TextureData);
}

/// Interleave `mesh` and hand it to `target` as raw bytes.
pub fn upload_mesh(target: &mut impl MeshUpload, label: &str, mesh: &IndexedMesh) {
    let vertices = mesh.interleaved();
    target.upload_mesh(
        label,
        bytemuck::cast_slice(&vertices),
        bytemuck::cast_slice(&mesh.indices),
        mesh.indices.len() as u32,
    );
}

/// Upload every mip level of a compressed texture, level 0 first.
pub fn upload_dds(target: &mut impl TextureUpload, label: &str, texture: &DdsTexture) {
    for (level, width, height, blocks) in texture.iter_levels() {
        target.upload_compressed_level(label, texture.format, level, width, height, blocks);
    }
}

pub fn upload_cubemap(target: &mut impl TextureUpload, label: &str, cubemap: &CubemapData) {
    for (face, texture) in cubemap.faces.iter().enumerate() {
        target.upload_image(label, Some(face), texture);
    }
}
