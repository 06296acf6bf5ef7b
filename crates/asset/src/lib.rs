//! Asset loading/parsers (meshes, textures).
//! Meshes: OBJ parsing, vertex deduplication, tangent basis.
//! Textures: DDS block-compressed mip chains, 24-bit BMP, PNG cubemaps.
//! Nothing here touches the GPU; see [`upload`] for the renderer-facing seam.

pub mod bmp;
pub mod dds;
pub mod index;
pub mod mesh;
pub mod obj;
pub mod tangent;
pub mod texture;
pub mod upload;

pub use corelib::{AssetError, AssetResult};
