//! CPU-side indexed mesh produced by the loaders.

use bytemuck::{Pod, Zeroable};
use corelib::{AssetResult, Vec2, Vec3};

use crate::tangent::{self, TangentBasis};

/// Interleaved vertex with every attribute the normal-mapped pipeline reads.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

/// Indexed triangle mesh stored as parallel attribute arrays.
///
/// `positions`, `uvs` and `normals` always have the same length; `tangents`
/// and `bitangents` are either empty or that length too. Every entry of
/// `indices` is below the vertex count and groups of three keep the winding
/// of the source faces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedMesh {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub bitangents: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn has_tangent_basis(&self) -> bool {
        !self.tangents.is_empty() && self.tangents.len() == self.vertex_count()
    }

    /// Returns `true` if the parallel arrays agree and every index is in range.
    pub fn is_valid(&self) -> bool {
        let n = self.vertex_count();
        let basis_ok = (self.tangents.is_empty() && self.bitangents.is_empty())
            || (self.tangents.len() == n && self.bitangents.len() == n);
        n > 0
            && self.uvs.len() == n
            && self.normals.len() == n
            && basis_ok
            && !self.indices.is_empty()
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < n)
    }

    /// Compute and attach per-vertex tangents/bitangents.
    pub fn with_tangent_basis(mut self) -> AssetResult<Self> {
        let TangentBasis {
            tangents,
            bitangents,
        } = tangent::compute_tangent_basis(&self.positions, &self.uvs, &self.normals, &self.indices)?;
        self.tangents = tangents;
        self.bitangents = bitangents;
        Ok(self)
    }

    /// Interleave the attributes for a single vertex buffer upload.
    /// Missing tangent data is written as zeros.
    pub fn interleaved(&self) -> Vec<GpuVertex> {
        (0..self.vertex_count())
            .map(|i| GpuVertex {
                position: self.positions[i].to_array(),
                uv: self.uvs[i].to_array(),
                normal: self.normals[i].to_array(),
                tangent: self.tangents.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
                bitangent: self
                    .bitangents
                    .get(i)
                    .copied()
                    .unwrap_or(Vec3::ZERO)
                    .to_array(),
            })
            .collect()
    }
}
