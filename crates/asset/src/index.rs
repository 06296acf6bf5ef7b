//! Vertex deduplication: turns per-corner attribute references into a compact
//! indexed vertex buffer.

use std::collections::HashMap;

use corelib::{AssetError, AssetResult, Vec2, Vec3};

use crate::mesh::IndexedMesh;

/// One face corner, as 0-based indices into the position/uv/normal pools.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Corner {
    pub position: usize,
    pub uv: usize,
    pub normal: usize,
}

impl Corner {
    pub const fn new(position: usize, uv: usize, normal: usize) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }
}

/// Build an [`IndexedMesh`] from corners listed three per triangle.
///
/// Identical corners share one output vertex; output vertices are numbered in
/// first-encounter order, so the result depends only on the input order.
/// Corners must already be in range for the given pools.
pub fn index_corners(
    corners: &[Corner],
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
) -> AssetResult<IndexedMesh> {
    if corners.len() % 3 != 0 {
        return Err(AssetError::MalformedMesh(format!(
            "{} corners do not form whole triangles",
            corners.len()
        )));
    }

    let mut unique: HashMap<Corner, u32> = HashMap::with_capacity(corners.len());
    let mut mesh = IndexedMesh {
        indices: Vec::with_capacity(corners.len()),
        ..Default::default()
    };

    for corner in corners {
        let index = match unique.get(corner) {
            Some(&idx) => idx,
            None => {
                let (Some(&p), Some(&t), Some(&n)) = (
                    positions.get(corner.position),
                    uvs.get(corner.uv),
                    normals.get(corner.normal),
                ) else {
                    return Err(AssetError::MalformedMesh(format!(
                        "corner {:?} out of bounds (positions={}, uvs={}, normals={})",
                        corner,
                        positions.len(),
                        uvs.len(),
                        normals.len()
                    )));
                };

                let idx = u32::try_from(mesh.positions.len()).map_err(|_| {
                    AssetError::MalformedMesh(format!("too many vertices (>{})", u32::MAX))
                })?;
                mesh.positions.push(p);
                mesh.uvs.push(t);
                mesh.normals.push(n);
                unique.insert(*corner, idx);
                idx
            }
        };
        mesh.indices.push(index);
    }

    log::debug!(
        "Indexed {} corners into {} unique vertices",
        corners.len(),
        mesh.vertex_count()
    );
    Ok(mesh)
}
