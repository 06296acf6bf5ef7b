//! Per-vertex tangent space for normal mapping.

use corelib::{AssetError, AssetResult, Vec2, Vec3};

/// Tangent and bitangent per vertex, parallel to the mesh vertex arrays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TangentBasis {
    pub tangents: Vec<Vec3>,
    pub bitangents: Vec<Vec3>,
}

/// Tangent/bitangent of one triangle from its edges and UV deltas, or `None`
/// when the UV triangle has zero area and no gradient exists.
pub fn triangle_tangents(p: [Vec3; 3], uv: [Vec2; 3]) -> Option<(Vec3, Vec3)> {
    let e1 = p[1] - p[0];
    let e2 = p[2] - p[0];
    let d1 = uv[1] - uv[0];
    let d2 = uv[2] - uv[0];

    let det = d1.x * d2.y - d1.y * d2.x;
    if det == 0.0 {
        return None;
    }
    let r = det.recip();
    if !r.is_finite() {
        return None;
    }

    let tangent = (e1 * d2.y - e2 * d1.y) * r;
    let bitangent = (e2 * d1.x - e1 * d2.x) * r;
    Some((tangent, bitangent))
}

/// Accumulate triangle tangents onto their vertices, then orthogonalize each
/// tangent against the vertex normal and fix its handedness.
///
/// The arrays must be the deduplicated vertex attributes (same length) and
/// `indices` a triangle list into them, otherwise `MalformedMesh` is
/// returned. On success every tangent is unit length, orthogonal to its
/// normal, and satisfies `cross(n, t).dot(b) >= 0`.
pub fn compute_tangent_basis(
    positions: &[Vec3],
    uvs: &[Vec2],
    normals: &[Vec3],
    indices: &[u32],
) -> AssetResult<TangentBasis> {
    let n = positions.len();
    if uvs.len() != n || normals.len() != n {
        return Err(AssetError::MalformedMesh(format!(
            "attribute lengths differ (positions={}, uvs={}, normals={})",
            n,
            uvs.len(),
            normals.len()
        )));
    }
    if indices.len() % 3 != 0 {
        return Err(AssetError::MalformedMesh(format!(
            "{} indices do not form whole triangles",
            indices.len()
        )));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= n) {
        return Err(AssetError::MalformedMesh(format!(
            "index {} out of bounds (vertices={})",
            bad, n
        )));
    }

    let mut tangents = vec![Vec3::ZERO; n];
    let mut bitangents = vec![Vec3::ZERO; n];
    let mut degenerate = 0usize;

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        match triangle_tangents(
            [positions[i0], positions[i1], positions[i2]],
            [uvs[i0], uvs[i1], uvs[i2]],
        ) {
            Some((t, b)) => {
                for i in [i0, i1, i2] {
                    tangents[i] += t;
                    bitangents[i] += b;
                }
            }
            None => degenerate += 1,
        }
    }

    if degenerate > 0 {
        log::warn!(
            "{} of {} triangles have degenerate UVs; they add no tangent contribution",
            degenerate,
            indices.len() / 3
        );
    }

    for ((t, b), normal) in tangents.iter_mut().zip(bitangents.iter_mut()).zip(normals) {
        let normal = normal.normalize_or_zero();
        (*t, *b) = orthonormalize(normal, *t, *b);
    }

    Ok(TangentBasis {
        tangents,
        bitangents,
    })
}

fn orthonormalize(normal: Vec3, tangent: Vec3, bitangent: Vec3) -> (Vec3, Vec3) {
    // Gram-Schmidt
    let mut t = (tangent - normal * normal.dot(tangent)).normalize_or_zero();
    if t == Vec3::ZERO {
        t = if normal == Vec3::ZERO {
            Vec3::X
        } else {
            normal.any_orthonormal_vector()
        };
    }

    let b = bitangent.normalize_or_zero();
    if b == Vec3::ZERO {
        return (t, normal.cross(t).normalize_or_zero());
    }

    if normal.cross(t).dot(b) < 0.0 {
        t = -t;
    }
    (t, b)
}
