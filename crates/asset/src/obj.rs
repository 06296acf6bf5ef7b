//! OBJ parser for triangulated meshes with positions, texture coordinates and
//! normals on every face corner.
//!
//! Faces must have exactly three `v/vt/vn` corners with positive 1-based
//! indices. Faces that omit the uv or normal reference (`v//vn`, `v/vt`, `v`)
//! are rejected rather than filled in with defaults.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use corelib::{AssetError, AssetResult, Vec2, Vec3, vec2, vec3};

use crate::{
    index::{Corner, index_corners},
    mesh::IndexedMesh,
};

/// Parser switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjOptions {
    /// Negate the V texture coordinate on load. Files store V growing
    /// upwards, the texture sampling convention used downstream grows down.
    pub flip_v: bool,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self { flip_v: true }
    }
}

/// Attribute pools and faces exactly as they appear in the file, before
/// deduplication. Corner indices are already 0-based.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawObj {
    pub positions: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<[Corner; 3]>,
}

impl RawObj {
    /// Check every face corner against the pools and deduplicate.
    pub fn into_indexed(self) -> AssetResult<IndexedMesh> {
        for (face_no, face) in self.faces.iter().enumerate() {
            for corner in face {
                check_bounds("position", corner.position, self.positions.len(), face_no)?;
                check_bounds("uv", corner.uv, self.uvs.len(), face_no)?;
                check_bounds("normal", corner.normal, self.normals.len(), face_no)?;
            }
        }
        let corners: Vec<Corner> = self.faces.iter().flatten().copied().collect();
        index_corners(&corners, &self.positions, &self.uvs, &self.normals)
    }
}

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>, options: ObjOptions) -> AssetResult<IndexedMesh> {
    let path = path.as_ref();
    log::info!("Loading OBJ from {:?}", path);
    let file = File::open(path).map_err(|e| AssetError::file_unavailable(path, e))?;
    let mesh = load_obj_from_reader(BufReader::new(file), options)?;
    log::info!(
        "Loaded OBJ {:?}: {} vertices, {} triangles",
        path,
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(reader: R, options: ObjOptions) -> AssetResult<IndexedMesh> {
    parse_obj(reader, options)?.into_indexed()
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, options: ObjOptions) -> AssetResult<IndexedMesh> {
    load_obj_from_reader(io::Cursor::new(contents), options)
}

/// Tokenize an OBJ stream into raw pools and faces.
pub fn parse_obj<R: BufRead>(reader: R, options: ObjOptions) -> AssetResult<RawObj> {
    let mut obj = RawObj::default();
    let mut skipped = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.map_err(|e| malformed(line_no, format!("unreadable line ({e})")))?;

        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                obj.positions.push(vec3(x, y, z));
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                let v = if options.flip_v { -v } else { v };
                obj.uvs.push(vec2(u, v));
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                obj.normals.push(vec3(nx, ny, nz));
            }
            "f" => {
                let tokens: Vec<&str> = parts.collect();
                let [a, b, c] = tokens.as_slice() else {
                    return Err(malformed(
                        line_no,
                        format!("face has {} corners, expected 3", tokens.len()),
                    ));
                };
                obj.faces.push([
                    parse_corner(a, line_no)?,
                    parse_corner(b, line_no)?,
                    parse_corner(c, line_no)?,
                ]);
            }
            other => {
                // o/g/s/usemtl/mtllib/comments
                log::trace!("Skipping OBJ directive '{}' on line {}", other, line_no);
                skipped += 1;
            }
        }
    }

    if obj.faces.is_empty() {
        return Err(AssetError::MalformedMesh("OBJ contained no faces".into()));
    }

    log::debug!(
        "Parsed OBJ: {} positions, {} uvs, {} normals, {} faces, {} lines skipped",
        obj.positions.len(),
        obj.uvs.len(),
        obj.normals.len(),
        obj.faces.len(),
        skipped
    );
    Ok(obj)
}

fn malformed(line_no: usize, reason: impl AsRef<str>) -> AssetError {
    AssetError::MalformedMesh(format!("line {}: {}", line_no, reason.as_ref()))
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> AssetResult<f32> {
    let token = value.ok_or_else(|| malformed(line_no, format!("missing {what}")))?;
    token
        .parse::<f32>()
        .map_err(|_| malformed(line_no, format!("invalid {what} '{token}'")))
}

fn parse_corner(token: &str, line_no: usize) -> AssetResult<Corner> {
    let mut split = token.split('/');
    let (Some(pos), Some(uv), Some(normal), None) =
        (split.next(), split.next(), split.next(), split.next())
    else {
        return Err(malformed(
            line_no,
            format!("face corner '{token}' is not position/uv/normal"),
        ));
    };

    Ok(Corner::new(
        parse_index(pos, token, line_no)?,
        parse_index(uv, token, line_no)?,
        parse_index(normal, token, line_no)?,
    ))
}

fn parse_index(value: &str, token: &str, line_no: usize) -> AssetResult<usize> {
    match value.parse::<usize>() {
        Ok(raw) if raw > 0 => Ok(raw - 1),
        _ => Err(malformed(
            line_no,
            format!("invalid index '{value}' in face corner '{token}'"),
        )),
    }
}

fn check_bounds(what: &str, index: usize, len: usize, face_no: usize) -> AssetResult<()> {
    if index >= len {
        return Err(AssetError::MalformedMesh(format!(
            "face {}: {} index {} out of bounds (len={})",
            face_no + 1,
            what,
            index + 1,
            len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = r#"
        # unit quad
        o Quad
        v 0.0 0.0 0.0
        v 1.0 0.0 0.0
        v 1.0 1.0 0.0
        v 0.0 1.0 0.0
        vt 0.25 0.75
        vn 0.0 0.0 1.0
        s off
        f 1/1/1 2/1/1 3/1/1
        f 1/1/1 3/1/1 4/1/1
    "#;

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let mesh = load_obj_from_str(src, ObjOptions::default()).expect("parse triangle");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert!(mesh.is_valid());
    }

    #[test]
    fn shared_quad_dedups_to_four_vertices() {
        let mesh = load_obj_from_str(QUAD, ObjOptions::default()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn flat_shaded_cube_corner_splits_vertices() {
        // Two faces meet along an edge but carry different normals.
        let src = r#"
            v 0 0 0
            v 1 0 0
            v 1 1 0
            v 0 0 1
            vt 0 0
            vn 0 0 -1
            vn 0 -1 0
            f 1/1/1 3/1/1 2/1/1
            f 1/1/2 2/1/2 4/1/2
        "#;
        let mesh = load_obj_from_str(src, ObjOptions::default()).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.positions[0], mesh.positions[3]);
        assert_ne!(mesh.indices[0], mesh.indices[3]);
    }

    #[test]
    fn v_coordinate_is_flipped_by_default() {
        let mesh = load_obj_from_str(QUAD, ObjOptions::default()).unwrap();
        assert_eq!(mesh.uvs[0], vec2(0.25, -0.75));

        let mesh = load_obj_from_str(QUAD, ObjOptions { flip_v: false }).unwrap();
        assert_eq!(mesh.uvs[0], vec2(0.25, 0.75));
    }

    #[test]
    fn raw_pools_keep_file_order() {
        let raw = parse_obj(io::Cursor::new(QUAD), ObjOptions::default()).unwrap();
        assert_eq!(raw.positions.len(), 4);
        assert_eq!(raw.positions[2], vec3(1.0, 1.0, 0.0));
        assert_eq!(raw.faces.len(), 2);
        assert_eq!(raw.faces[1][2], Corner::new(3, 0, 0));
    }

    #[test]
    fn two_corner_face_is_malformed() {
        let src = "v 0 0 0\nv 1 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1\n";
        let err = load_obj_from_str(src, ObjOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedMesh(_)));
        assert!(err.to_string().contains("line 5"));
    }

    #[test]
    fn quad_face_is_malformed() {
        let src = QUAD.replace("f 1/1/1 2/1/1 3/1/1", "f 1/1/1 2/1/1 3/1/1 4/1/1");
        let err = load_obj_from_str(&src, ObjOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedMesh(_)));
    }

    #[test]
    fn incomplete_corners_are_malformed() {
        for face in ["f 1//1 2//1 3//1", "f 1/1 2/1 3/1", "f 1 2 3", "f 1/1/1/1 2/1/1 3/1/1"] {
            let src = QUAD.replace("f 1/1/1 2/1/1 3/1/1", face);
            let err = load_obj_from_str(&src, ObjOptions::default()).unwrap_err();
            assert!(matches!(err, AssetError::MalformedMesh(_)), "{face}");
        }
    }

    #[test]
    fn non_positive_or_garbage_indices_are_malformed() {
        for face in ["f 0/1/1 2/1/1 3/1/1", "f -1/1/1 2/1/1 3/1/1", "f a/1/1 2/1/1 3/1/1"] {
            let src = QUAD.replace("f 1/1/1 2/1/1 3/1/1", face);
            let err = load_obj_from_str(&src, ObjOptions::default()).unwrap_err();
            assert!(matches!(err, AssetError::MalformedMesh(_)), "{face}");
        }
    }

    #[test]
    fn out_of_range_index_is_malformed() {
        let src = QUAD.replace("f 1/1/1 3/1/1 4/1/1", "f 1/1/1 3/2/1 4/1/1");
        let err = load_obj_from_str(&src, ObjOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedMesh(_)));
        assert!(err.to_string().contains("uv index 2"));
    }

    #[test]
    fn face_may_reference_later_attributes() {
        let src = "f 1/1/1 2/1/1 3/1/1\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\n";
        let mesh = load_obj_from_str(src, ObjOptions::default()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn bad_float_and_empty_file_are_malformed() {
        let err = load_obj_from_str("v 1.0 nope 0.0\n", ObjOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedMesh(_)));

        let err = load_obj_from_str("# nothing here\n", ObjOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::MalformedMesh(_)));
    }

    #[test]
    fn load_from_path() {
        let path = std::env::temp_dir().join(format!("asset-obj-test-{}.obj", std::process::id()));
        std::fs::write(&path, QUAD).unwrap();
        let mesh = load_obj_from_path(&path, ObjOptions::default()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(mesh.vertex_count(), 4);

        let err = load_obj_from_path(path.with_extension("missing"), ObjOptions::default())
            .unwrap_err();
        assert!(matches!(err, AssetError::FileUnavailable { .. }));
    }
}
