// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Wavefront OBJ reading and writing
//!
//! Polygon faces (`f`), wire edges (`l`) and texture coordinates (`vt`) are
//! supported. Texture coordinates live in the Float×2 loop attribute `uv`.

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{Attribute, AttributeBaseType, AttributeValue, GeometryData, VertexHandle};
use ahash::AHashMap;
use nalgebra::Point3;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Loop attribute holding OBJ texture coordinates
pub const UV_ATTRIBUTE: &str = "uv";

fn parse_error(line: usize, message: impl Into<String>) -> GeometryError {
    GeometryError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_floats<'a>(line: usize, parts: impl Iterator<Item = &'a str>, count: usize) -> GeometryResult<Vec<f64>> {
    let values = parts
        .take(count)
        .map(|p| p.parse::<f64>().map_err(|_| parse_error(line, format!("invalid number `{}`", p))))
        .collect::<GeometryResult<Vec<_>>>()?;
    if values.len() < count {
        return Err(parse_error(line, format!("expected {} numbers", count)));
    }
    Ok(values)
}

/// Resolve a one-based or negative (relative) OBJ index
fn resolve_index(line: usize, token: &str, len: usize) -> GeometryResult<usize> {
    let index: i64 = token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index `{}`", token)))?;
    let resolved = if index < 0 { len as i64 + index } else { index - 1 };
    if resolved < 0 || resolved >= len as i64 {
        return Err(parse_error(line, format!("index {} out of range", index)));
    }
    Ok(resolved as usize)
}

/// Parse OBJ text into a mesh
pub fn read_obj(reader: impl BufRead) -> GeometryResult<GeometryData> {
    let mut mesh = GeometryData::new();
    let mut vertices: Vec<VertexHandle> = Vec::new();
    let mut uvs: Vec<[f64; 2]> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let number = number + 1;
        let line = line?;
        let line = line.split('#').next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let p = parse_floats(number, parts, 3)?;
                vertices.push(mesh.add_vertex(Point3::new(p[0], p[1], p[2])));
            }
            "vt" => {
                let t = parse_floats(number, parts, 2)?;
                uvs.push([t[0], t[1]]);
            }
            "f" => {
                let mut corners = Vec::new();
                let mut corner_uvs = Vec::new();
                for token in parts {
                    let mut fields = token.split('/');
                    let v = fields.next().unwrap_or("");
                    corners.push(vertices[resolve_index(number, v, vertices.len())?]);
                    match fields.next() {
                        Some(t) if !t.is_empty() => {
                            corner_uvs.push(Some(uvs[resolve_index(number, t, uvs.len())?]))
                        }
                        _ => corner_uvs.push(None),
                    }
                }
                let face = mesh
                    .add_face(&corners)
                    .map_err(|err| parse_error(number, err.to_string()))?;
                if corner_uvs.iter().any(Option::is_some) {
                    mesh.add_loop_attribute(Attribute::float(UV_ATTRIBUTE, 2))?;
                    for (corner, uv) in mesh.face_loops(face).to_vec().into_iter().zip(corner_uvs) {
                        if let Some(uv) = uv {
                            mesh.set_loop_attribute(corner, UV_ATTRIBUTE, AttributeValue::Floats(uv.to_vec()))?;
                        }
                    }
                }
            }
            "l" => {
                let indices = parts
                    .map(|token| {
                        let v = token.split('/').next().unwrap_or("");
                        resolve_index(number, v, vertices.len()).map(|i| vertices[i])
                    })
                    .collect::<GeometryResult<Vec<_>>>()?;
                for pair in indices.windows(2) {
                    if pair[0] != pair[1] {
                        mesh.add_edge(pair[0], pair[1])?;
                    }
                }
            }
            // Normals, groups, materials and smoothing are not kept
            _ => {}
        }
    }

    Ok(mesh)
}

/// Write a mesh as OBJ text
pub fn write_obj(mesh: &GeometryData, mut writer: impl Write) -> GeometryResult<()> {
    writeln!(writer, "# loopmesh")?;
    let mut index: AHashMap<VertexHandle, usize> = AHashMap::with_capacity(mesh.vertex_count());
    for (i, (handle, data)) in mesh.vertex_iter().enumerate() {
        let p = data.position;
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        index.insert(handle, i + 1);
    }

    let has_uv = mesh
        .loop_attributes()
        .attributes()
        .iter()
        .any(|a| a.name == UV_ATTRIBUTE && a.base_type == AttributeBaseType::Float && a.dimensions == 2);

    let mut next_uv = 1;
    for (face, data) in mesh.face_iter() {
        let vertices = mesh.face_vertices(face);
        if has_uv {
            for &corner in data.loops() {
                let uv = mesh
                    .loop_attribute(corner, UV_ATTRIBUTE)
                    .and_then(|a| a.as_floats())
                    .map(|f| [f[0], f[1]])
                    .unwrap_or([0.0, 0.0]);
                writeln!(writer, "vt {} {}", uv[0], uv[1])?;
            }
        }
        let mut line = String::from("f");
        for v in vertices {
            let i = index.get(&v).copied().unwrap_or(0);
            if has_uv {
                line.push_str(&format!(" {}/{}", i, next_uv));
                next_uv += 1;
            } else {
                line.push_str(&format!(" {}", i));
            }
        }
        writeln!(writer, "{}", line)?;
    }

    for (_, data) in mesh.edge_iter() {
        if data.loops().is_empty() {
            let (a, b) = (index.get(&data.vert1), index.get(&data.vert2));
            if let (Some(a), Some(b)) = (a, b) {
                writeln!(writer, "l {} {}", a, b)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn import_obj(path: impl AsRef<Path>) -> GeometryResult<GeometryData> {
    read_obj(BufReader::new(File::open(path)?))
}

pub fn export_obj(mesh: &GeometryData, path: impl AsRef<Path>) -> GeometryResult<()> {
    write_obj(mesh, BufWriter::new(File::create(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{validate_mesh, Primitive};
    use nalgebra::Vector3;

    const QUAD_WITH_UV: &str = "\
# two quads
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 2 0 0
v 2 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1 4/4/1
f 2 5 6 -4
";

    #[test]
    fn test_read_faces_and_uvs() {
        let mesh = read_obj(QUAD_WITH_UV.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.edge_count(), 7);

        let faces = mesh.faces();
        let corner = mesh.face_loops(faces[0])[2];
        assert_eq!(
            mesh.loop_attribute(corner, UV_ATTRIBUTE),
            Some(&AttributeValue::Floats(vec![1.0, 1.0]))
        );
        let corner = mesh.face_loops(faces[1])[0];
        assert!(mesh.loop_attribute(corner, UV_ATTRIBUTE).is_none());
        assert!(validate_mesh(&mesh).has_consistent_winding);
    }

    #[test]
    fn test_write_then_read_keeps_topology() {
        let mut mesh = Primitive::cube(Vector3::new(1.0, 2.0, 3.0), false).to_mesh();
        let a = mesh.add_vertex(Point3::new(5.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(6.0, 0.0, 0.0));
        mesh.add_edge(a, b).unwrap();

        let mut buffer = Vec::new();
        write_obj(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("l 9 10"));

        let back = read_obj(buffer.as_slice()).unwrap();
        assert_eq!(back.vertex_count(), 10);
        assert_eq!(back.edge_count(), 13);
        assert_eq!(back.face_count(), 6);
        assert!(validate_mesh(&back).is_manifold);
    }

    #[test]
    fn test_bad_input_reports_line() {
        let err = read_obj("v 0 0 0\nv 1 0 0\nf 1 2 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GeometryError::Parse { line: 3, .. }));

        let err = read_obj("v 0 zero 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, GeometryError::Parse { line: 1, .. }));
    }
}
