// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL import and binary export
//!
//! STL only stores triangles, so faces are fan-triangulated on export and
//! attributes are lost.

use crate::error::GeometryResult;
use crate::geometry::GeometryData;
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use stl_io::{Normal, Triangle, Vertex};

fn to_stl_vertex(p: &Point3<f64>) -> Vertex {
    Vertex::new([p.x as f32, p.y as f32, p.z as f32])
}

/// Fan-triangulate every face, using the face normal for each triangle
pub fn triangulate(mesh: &GeometryData) -> Vec<Triangle> {
    let mut triangles = Vec::new();
    for (face, _) in mesh.face_iter() {
        let positions = mesh.face_positions(face);
        let n = mesh.face_normal(face).unwrap_or_else(Vector3::zeros);
        let normal = Normal::new([n.x as f32, n.y as f32, n.z as f32]);
        for i in 1..positions.len().saturating_sub(1) {
            triangles.push(Triangle {
                normal,
                vertices: [
                    to_stl_vertex(&positions[0]),
                    to_stl_vertex(&positions[i]),
                    to_stl_vertex(&positions[i + 1]),
                ],
            });
        }
    }
    triangles
}

pub fn write_stl(mesh: &GeometryData, mut writer: impl Write) -> GeometryResult<()> {
    let triangles = triangulate(mesh);
    stl_io::write_stl(&mut writer, triangles.iter())?;
    writer.flush()?;
    Ok(())
}

/// Read ASCII or binary STL; coincident corners share one vertex
pub fn read_stl(mut reader: impl Read + Seek) -> GeometryResult<GeometryData> {
    let stl = stl_io::read_stl(&mut reader)?;
    let positions: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let polygons: Vec<Vec<usize>> = stl
        .faces
        .iter()
        .map(|f| f.vertices.to_vec())
        // Triangles collapsed by f32 rounding cannot form faces
        .filter(|v| v[0] != v[1] && v[1] != v[2] && v[0] != v[2])
        .collect();
    GeometryData::from_polygons(&positions, &polygons)
}

pub fn export_stl(mesh: &GeometryData, path: impl AsRef<Path>) -> GeometryResult<()> {
    write_stl(mesh, BufWriter::new(File::create(path)?))
}

pub fn import_stl(path: impl AsRef<Path>) -> GeometryResult<GeometryData> {
    read_stl(File::open(path)?)
}
