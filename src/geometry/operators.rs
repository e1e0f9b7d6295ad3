// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shared topology helpers used by every editing operator

use super::attribute::AttributeValue;
use super::mesh::{FaceHandle, GeometryData, LoopHandle, VertexHandle};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};

/// Order-independent key for the undirected edge `(a, b)`
pub fn canonical_edge(a: VertexHandle, b: VertexHandle) -> (VertexHandle, VertexHandle) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Count how many faces of `faces` use each edge.
///
/// A count of 1 marks a boundary edge of the selection, 2 or more a shared one.
pub fn edge_usage(
    mesh: &GeometryData,
    faces: &[FaceHandle],
) -> AHashMap<(VertexHandle, VertexHandle), usize> {
    let mut usage = AHashMap::new();
    for &face in faces {
        let vertices = mesh.face_vertices(face);
        let n = vertices.len();
        for i in 0..n {
            *usage
                .entry(canonical_edge(vertices[i], vertices[(i + 1) % n]))
                .or_insert(0) += 1;
        }
    }
    usage
}

/// Set every vertex attribute of `target` to `from*(1-t) + to*t`.
///
/// `t = 1` copies `to`. Channels missing on a needed side are left unset.
pub fn attribute_lerp(
    mesh: &mut GeometryData,
    target: VertexHandle,
    from: VertexHandle,
    to: VertexHandle,
    t: f64,
) {
    let table = mesh.vertex_attributes();
    let row = (0..table.len())
        .map(|c| AttributeValue::lerp(table.get(c, from.index()), table.get(c, to.index()), t))
        .collect();
    mesh.set_vertex_row(target, &row);
}

/// Loop-attribute counterpart of [`attribute_lerp`]
pub fn loop_attribute_lerp(
    mesh: &mut GeometryData,
    target: LoopHandle,
    from: LoopHandle,
    to: LoopHandle,
    t: f64,
) {
    let table = mesh.loop_attributes();
    let row = (0..table.len())
        .map(|c| AttributeValue::lerp(table.get(c, from.index()), table.get(c, to.index()), t))
        .collect();
    mesh.set_loop_row(target, &row);
}

/// Newell normal of a polygon, normalized; zero when degenerate
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}

/// Normal from the cross product of the first two edge vectors, normalized
pub fn first_edges_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    if points.len() < 3 {
        return Vector3::zeros();
    }
    let e1 = points[1] - points[0];
    let e2 = points[2] - points[1];
    e1.cross(&e2).try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}

pub fn lerp_point(a: &Point3<f64>, b: &Point3<f64>, t: f64) -> Point3<f64> {
    a + (b - a) * t
}
