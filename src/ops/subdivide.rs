// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! One level of quad subdivision

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::attribute::lerp_rows;
use crate::geometry::operators::{attribute_lerp, canonical_edge, lerp_point};
use crate::geometry::{FaceSnapshot, GeometryData, VertexHandle};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Split every face into one quad per corner.
///
/// Each edge gains a midpoint vertex and each face a center vertex. Every
/// corner becomes the quad (corner, midpoint of the outgoing edge, center,
/// midpoint of the incoming edge). Loose edges are split at their midpoint.
pub fn subdivide(mesh: &mut GeometryData) -> GeometryResult<()> {
    let edges = mesh.edges();
    let snapshots: Vec<FaceSnapshot> = mesh
        .faces()
        .into_iter()
        .filter_map(|f| mesh.snapshot_face(f))
        .collect();
    let original_faces = snapshots.len();

    let mut midpoints: AHashMap<(VertexHandle, VertexHandle), VertexHandle> =
        AHashMap::with_capacity(edges.len());
    let mut loose = Vec::new();
    for &edge in &edges {
        let Some(data) = mesh.edge(edge) else {
            continue;
        };
        let (a, b, is_loose) = (data.vert1, data.vert2, data.loops().is_empty());
        let (Some(pa), Some(pb)) = (mesh.position(a), mesh.position(b)) else {
            continue;
        };
        let mid = mesh.add_vertex(lerp_point(&pa, &pb, 0.5));
        attribute_lerp(mesh, mid, a, b, 0.5);
        midpoints.insert(canonical_edge(a, b), mid);
        if is_loose {
            loose.push((a, mid, b));
        }
    }
    let midpoint = |a: VertexHandle, b: VertexHandle| {
        midpoints
            .get(&canonical_edge(a, b))
            .copied()
            .ok_or_else(|| GeometryError::InvariantViolation("face edge without a midpoint".into()))
    };

    let mut quads = 0;
    for snapshot in &snapshots {
        let n = snapshot.len();
        let sum = snapshot
            .vertices
            .iter()
            .filter_map(|&v| mesh.position(v))
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        let center = mesh.add_vertex(Point3::from(sum / n as f64));

        // Running mean over the corners, blended into the center one at a time
        let mut weight = 0.0;
        for &v in &snapshot.vertices {
            weight += 1.0;
            attribute_lerp(mesh, center, center, v, 1.0 / weight);
        }
        let mut center_row = snapshot.corner_rows[0].clone();
        for (i, row) in snapshot.corner_rows.iter().enumerate().skip(1) {
            center_row = lerp_rows(&center_row, row, 1.0 / (i + 1) as f64);
        }

        for i in 0..n {
            let (prev, next) = (snapshot.prev(i), snapshot.next(i));
            let v = snapshot.vertices[i];
            let vertices = [
                v,
                midpoint(v, snapshot.vertices[next])?,
                center,
                midpoint(snapshot.vertices[prev], v)?,
            ];
            let corners = [
                snapshot.corner_rows[i].clone(),
                snapshot.lerp_corner(i, next, 0.5),
                center_row.clone(),
                snapshot.lerp_corner(prev, i, 0.5),
            ];
            mesh.add_face_with_attributes(&vertices, Some(&snapshot.face_row), &corners)?;
            quads += 1;
        }
    }

    for &(a, mid, b) in &loose {
        mesh.add_edge(a, mid)?;
        mesh.add_edge(mid, b)?;
    }
    // Original faces go with their edges
    for edge in edges {
        if mesh.contains_edge(edge) {
            mesh.remove_edge(edge)?;
        }
    }

    debug!(
        "Subdivided {} faces into {} quads ({} loose edges split)",
        original_faces,
        quads,
        loose.len()
    );
    Ok(())
}
