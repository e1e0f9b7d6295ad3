// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Insert a vertex on an edge and rebuild every face around it

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::operators::{attribute_lerp, lerp_point};
use crate::geometry::{EdgeHandle, FaceSnapshot, GeometryData, VertexHandle};

/// Split `edge` at `factor` along the way from `from` to its other endpoint.
///
/// Returns the new vertex and the new edge between it and the other endpoint.
/// Faces using the edge are removed and rebuilt with the new corner spliced in;
/// the new corner's loop attributes are blended from its two neighbors.
pub fn split_edge(
    mesh: &mut GeometryData,
    edge: EdgeHandle,
    from: VertexHandle,
    factor: f64,
) -> GeometryResult<(VertexHandle, EdgeHandle)> {
    if !(0.0..=1.0).contains(&factor) {
        return Err(GeometryError::invalid_argument(
            "factor",
            format!("{} is outside [0, 1]", factor),
        ));
    }
    let data = mesh.edge(edge).ok_or_else(|| GeometryError::stale("edge", edge))?;
    let other = data
        .other(from)
        .ok_or(GeometryError::NotIncident { element: "edge" })?;

    let (Some(p_from), Some(p_other)) = (mesh.position(from), mesh.position(other)) else {
        return Err(GeometryError::stale("vertex", from));
    };

    let snapshots: Vec<FaceSnapshot> = mesh
        .edge_faces(edge)
        .into_iter()
        .filter_map(|face| mesh.snapshot_face(face))
        .collect();

    let vertex = mesh.add_vertex(lerp_point(&p_from, &p_other, factor));
    attribute_lerp(mesh, vertex, from, other, factor);

    mesh.remove_edge(edge)?;
    mesh.add_edge(from, vertex)?;
    let new_edge = mesh.add_edge(vertex, other)?;

    for snapshot in &snapshots {
        let n = snapshot.len();
        let mut vertices = Vec::with_capacity(n + 1);
        let mut corners = Vec::with_capacity(n + 1);
        for i in 0..n {
            let j = snapshot.next(i);
            vertices.push(snapshot.vertices[i]);
            corners.push(snapshot.corner_rows[i].clone());

            let (a, b) = (snapshot.vertices[i], snapshot.vertices[j]);
            if a == from && b == other {
                vertices.push(vertex);
                corners.push(snapshot.lerp_corner(i, j, factor));
            } else if a == other && b == from {
                vertices.push(vertex);
                corners.push(snapshot.lerp_corner(i, j, 1.0 - factor));
            }
        }
        mesh.add_face_with_attributes(&vertices, Some(&snapshot.face_row), &corners)?;
    }

    Ok((vertex, new_edge))
}
