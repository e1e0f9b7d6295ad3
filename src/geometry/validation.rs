// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh invariant checks and topology reports

use super::mesh::{GeometryData, VertexHandle};
use super::operators::canonical_edge;
use crate::error::{GeometryError, GeometryResult};
use ahash::AHashMap;

fn violation(details: String) -> GeometryError {
    GeometryError::InvariantViolation(details)
}

/// Check the store invariants: live references, cyclic loops and edge consistency
pub fn validate(mesh: &GeometryData) -> GeometryResult<()> {
    for (edge, data) in mesh.edge_iter() {
        for v in [data.vert1, data.vert2] {
            let vertex = mesh
                .vertex(v)
                .ok_or_else(|| violation(format!("edge {:?} references dead vertex {:?}", edge, v)))?;
            if !vertex.edges().contains(&edge) {
                return Err(violation(format!("vertex {:?} does not list edge {:?}", v, edge)));
            }
        }
        if mesh.edge_between(data.vert1, data.vert2) != Some(edge) {
            return Err(violation(format!("edge {:?} missing from lookup", edge)));
        }
        for &corner in data.loops() {
            let l = mesh
                .loop_data(corner)
                .ok_or_else(|| violation(format!("edge {:?} lists dead loop {:?}", edge, corner)))?;
            if l.edge != edge {
                return Err(violation(format!("loop {:?} listed on the wrong edge", corner)));
            }
        }
    }

    for (vertex, data) in mesh.vertex_iter() {
        for &edge in data.edges() {
            let e = mesh
                .edge(edge)
                .ok_or_else(|| violation(format!("vertex {:?} lists dead edge {:?}", vertex, edge)))?;
            if !e.contains(vertex) {
                return Err(violation(format!("edge {:?} does not touch vertex {:?}", edge, vertex)));
            }
        }
    }

    for (face, data) in mesh.face_iter() {
        let n = data.len();
        if n < 3 {
            return Err(violation(format!("face {:?} has {} corners", face, n)));
        }
        let mut seen: Vec<VertexHandle> = Vec::with_capacity(n);
        for (i, &corner) in data.loops().iter().enumerate() {
            let l = mesh
                .loop_data(corner)
                .ok_or_else(|| violation(format!("face {:?} holds dead loop {:?}", face, corner)))?;
            if l.face != face {
                return Err(violation(format!("loop {:?} points at another face", corner)));
            }
            if seen.contains(&l.vertex) {
                return Err(violation(format!("face {:?} repeats vertex {:?}", face, l.vertex)));
            }
            seen.push(l.vertex);

            let next = mesh
                .loop_data(data.loops()[(i + 1) % n])
                .ok_or_else(|| violation(format!("face {:?} holds a dead loop", face)))?;
            let edge = mesh
                .edge(l.edge)
                .ok_or_else(|| violation(format!("loop {:?} references dead edge", corner)))?;
            if canonical_edge(edge.vert1, edge.vert2) != canonical_edge(l.vertex, next.vertex) {
                return Err(violation(format!(
                    "loop {:?} edge does not join consecutive corners",
                    corner
                )));
            }
            if !edge.loops().contains(&corner) {
                return Err(violation(format!("edge does not list loop {:?}", corner)));
            }
        }
    }

    Ok(())
}

/// Topology summary of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshValidation {
    /// Every edge is used by at most two faces
    pub is_manifold: bool,
    /// Every edge is used by exactly two faces
    pub is_closed: bool,
    /// Edges shared by two faces are traversed in opposite directions
    pub has_consistent_winding: bool,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
    /// Edges used by no face
    pub loose_edge_count: usize,
}

pub fn validate_mesh(mesh: &GeometryData) -> MeshValidation {
    // Directed usage per undirected edge: (forward uses, backward uses)
    let mut directed: AHashMap<(VertexHandle, VertexHandle), (u32, u32)> = AHashMap::new();
    for (face, _) in mesh.face_iter() {
        let vertices = mesh.face_vertices(face);
        let n = vertices.len();
        for i in 0..n {
            let (a, b) = (vertices[i], vertices[(i + 1) % n]);
            let key = canonical_edge(a, b);
            let entry = directed.entry(key).or_insert((0, 0));
            if key.0 == a {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    let mut boundary = 0;
    let mut loose = 0;
    let mut manifold = true;
    let mut closed = true;
    for (_, data) in mesh.edge_iter() {
        let (fwd, bwd) = directed
            .get(&canonical_edge(data.vert1, data.vert2))
            .copied()
            .unwrap_or((0, 0));
        match fwd + bwd {
            0 => {
                loose += 1;
                closed = false;
            }
            1 => {
                boundary += 1;
                closed = false;
            }
            2 => {}
            _ => {
                manifold = false;
                closed = false;
            }
        }
    }

    MeshValidation {
        is_manifold: manifold,
        is_closed: closed,
        has_consistent_winding: directed.values().all(|&(fwd, bwd)| fwd <= 1 && bwd <= 1),
        edge_count: mesh.edge_count(),
        boundary_edge_count: boundary,
        loose_edge_count: loose,
    }
}
