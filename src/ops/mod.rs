// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Editing operators - each one mutates a mesh in place

mod bevel;
mod bisect;
mod extrude;
mod inset;
mod merge;
mod split_edge;
mod split_face;
mod squarify;
mod subdivide;
mod weld;

pub use bevel::bevel_vertices;
pub use bisect::{bisect_plane, separating_pairs, BisectStats, PlaneSide};
pub use extrude::{extrude_faces, ExtrudeMode};
pub use inset::{inset_faces, InsetMode};
pub use merge::merge;
pub use split_edge::split_edge;
pub use split_face::split_face;
pub use squarify::{squarify, REST_POSITION_ATTRIBUTE, REST_WEIGHT_ATTRIBUTE};
pub use subdivide::subdivide;
pub use weld::{weld_vertices, weld_vertices_near};

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::operators::{canonical_edge, edge_usage};
use crate::geometry::{FaceHandle, FaceSnapshot, GeometryData, VertexHandle};

/// A selected face together with the vertices that replace its corners
pub(crate) struct Shell {
    pub face: FaceHandle,
    pub snapshot: FaceSnapshot,
    /// `offset[i]` replaces `snapshot.vertices[i]`
    pub offset: Vec<VertexHandle>,
}

/// Snapshot every live face of a selection, dropping stale and repeated handles
pub(crate) fn snapshot_selection(
    mesh: &GeometryData,
    faces: &[FaceHandle],
) -> GeometryResult<Vec<(FaceHandle, FaceSnapshot)>> {
    let mut result: Vec<(FaceHandle, FaceSnapshot)> = Vec::with_capacity(faces.len());
    for &face in faces {
        if result.iter().any(|(f, _)| *f == face) {
            continue;
        }
        let snapshot = mesh
            .snapshot_face(face)
            .ok_or_else(|| GeometryError::stale("face", face))?;
        result.push((face, snapshot));
    }
    Ok(result)
}

/// Replace each shell's face by its offset copy and stitch quad walls between
/// the original boundary and the copy.
///
/// With `per_face` every edge of every face gets a wall; otherwise only edges
/// used once by the selection do. Original edges and vertices left without
/// any use afterwards are removed. Returns the new faces in shell order.
pub(crate) fn rebuild_with_walls(
    mesh: &mut GeometryData,
    shells: &[Shell],
    per_face: bool,
) -> GeometryResult<Vec<FaceHandle>> {
    let faces: Vec<FaceHandle> = shells.iter().map(|s| s.face).collect();
    let usage = edge_usage(mesh, &faces);
    for &face in &faces {
        mesh.remove_face(face)?;
    }

    let mut tops = Vec::with_capacity(shells.len());
    for shell in shells {
        let snapshot = &shell.snapshot;
        tops.push(mesh.add_face_with_attributes(
            &shell.offset,
            Some(&snapshot.face_row),
            &snapshot.corner_rows,
        )?);

        for i in 0..snapshot.len() {
            let j = snapshot.next(i);
            let (a, b) = (snapshot.vertices[i], snapshot.vertices[j]);
            let boundary = usage.get(&canonical_edge(a, b)).copied().unwrap_or(0) == 1;
            if !per_face && !boundary {
                continue;
            }
            let corners = [
                snapshot.corner_rows[i].clone(),
                snapshot.corner_rows[j].clone(),
                snapshot.corner_rows[j].clone(),
                snapshot.corner_rows[i].clone(),
            ];
            mesh.add_face_with_attributes(
                &[a, b, shell.offset[j], shell.offset[i]],
                Some(&snapshot.face_row),
                &corners,
            )?;
        }
    }

    let old_edges: Vec<_> = shells.iter().flat_map(|s| s.snapshot.edges.iter().copied()).collect();
    mesh.remove_loose_edges(old_edges);
    for shell in shells {
        for &v in &shell.snapshot.vertices {
            if mesh.contains_vertex(v) && mesh.vertex_edges(v).is_empty() {
                mesh.remove_vertex(v)?;
            }
        }
    }
    Ok(tops)
}
