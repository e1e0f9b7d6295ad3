// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut a face in two along a diagonal

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{AttributeRow, FaceHandle, FaceSnapshot, GeometryData, VertexHandle};

/// Corners from `start` to `end` inclusive, walking forward
fn arc(snapshot: &FaceSnapshot, start: usize, end: usize) -> (Vec<VertexHandle>, Vec<AttributeRow>) {
    let mut vertices = Vec::new();
    let mut corners = Vec::new();
    let mut i = start;
    loop {
        vertices.push(snapshot.vertices[i]);
        corners.push(snapshot.corner_rows[i].clone());
        if i == end {
            break;
        }
        i = snapshot.next(i);
    }
    (vertices, corners)
}

/// Split `face` along the diagonal `v1`-`v2`.
///
/// Both vertices must be corners of the face and must not be adjacent. The
/// first returned face runs from `v1` to `v2`, the second from `v2` back to
/// `v1`; both keep the face attributes and the corner attributes of the
/// original face.
pub fn split_face(
    mesh: &mut GeometryData,
    face: FaceHandle,
    v1: VertexHandle,
    v2: VertexHandle,
) -> GeometryResult<(FaceHandle, FaceHandle)> {
    let snapshot = mesh
        .snapshot_face(face)
        .ok_or_else(|| GeometryError::stale("face", face))?;
    let i = snapshot
        .corner_of(v1)
        .ok_or(GeometryError::NotIncident { element: "face" })?;
    let j = snapshot
        .corner_of(v2)
        .ok_or(GeometryError::NotIncident { element: "face" })?;
    if i == j || snapshot.next(i) == j || snapshot.next(j) == i {
        return Err(GeometryError::invalid_argument(
            "v2",
            "split vertices must be distinct and not adjacent",
        ));
    }

    mesh.remove_face(face)?;

    let (first_vertices, first_corners) = arc(&snapshot, i, j);
    let (second_vertices, second_corners) = arc(&snapshot, j, i);
    let first =
        mesh.add_face_with_attributes(&first_vertices, Some(&snapshot.face_row), &first_corners)?;
    let second =
        mesh.add_face_with_attributes(&second_vertices, Some(&snapshot.face_row), &second_corners)?;
    Ok((first, second))
}
