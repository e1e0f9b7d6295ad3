// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Inset a face selection, leaving a ring of wall quads around it

use super::{rebuild_with_walls, snapshot_selection, Shell};
use crate::config::AMOUNT_EPSILON;
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::operators::{edge_usage, lerp_point};
use crate::geometry::{FaceHandle, GeometryData, VertexHandle};
use ahash::AHashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How inset vertices are shared between selected faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InsetMode {
    /// Every face is inset on its own, with walls on all of its edges
    #[default]
    PerFace,
    /// Faces of the selection move together; walls only on its outer boundary
    Shared,
}

/// Inset `faces` by `thickness`, a fraction of the way toward each vertex's
/// target. Returns the new inner faces.
pub fn inset_faces(
    mesh: &mut GeometryData,
    faces: &[FaceHandle],
    thickness: f64,
    mode: InsetMode,
) -> GeometryResult<Vec<FaceHandle>> {
    if !thickness.is_finite() {
        return Err(GeometryError::invalid_argument(
            "thickness",
            format!("{} is not a finite number", thickness),
        ));
    }
    let selection = snapshot_selection(mesh, faces)?;
    if selection.is_empty() || thickness.abs() <= AMOUNT_EPSILON {
        return Ok(selection.into_iter().map(|(f, _)| f).collect());
    }

    let shells = match mode {
        InsetMode::PerFace => {
            let mut shells = Vec::with_capacity(selection.len());
            for (face, snapshot) in selection {
                let center = mesh
                    .face_center(face)
                    .ok_or_else(|| GeometryError::stale("face", face))?;
                let mut offset = Vec::with_capacity(snapshot.len());
                for &v in &snapshot.vertices {
                    let p = mesh.position(v).ok_or_else(|| GeometryError::stale("vertex", v))?;
                    let nv = mesh.add_vertex(lerp_point(&p, &center, thickness));
                    mesh.copy_vertex_attributes(nv, v);
                    offset.push(nv);
                }
                shells.push(Shell { face, snapshot, offset });
            }
            shells
        }
        InsetMode::Shared => {
            let handles: Vec<FaceHandle> = selection.iter().map(|(f, _)| *f).collect();
            let usage = edge_usage(mesh, &handles);
            let mut shared: AHashMap<VertexHandle, Vec<VertexHandle>> = AHashMap::new();
            for (&(a, b), &count) in &usage {
                if count >= 2 {
                    shared.entry(a).or_default().push(b);
                    shared.entry(b).or_default().push(a);
                }
            }
            let mut owners: AHashMap<VertexHandle, Vec<FaceHandle>> = AHashMap::new();
            for (face, snapshot) in &selection {
                for &v in &snapshot.vertices {
                    owners.entry(v).or_default().push(*face);
                }
            }

            let mut moved: AHashMap<VertexHandle, VertexHandle> = AHashMap::new();
            let mut shells = Vec::with_capacity(selection.len());
            for (face, snapshot) in selection {
                let mut offset = Vec::with_capacity(snapshot.len());
                for &v in &snapshot.vertices {
                    if let Some(&nv) = moved.get(&v) {
                        offset.push(nv);
                        continue;
                    }
                    let p = mesh.position(v).ok_or_else(|| GeometryError::stale("vertex", v))?;
                    let target = shared_target(mesh, v, p, &owners, &shared)?;
                    let nv = mesh.add_vertex(lerp_point(&p, &target, thickness));
                    mesh.copy_vertex_attributes(nv, v);
                    moved.insert(v, nv);
                    offset.push(nv);
                }
                shells.push(Shell { face, snapshot, offset });
            }
            shells
        }
    };

    let result = rebuild_with_walls(mesh, &shells, mode == InsetMode::PerFace)?;
    debug!("Inset {} faces ({:?})", result.len(), mode);
    Ok(result)
}

/// Where a vertex heads in shared mode
fn shared_target(
    mesh: &GeometryData,
    vertex: VertexHandle,
    position: Point3<f64>,
    owners: &AHashMap<VertexHandle, Vec<FaceHandle>>,
    shared: &AHashMap<VertexHandle, Vec<VertexHandle>>,
) -> GeometryResult<Point3<f64>> {
    if let Some([face]) = owners.get(&vertex).map(Vec::as_slice) {
        return mesh
            .face_center(*face)
            .ok_or_else(|| GeometryError::stale("face", *face));
    }
    let neighbors = shared.get(&vertex).map(Vec::as_slice).unwrap_or(&[]);
    let points: Vec<Point3<f64>> = neighbors.iter().filter_map(|&n| mesh.position(n)).collect();
    Ok(match points.as_slice() {
        [a] => lerp_point(&position, a, 0.5),
        [a, b] => lerp_point(a, b, 0.5),
        // Junctions stay put
        _ => position,
    })
}
