// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Extrude a face selection along its normals

use super::{rebuild_with_walls, snapshot_selection, Shell};
use crate::config::AMOUNT_EPSILON;
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::operators::first_edges_normal;
use crate::geometry::{FaceHandle, GeometryData, VertexHandle};
use ahash::AHashMap;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Direction each extruded vertex travels in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrudeMode {
    /// Each face moves along its own normal with its own vertices
    #[default]
    PerFace,
    /// Shared vertices move along the mean normal of their selected faces
    AlongNormals,
    /// Every vertex moves along the mean normal of the whole selection
    AverageNormal,
}

/// Extrude `faces` by `distance` and return the new top faces.
///
/// A distance within [`AMOUNT_EPSILON`] of zero leaves the mesh unchanged.
pub fn extrude_faces(
    mesh: &mut GeometryData,
    faces: &[FaceHandle],
    distance: f64,
    mode: ExtrudeMode,
) -> GeometryResult<Vec<FaceHandle>> {
    if !distance.is_finite() {
        return Err(GeometryError::invalid_argument(
            "distance",
            format!("{} is not a finite number", distance),
        ));
    }
    let selection = snapshot_selection(mesh, faces)?;
    if selection.is_empty() || distance.abs() <= AMOUNT_EPSILON {
        return Ok(selection.into_iter().map(|(f, _)| f).collect());
    }

    let normals: Vec<Vector3<f64>> = selection
        .iter()
        .map(|(face, _)| first_edges_normal(&mesh.face_positions(*face)))
        .collect();

    let mut shells = Vec::with_capacity(selection.len());
    if mode == ExtrudeMode::PerFace {
        for ((face, snapshot), normal) in selection.into_iter().zip(&normals) {
            let mut offset = Vec::with_capacity(snapshot.len());
            for &v in &snapshot.vertices {
                offset.push(offset_vertex(mesh, v, normal * distance)?);
            }
            shells.push(Shell { face, snapshot, offset });
        }
    } else {
        let mut directions: AHashMap<VertexHandle, Vector3<f64>> = AHashMap::new();
        if mode == ExtrudeMode::AverageNormal {
            let mean = normals.iter().sum::<Vector3<f64>>() / normals.len() as f64;
            let direction = mean.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
            for (_, snapshot) in &selection {
                for &v in &snapshot.vertices {
                    directions.insert(v, direction);
                }
            }
        } else {
            for ((_, snapshot), normal) in selection.iter().zip(&normals) {
                for &v in &snapshot.vertices {
                    *directions.entry(v).or_insert_with(Vector3::zeros) += normal;
                }
            }
            for direction in directions.values_mut() {
                *direction = direction.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
            }
        }

        let mut moved: AHashMap<VertexHandle, VertexHandle> = AHashMap::new();
        for (face, snapshot) in selection {
            let mut offset = Vec::with_capacity(snapshot.len());
            for &v in &snapshot.vertices {
                let nv = match moved.get(&v) {
                    Some(&nv) => nv,
                    None => {
                        let direction = directions.get(&v).copied().unwrap_or_else(Vector3::zeros);
                        let nv = offset_vertex(mesh, v, direction * distance)?;
                        moved.insert(v, nv);
                        nv
                    }
                };
                offset.push(nv);
            }
            shells.push(Shell { face, snapshot, offset });
        }
    }

    let tops = rebuild_with_walls(mesh, &shells, mode == ExtrudeMode::PerFace)?;
    debug!("Extruded {} faces by {} ({:?})", tops.len(), distance, mode);
    Ok(tops)
}

/// New vertex at `vertex + delta` carrying the same attributes
fn offset_vertex(mesh: &mut GeometryData, vertex: VertexHandle, delta: Vector3<f64>) -> GeometryResult<VertexHandle> {
    let p = mesh
        .position(vertex)
        .ok_or_else(|| GeometryError::stale("vertex", vertex))?;
    let nv = mesh.add_vertex(p + delta);
    mesh.copy_vertex_attributes(nv, vertex);
    Ok(nv)
}
