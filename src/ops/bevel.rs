// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Replace vertices by small polygons cut across their incident edges

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::operators::{attribute_lerp, lerp_point, newell_normal};
use crate::geometry::{AttributeRow, EdgeHandle, FaceHandle, FaceSnapshot, GeometryData, VertexHandle};
use ahash::{AHashMap, AHashSet};
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

/// Incident edges of `vertex` in fan order.
///
/// Every face at the vertex links its incoming edge to its outgoing edge. The
/// walk starts at an edge nothing links into (an open fan) or at the first
/// edge, and edges the walk never reaches are appended in storage order.
fn order_edges(mesh: &GeometryData, vertex: VertexHandle) -> Vec<EdgeHandle> {
    let edges = mesh.vertex_edges(vertex).to_vec();
    let mut links: AHashMap<EdgeHandle, EdgeHandle> = AHashMap::new();
    for face in mesh.vertex_faces(vertex) {
        let Some(snapshot) = mesh.snapshot_face(face) else {
            continue;
        };
        if let Some(i) = snapshot.corner_of(vertex) {
            links.insert(snapshot.edges[snapshot.prev(i)], snapshot.edges[i]);
        }
    }

    let targets: AHashSet<EdgeHandle> = links.values().copied().collect();
    let start = edges
        .iter()
        .copied()
        .find(|e| links.contains_key(e) && !targets.contains(e))
        .or_else(|| edges.first().copied());

    let mut ordered = Vec::with_capacity(edges.len());
    let mut current = start;
    while let Some(edge) = current {
        if ordered.contains(&edge) {
            break;
        }
        ordered.push(edge);
        current = links.get(&edge).copied();
    }
    for edge in edges {
        if !ordered.contains(&edge) {
            ordered.push(edge);
        }
    }
    ordered
}

/// Bevel `vertices` by `offset`, a fraction of each incident edge in (0, 1).
///
/// Vertices with fewer than two edges or no face are skipped. An edge between
/// two beveled vertices gets one new vertex near each end.
pub fn bevel_vertices(mesh: &mut GeometryData, vertices: &[VertexHandle], offset: f64) -> GeometryResult<()> {
    if !(offset > 0.0 && offset < 1.0) {
        return Err(GeometryError::invalid_argument(
            "offset",
            format!("{} is outside (0, 1)", offset),
        ));
    }

    let mut targets: Vec<VertexHandle> = Vec::new();
    for &v in vertices {
        if targets.contains(&v) || !mesh.contains_vertex(v) {
            continue;
        }
        if mesh.vertex_edges(v).len() >= 2 && !mesh.vertex_faces(v).is_empty() {
            targets.push(v);
        }
    }
    if targets.is_empty() {
        return Ok(());
    }

    // New vertex for each (beveled vertex, far endpoint) pair, and the ring
    // they form around each beveled vertex
    let mut splits: AHashMap<(VertexHandle, VertexHandle), VertexHandle> = AHashMap::new();
    let mut rings: Vec<(VertexHandle, Vec<VertexHandle>, Vector3<f64>)> = Vec::with_capacity(targets.len());
    for &v in &targets {
        let p = mesh.position(v).ok_or_else(|| GeometryError::stale("vertex", v))?;
        let mut ring = Vec::new();
        for edge in order_edges(mesh, v) {
            let Some(far) = mesh.edge(edge).and_then(|e| e.other(v)) else {
                continue;
            };
            let Some(q) = mesh.position(far) else {
                continue;
            };
            let nv = mesh.add_vertex(lerp_point(&p, &q, offset));
            attribute_lerp(mesh, nv, v, far, offset);
            splits.insert((v, far), nv);
            ring.push(nv);
        }
        let reference = mesh
            .vertex_faces(v)
            .into_iter()
            .filter_map(|f| mesh.face_normal(f))
            .sum::<Vector3<f64>>();
        rings.push((v, ring, reference));
    }

    let mut affected: Vec<FaceHandle> = Vec::new();
    for &v in &targets {
        for face in mesh.vertex_faces(v) {
            if !affected.contains(&face) {
                affected.push(face);
            }
        }
    }
    let snapshots: Vec<FaceSnapshot> = affected.iter().filter_map(|&f| mesh.snapshot_face(f)).collect();

    for &v in &targets {
        for edge in mesh.vertex_edges(v).to_vec() {
            if mesh.contains_edge(edge) {
                mesh.remove_edge(edge)?;
            }
        }
    }

    let target_set: AHashSet<VertexHandle> = targets.iter().copied().collect();
    let mut cap_corners: AHashMap<VertexHandle, AttributeRow> = AHashMap::new();
    let mut cap_faces: AHashMap<VertexHandle, AttributeRow> = AHashMap::new();
    let mut dropped = 0;
    'faces: for snapshot in &snapshots {
        let mut face_vertices = Vec::with_capacity(snapshot.len() + targets.len());
        let mut corners = Vec::with_capacity(snapshot.len() + targets.len());
        for i in 0..snapshot.len() {
            let v = snapshot.vertices[i];
            if !target_set.contains(&v) {
                face_vertices.push(v);
                corners.push(snapshot.corner_rows[i].clone());
                continue;
            }
            let (prev, next) = (snapshot.prev(i), snapshot.next(i));
            let (Some(&a), Some(&b)) = (
                splits.get(&(v, snapshot.vertices[prev])),
                splits.get(&(v, snapshot.vertices[next])),
            ) else {
                dropped += 1;
                continue 'faces;
            };
            for (nv, j) in [(a, prev), (b, next)] {
                let row = snapshot.lerp_corner(i, j, offset);
                cap_corners.entry(nv).or_insert_with(|| row.clone());
                face_vertices.push(nv);
                corners.push(row);
            }
            cap_faces.entry(v).or_insert_with(|| snapshot.face_row.clone());
        }
        if let Err(err) = mesh.add_face_with_attributes(&face_vertices, Some(&snapshot.face_row), &corners) {
            warn!("Dropping face that could not be rebuilt after bevel: {}", err);
            dropped += 1;
        }
    }

    let mut caps = 0;
    for (v, mut ring, reference) in rings {
        if ring.len() >= 3 {
            let points: Vec<Point3<f64>> = ring.iter().filter_map(|&r| mesh.position(r)).collect();
            if newell_normal(&points).dot(&reference) < 0.0 {
                ring.reverse();
            }
            let corners: Vec<AttributeRow> = ring
                .iter()
                .map(|r| cap_corners.get(r).cloned().unwrap_or_default())
                .collect();
            match mesh.add_face_with_attributes(&ring, cap_faces.get(&v), &corners) {
                Ok(_) => caps += 1,
                Err(err) => warn!("Skipping bevel cap: {}", err),
            }
        }
        mesh.remove_vertex(v)?;
    }

    debug!(
        "Beveled {} vertices: {} caps, {} faces rebuilt, {} dropped",
        targets.len(),
        caps,
        snapshots.len() - dropped,
        dropped
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{validate, validate_mesh, Attribute, AttributeValue, Primitive};

    fn cube() -> GeometryData {
        Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh()
    }

    #[test]
    fn test_bevel_single_cube_corner() {
        let mut mesh = cube();
        let corner = mesh.vertices()[6];
        bevel_vertices(&mut mesh, &[corner], 0.25).unwrap();

        assert_eq!(mesh.vertex_count(), 10);
        assert_eq!(mesh.edge_count(), 15);
        assert_eq!(mesh.face_count(), 7);
        assert!(!mesh.contains_vertex(corner));

        let report = validate_mesh(&mesh);
        assert!(report.is_closed);
        assert!(report.has_consistent_winding);
        validate(&mesh).unwrap();

        let triangle = mesh
            .faces()
            .into_iter()
            .find(|&f| mesh.face_vertices(f).len() == 3)
            .unwrap();
        let normal = mesh.face_normal(triangle).unwrap();
        assert!(normal.dot(&Vector3::new(1.0, 1.0, 1.0)) > 0.0);
    }

    #[test]
    fn test_bevel_all_cube_corners() {
        let mut mesh = cube();
        let all = mesh.vertices();
        bevel_vertices(&mut mesh, &all, 0.25).unwrap();

        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.edge_count(), 36);
        assert_eq!(mesh.face_count(), 14);
        let report = validate_mesh(&mesh);
        assert!(report.is_closed);
        assert!(report.has_consistent_winding);
    }

    #[test]
    fn test_open_corner_gets_no_cap() {
        let mut mesh = Primitive::grid(1, 1, 1.0).to_mesh();
        let corner = mesh.vertices()[0];
        bevel_vertices(&mut mesh, &[corner], 0.5).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(mesh.edge_count(), 5);
        let face = mesh.faces()[0];
        assert!(mesh.face_positions(face).contains(&Point3::new(0.5, 0.0, 0.0)));
        validate(&mesh).unwrap();
    }

    #[test]
    fn test_invalid_offset_leaves_mesh_alone() {
        let mut mesh = cube();
        let corner = mesh.vertices()[0];
        for offset in [0.0, 1.0, -0.5, 2.0, f64::NAN] {
            assert!(matches!(
                bevel_vertices(&mut mesh, &[corner], offset),
                Err(GeometryError::InvalidArgument { .. })
            ));
        }
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 6);
    }

    #[test]
    fn test_new_vertices_interpolate_attributes() {
        let mut mesh = Primitive::polygon(3, 1.0).to_mesh();
        mesh.add_vertex_attribute(Attribute::float("heat", 1)).unwrap();
        let v = mesh.vertices();
        for (i, &h) in v.iter().enumerate() {
            mesh.set_vertex_attribute(h, "heat", AttributeValue::Floats(vec![i as f64 * 8.0]))
                .unwrap();
        }
        bevel_vertices(&mut mesh, &[v[0]], 0.25).unwrap();

        let mut heats: Vec<f64> = mesh
            .vertices()
            .into_iter()
            .filter(|h| !v.contains(h))
            .filter_map(|h| mesh.vertex_attribute(h, "heat").and_then(|a| a.as_floats()).map(|f| f[0]))
            .collect();
        heats.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(heats, vec![2.0, 4.0]);
    }
}
