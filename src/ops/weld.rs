// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Merge vertices that lie within a distance of each other

use crate::error::GeometryResult;
use crate::geometry::{AttributeRow, AttributeValue, FaceHandle, FaceSnapshot, GeometryData, VertexHandle};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use tracing::debug;

/// Weld all vertices closer than `threshold`.
///
/// Returns the number of vertices removed. A non-positive threshold leaves
/// the mesh untouched.
pub fn weld_vertices(mesh: &mut GeometryData, threshold: f64) -> GeometryResult<usize> {
    if !(threshold > 0.0) {
        return Ok(0);
    }
    let candidates = mesh.vertices();
    weld_candidates(mesh, &candidates, threshold)
}

/// Weld only vertices within `threshold` of one of `targets`
pub fn weld_vertices_near(
    mesh: &mut GeometryData,
    targets: &[Point3<f64>],
    threshold: f64,
) -> GeometryResult<usize> {
    if !(threshold > 0.0) || targets.is_empty() {
        return Ok(0);
    }
    let limit = threshold * threshold;
    let candidates: Vec<VertexHandle> = mesh
        .vertex_iter()
        .filter(|(_, data)| {
            targets
                .iter()
                .any(|t| (data.position - t).norm_squared() <= limit)
        })
        .map(|(v, _)| v)
        .collect();
    weld_candidates(mesh, &candidates, threshold)
}

/// Group candidates greedily: each unassigned vertex seeds a cluster and
/// collects every later unassigned vertex within the threshold of the seed
fn clusters(mesh: &GeometryData, candidates: &[VertexHandle], threshold: f64) -> Vec<Vec<VertexHandle>> {
    let limit = threshold * threshold;
    let positions: Vec<Option<Point3<f64>>> = candidates.iter().map(|&v| mesh.position(v)).collect();
    let mut assigned = vec![false; candidates.len()];
    let mut result = Vec::new();

    for i in 0..candidates.len() {
        let Some(seed) = positions[i] else {
            continue;
        };
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut cluster = vec![candidates[i]];
        for j in (i + 1)..candidates.len() {
            if assigned[j] {
                continue;
            }
            if let Some(p) = positions[j] {
                if (p - seed).norm_squared() <= limit {
                    assigned[j] = true;
                    cluster.push(candidates[j]);
                }
            }
        }
        if cluster.len() > 1 {
            result.push(cluster);
        }
    }
    result
}

/// Drop repeated consecutive corners, including the wrap from last to first
fn collapse_corners(vertices: Vec<VertexHandle>, corners: Vec<AttributeRow>) -> (Vec<VertexHandle>, Vec<AttributeRow>) {
    let mut out_vertices: Vec<VertexHandle> = Vec::with_capacity(vertices.len());
    let mut out_corners = Vec::with_capacity(corners.len());
    for (v, row) in vertices.into_iter().zip(corners) {
        if out_vertices.last() != Some(&v) {
            out_vertices.push(v);
            out_corners.push(row);
        }
    }
    while out_vertices.len() > 1 && out_vertices.first() == out_vertices.last() {
        out_vertices.pop();
        out_corners.pop();
    }
    (out_vertices, out_corners)
}

fn weld_candidates(mesh: &mut GeometryData, candidates: &[VertexHandle], threshold: f64) -> GeometryResult<usize> {
    let groups = clusters(mesh, candidates, threshold);
    if groups.is_empty() {
        return Ok(0);
    }

    let mut remap: AHashMap<VertexHandle, VertexHandle> = AHashMap::new();
    let channels = mesh.vertex_attributes().len();
    for cluster in &groups {
        let survivor = cluster[0];
        let sum = cluster
            .iter()
            .filter_map(|&v| mesh.position(v))
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        let centroid = Point3::from(sum / cluster.len() as f64);

        let table = mesh.vertex_attributes();
        let row: AttributeRow = (0..channels)
            .map(|c| AttributeValue::mean(cluster.iter().filter_map(|v| table.get(c, v.index()))))
            .collect();

        mesh.set_position(survivor, centroid)?;
        mesh.set_vertex_row(survivor, &row);
        for &v in &cluster[1..] {
            remap.insert(v, survivor);
        }
    }
    let resolve = |v: VertexHandle| remap.get(&v).copied().unwrap_or(v);

    // Faces and wire edges touching a merged-away vertex, in cluster order
    let mut affected: Vec<FaceHandle> = Vec::new();
    let mut wires: Vec<(VertexHandle, VertexHandle)> = Vec::new();
    for cluster in &groups {
        for &v in &cluster[1..] {
            for face in mesh.vertex_faces(v) {
                if !affected.contains(&face) {
                    affected.push(face);
                }
            }
            for &edge in mesh.vertex_edges(v) {
                if let Some(data) = mesh.edge(edge) {
                    if data.loops().is_empty() {
                        wires.push((data.vert1, data.vert2));
                    }
                }
            }
        }
    }

    let snapshots: Vec<FaceSnapshot> = affected.iter().filter_map(|&f| mesh.snapshot_face(f)).collect();
    for &face in &affected {
        mesh.remove_face(face)?;
    }
    for &v in remap.keys() {
        if mesh.contains_vertex(v) {
            mesh.remove_vertex(v)?;
        }
    }

    let mut dropped = 0;
    for snapshot in snapshots {
        let vertices = snapshot.vertices.iter().map(|&v| resolve(v)).collect();
        let (vertices, corners) = collapse_corners(vertices, snapshot.corner_rows);
        if vertices.len() < 3 {
            dropped += 1;
            continue;
        }
        if let Err(err) = mesh.add_face_with_attributes(&vertices, Some(&snapshot.face_row), &corners) {
            debug!("Dropping face after weld: {}", err);
            dropped += 1;
        }
    }
    for (a, b) in wires {
        let (a, b) = (resolve(a), resolve(b));
        if a != b {
            mesh.add_edge(a, b)?;
        }
    }

    debug!(
        "Welded {} vertices in {} clusters, dropped {} collapsed faces",
        remap.len(),
        groups.len(),
        dropped
    );
    Ok(remap.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{validate, Attribute};

    /// Two triangles touching along a duplicated edge
    fn split_pair() -> GeometryData {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        GeometryData::from_polygons(&positions, &[vec![0, 1, 2], vec![3, 4, 5]]).unwrap()
    }

    #[test]
    fn test_weld_duplicate_edge() {
        let mut mesh = split_pair();
        let removed = weld_vertices(&mut mesh, 1e-6).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.edge_count(), 5);
        assert_eq!(mesh.face_count(), 2);
        validate(&mesh).unwrap();
    }

    #[test]
    fn test_non_positive_threshold_is_noop() {
        let mut mesh = split_pair();
        assert_eq!(weld_vertices(&mut mesh, 0.0).unwrap(), 0);
        assert_eq!(weld_vertices(&mut mesh, -1.0).unwrap(), 0);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.edge_count(), 6);
    }

    #[test]
    fn test_collapsed_corner_shrinks_face() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.001, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = GeometryData::from_polygons(&positions, &[vec![0, 1, 2, 3]]).unwrap();
        assert_eq!(weld_vertices(&mut mesh, 0.01).unwrap(), 1);
        let face = mesh.faces()[0];
        assert_eq!(mesh.face_vertices(face).len(), 3);
        let p = mesh.position(mesh.face_vertices(face)[1]).unwrap();
        assert!((p - Point3::new(1.0, 0.0005, 0.0)).norm() < 1e-12);
        validate(&mesh).unwrap();
    }

    #[test]
    fn test_triangle_collapsing_to_edge_is_dropped() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.001),
        ];
        let mut mesh = GeometryData::from_polygons(&positions, &[vec![0, 1, 2]]).unwrap();
        assert_eq!(weld_vertices(&mut mesh, 0.01).unwrap(), 1);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.vertex_count(), 2);
        validate(&mesh).unwrap();
    }

    #[test]
    fn test_weld_averages_attributes() {
        let mut mesh = split_pair();
        mesh.add_vertex_attribute(Attribute::float("heat", 1)).unwrap();
        let v = mesh.vertices();
        mesh.set_vertex_attribute(v[1], "heat", AttributeValue::Floats(vec![2.0]))
            .unwrap();
        mesh.set_vertex_attribute(v[3], "heat", AttributeValue::Floats(vec![4.0]))
            .unwrap();

        weld_vertices(&mut mesh, 1e-6).unwrap();
        assert_eq!(
            mesh.vertex_attribute(v[1], "heat"),
            Some(&AttributeValue::Floats(vec![3.0]))
        );
        assert!(!mesh.contains_vertex(v[3]));
    }

    #[test]
    fn test_weld_keeps_wire_edges() {
        let mut mesh = GeometryData::new();
        let a = mesh.add_vertex(Point3::origin());
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let d = mesh.add_vertex(Point3::new(2.0, 0.0, 0.0));
        mesh.add_edge(a, b).unwrap();
        mesh.add_edge(c, d).unwrap();

        assert_eq!(weld_vertices(&mut mesh, 1e-6).unwrap(), 1);
        assert!(mesh.edge_between(a, b).is_some());
        assert!(mesh.edge_between(b, d).is_some());
        assert_eq!(mesh.edge_count(), 2);
    }

    #[test]
    fn test_weld_near_targets_only() {
        let mut mesh = GeometryData::new();
        let a = mesh.add_vertex(Point3::origin());
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0005));
        let c = mesh.add_vertex(Point3::new(5.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(5.0, 0.0, 0.0005));

        let removed = weld_vertices_near(&mut mesh, &[Point3::origin()], 0.01).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.contains_vertex(a));
        assert!(mesh.contains_vertex(c));
    }
}
