// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end editing tests on small meshes

use anyhow::Result;
use approx::assert_relative_eq;
use loopmesh::geometry::{validate, validate_mesh, Attribute, AttributeValue, GeometryData, Primitive};
use loopmesh::ops::{self, ExtrudeMode, InsetMode, PlaneSide};
use loopmesh::GeometryError;
use nalgebra::{Point3, Vector3};

fn triangle() -> Result<GeometryData> {
    let positions = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
    ];
    Ok(GeometryData::from_polygons(&positions, &[vec![0, 1, 2]])?)
}

/// Two unit quads side by side that share positions but no vertices
fn split_quads() -> Result<GeometryData> {
    let positions = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ];
    Ok(GeometryData::from_polygons(&positions, &[vec![0, 1, 2, 3], vec![4, 5, 6, 7]])?)
}

fn assert_single_sided(mesh: &GeometryData, origin: Point3<f64>, normal: Vector3<f64>) {
    let normal = normal.normalize();
    for face in mesh.faces() {
        let sides: Vec<PlaneSide> = mesh
            .face_positions(face)
            .iter()
            .map(|p| PlaneSide::classify((p - origin).dot(&normal), 1e-6))
            .collect();
        let positive = sides.contains(&PlaneSide::Positive);
        let negative = sides.contains(&PlaneSide::Negative);
        assert!(!(positive && negative), "face straddles the plane: {:?}", sides);
    }
}

#[test]
fn test_subdivided_cube_counts() -> Result<()> {
    let mut mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
    let (v, e, f) = (mesh.vertex_count(), mesh.edge_count(), mesh.face_count());

    ops::subdivide(&mut mesh)?;

    assert_eq!(mesh.vertex_count(), v + e + f);
    assert_eq!(mesh.face_count(), 24);
    assert!(mesh.faces().into_iter().all(|face| mesh.face_loops(face).len() == 4));
    validate(&mesh)?;
    let report = validate_mesh(&mesh);
    assert!(report.is_closed);
    assert!(report.has_consistent_winding);
    Ok(())
}

#[test]
fn test_subdivided_open_mixed_mesh_counts() -> Result<()> {
    let positions = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(2.0, 0.5, 0.0),
    ];
    let mut mesh = GeometryData::from_polygons(&positions, &[vec![0, 1, 2, 3], vec![1, 4, 2]])?;
    let (v, e, f) = (mesh.vertex_count(), mesh.edge_count(), mesh.face_count());
    assert_eq!((v, e, f), (5, 6, 2));
    let corners: usize = mesh.faces().into_iter().map(|face| mesh.face_loops(face).len()).sum();

    ops::subdivide(&mut mesh)?;

    assert_eq!(mesh.vertex_count(), v + e + f);
    assert_eq!(mesh.face_count(), corners);
    assert_eq!(mesh.edge_count(), 2 * e + corners);
    assert!(mesh.faces().into_iter().all(|face| mesh.face_loops(face).len() == 4));
    validate(&mesh)?;
    let report = validate_mesh(&mesh);
    assert!(!report.is_closed);
    assert_eq!(report.boundary_edge_count, 10);
    Ok(())
}

#[test]
fn test_bisect_triangle() -> Result<()> {
    let mut mesh = triangle()?;
    let origin = Point3::new(0.5, 0.0, 0.0);
    let normal = Vector3::new(1.0, 0.0, 0.0);

    let stats = ops::bisect_plane(&mut mesh, origin, normal, 1e-5, true)?;

    assert_eq!(stats.split_edges, 2);
    assert_eq!(stats.split_faces, 1);
    assert_eq!(mesh.vertex_count(), 5);
    assert_eq!(mesh.face_count(), 2);
    assert_single_sided(&mesh, origin, normal);
    validate(&mesh)?;
    Ok(())
}

#[test]
fn test_bisect_cube_through_middle() -> Result<()> {
    let mut mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
    let origin = Point3::origin();
    let normal = Vector3::new(0.0, 1.0, 0.0);

    let stats = ops::bisect_plane(&mut mesh, origin, normal, 1e-5, true)?;

    assert_eq!(stats.split_edges, 4);
    assert_eq!(stats.split_faces, 4);
    assert_eq!(stats.skipped_faces, 0);
    assert_eq!(mesh.vertex_count(), 12);
    assert_eq!(mesh.edge_count(), 20);
    assert_eq!(mesh.face_count(), 10);
    assert_single_sided(&mesh, origin, normal);

    let on_plane = mesh
        .vertex_iter()
        .filter(|(_, data)| data.position.y.abs() < 1e-12)
        .count();
    assert_eq!(on_plane, 4);

    let report = validate_mesh(&mesh);
    assert!(report.is_closed);
    assert!(report.has_consistent_winding);
    Ok(())
}

#[test]
fn test_weld_reports_removed_vertices() -> Result<()> {
    let mut mesh = split_quads()?;

    assert_eq!(ops::weld_vertices(&mut mesh, 0.0)?, 0);
    assert_eq!(ops::weld_vertices(&mut mesh, -1.0)?, 0);
    assert_eq!(mesh.vertex_count(), 8);

    let before = mesh.vertex_count();
    let removed = ops::weld_vertices(&mut mesh, 1e-3)?;
    assert_eq!(removed, before - mesh.vertex_count());
    assert_eq!(removed, 2);
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.edge_count(), 7);
    validate(&mesh)?;
    Ok(())
}

#[test]
fn test_weld_drops_face_folded_onto_itself() -> Result<()> {
    // Opposite corners of the quad are close enough to weld
    let positions = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 1e-4),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let mut mesh = GeometryData::from_polygons(&positions, &[vec![0, 1, 2, 3]])?;

    let removed = ops::weld_vertices(&mut mesh, 0.01)?;

    assert_eq!(removed, 1);
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.face_count(), 0);
    assert_eq!(mesh.edge_count(), 2);
    assert_eq!(mesh.loop_count(), 0);
    validate(&mesh)?;
    Ok(())
}

#[test]
fn test_weld_near_leaves_distant_duplicates() -> Result<()> {
    let mut mesh = split_quads()?;

    let removed = ops::weld_vertices_near(&mut mesh, &[Point3::new(1.0, 0.0, 0.0)], 0.01)?;

    assert_eq!(removed, 1);
    assert_eq!(mesh.vertex_count(), 7);
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.edge_count(), 8);
    let at = |x: f64, y: f64| {
        mesh.vertex_iter()
            .filter(|(_, data)| (data.position - Point3::new(x, y, 0.0)).norm() < 1e-9)
            .count()
    };
    assert_eq!(at(1.0, 0.0), 1);
    assert_eq!(at(1.0, 1.0), 2);
    validate(&mesh)?;

    assert_eq!(ops::weld_vertices_near(&mut mesh, &[Point3::new(5.0, 5.0, 0.0)], 0.01)?, 0);
    assert_eq!(ops::weld_vertices_near(&mut mesh, &[], 0.01)?, 0);
    assert_eq!(mesh.vertex_count(), 7);
    Ok(())
}

#[test]
fn test_merge_then_weld() -> Result<()> {
    let mut target = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
    let source = Primitive::grid(2, 2, 1.0).to_mesh();

    ops::merge(&mut target, &source)?;
    assert_eq!(target.vertex_count(), 17);
    assert_eq!(target.edge_count(), 24);
    assert_eq!(target.face_count(), 10);

    let mut quads = GeometryData::new();
    let halves = split_quads()?;
    ops::merge(&mut quads, &halves)?;
    assert_eq!(ops::weld_vertices(&mut quads, 1e-6)?, 2);
    validate(&target)?;
    validate(&quads)?;
    Ok(())
}

#[test]
fn test_merge_rejects_conflicting_attributes() -> Result<()> {
    let mut target = triangle()?;
    target.add_vertex_attribute(Attribute::float("heat", 1))?;
    let mut source = triangle()?;
    source.add_vertex_attribute(Attribute::int("heat", 1))?;

    let result = ops::merge(&mut target, &source);
    assert!(matches!(result, Err(GeometryError::AttributeMismatch { .. })));
    assert_eq!(target.vertex_count(), 3);
    Ok(())
}

#[test]
fn test_bevel_rejects_offset_and_keeps_mesh() -> Result<()> {
    let mut mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
    let corner = mesh.vertices()[0];

    for offset in [0.0, 1.0, 1.5, -0.2, f64::NAN] {
        let result = ops::bevel_vertices(&mut mesh, &[corner], offset);
        assert!(matches!(result, Err(GeometryError::InvalidArgument { .. })));
    }
    assert_eq!(mesh.vertex_count(), 8);
    assert_eq!(mesh.edge_count(), 12);
    assert_eq!(mesh.face_count(), 6);

    ops::bevel_vertices(&mut mesh, &[corner], 0.25)?;
    assert_eq!(mesh.vertex_count(), 10);
    assert_eq!(mesh.face_count(), 7);
    assert!(validate_mesh(&mesh).is_closed);
    Ok(())
}

#[test]
fn test_average_normal_extrude_is_rigid() -> Result<()> {
    let mut mesh = Primitive::grid(2, 2, 1.0).to_mesh();
    let faces = mesh.faces();
    let before: Vec<Vec<Point3<f64>>> = faces.iter().map(|&f| mesh.face_positions(f)).collect();

    let tops = ops::extrude_faces(&mut mesh, &faces, 0.75, ExtrudeMode::AverageNormal)?;

    assert_eq!(tops.len(), 4);
    assert_eq!(mesh.face_count(), 12);
    for (top, original) in tops.iter().zip(&before) {
        for (p, q) in mesh.face_positions(*top).iter().zip(original) {
            let moved = p - q;
            assert_relative_eq!(moved.x, 0.0, epsilon = 1e-12);
            assert_relative_eq!(moved.y, 0.0, epsilon = 1e-12);
            assert_relative_eq!(moved.z, 0.75, epsilon = 1e-12);
        }
    }
    validate(&mesh)?;
    Ok(())
}

#[test]
fn test_extrude_cube_face_stays_closed() -> Result<()> {
    let mut mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
    let top = mesh
        .faces()
        .into_iter()
        .find(|&f| mesh.face_normal(f).map_or(false, |n| n.z > 0.9))
        .ok_or_else(|| anyhow::anyhow!("cube has no top face"))?;

    let tops = ops::extrude_faces(&mut mesh, &[top], 1.5, ExtrudeMode::PerFace)?;

    assert_eq!(tops.len(), 1);
    assert_eq!(mesh.face_count(), 10);
    for p in mesh.face_positions(tops[0]) {
        assert_relative_eq!(p.z, 2.5, epsilon = 1e-12);
    }
    let report = validate_mesh(&mesh);
    assert!(report.is_closed);
    assert!(report.has_consistent_winding);
    Ok(())
}

#[test]
fn test_inset_modes() -> Result<()> {
    let mut single = Primitive::polygon(4, 1.0).to_mesh();
    let faces = single.faces();
    ops::inset_faces(&mut single, &faces, 0.5, InsetMode::PerFace)?;
    assert_eq!(single.face_count(), 5);
    assert_eq!(single.vertex_count(), 8);
    assert_eq!(single.edge_count(), 12);

    let mut strip = Primitive::grid(2, 1, 1.0).to_mesh();
    let faces = strip.faces();
    ops::inset_faces(&mut strip, &faces, 0.5, InsetMode::Shared)?;
    assert_eq!(strip.face_count(), 8);
    validate(&strip)?;
    Ok(())
}

fn position_count(mesh: &GeometryData, target: Point3<f64>) -> usize {
    mesh.vertex_iter()
        .filter(|(_, data)| (data.position - target).norm() < 1e-9)
        .count()
}

#[test]
fn test_shared_inset_on_grid_keeps_junction() -> Result<()> {
    let mut mesh = Primitive::grid(2, 2, 1.0).to_mesh();
    let faces = mesh.faces();

    let inner = ops::inset_faces(&mut mesh, &faces, 0.5, InsetMode::Shared)?;

    assert_eq!(inner.len(), 4);
    assert_eq!(mesh.vertex_count(), 17);
    assert_eq!(mesh.edge_count(), 28);
    assert_eq!(mesh.face_count(), 12);

    // The center junction is replaced by a copy in the same place
    assert_eq!(position_count(&mesh, Point3::new(1.0, 1.0, 0.0)), 1);
    let center_copy_shared = inner
        .iter()
        .all(|&f| mesh.face_positions(f).iter().any(|p| (p - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-9));
    assert!(center_copy_shared);

    // Seam vertices on the border move halfway toward the center
    for target in [
        Point3::new(1.0, 0.25, 0.0),
        Point3::new(0.25, 1.0, 0.0),
        Point3::new(1.75, 1.0, 0.0),
        Point3::new(1.0, 1.75, 0.0),
    ] {
        assert_eq!(position_count(&mesh, target), 1, "no vertex at {:?}", target);
    }
    // Outer corners move toward their single face center
    assert_eq!(position_count(&mesh, Point3::new(0.25, 0.25, 0.0)), 1);
    validate(&mesh)?;
    assert!(validate_mesh(&mesh).has_consistent_winding);
    Ok(())
}

#[test]
fn test_shared_inset_two_seams_meet_midway() -> Result<()> {
    let mut mesh = Primitive::grid(2, 2, 1.0).to_mesh();
    // L-shaped selection: the center vertex lies on exactly two inner seams
    let faces = mesh.faces();
    let selection = [faces[0], faces[1], faces[2]];

    let inner = ops::inset_faces(&mut mesh, &selection, 0.5, InsetMode::Shared)?;

    assert_eq!(inner.len(), 3);
    // Seam neighbors (1,0) and (0,1) average to (0.5,0.5); halfway there
    assert_eq!(position_count(&mesh, Point3::new(0.75, 0.75, 0.0)), 1);
    assert_eq!(position_count(&mesh, Point3::new(1.0, 1.0, 0.0)), 1);
    validate(&mesh)?;
    Ok(())
}

#[test]
fn test_split_edge_blends_attributes() -> Result<()> {
    let mut mesh = triangle()?;
    mesh.add_vertex_attribute(Attribute::float("heat", 1))?;
    let vertices = mesh.vertices();
    mesh.set_vertex_attribute(vertices[0], "heat", AttributeValue::Floats(vec![0.0]))?;
    mesh.set_vertex_attribute(vertices[1], "heat", AttributeValue::Floats(vec![8.0]))?;
    let edge = mesh
        .edge_between(vertices[0], vertices[1])
        .ok_or_else(|| anyhow::anyhow!("missing edge"))?;

    let (vertex, _) = ops::split_edge(&mut mesh, edge, vertices[0], 0.25)?;

    let position = mesh.position(vertex).ok_or_else(|| anyhow::anyhow!("stale vertex"))?;
    assert_relative_eq!(position.x, 0.5);
    assert_eq!(
        mesh.vertex_attribute(vertex, "heat"),
        Some(&AttributeValue::Floats(vec![2.0]))
    );
    assert_eq!(mesh.face_loops(mesh.faces()[0]).len(), 4);
    validate(&mesh)?;
    Ok(())
}

#[test]
fn test_squarify_converges_on_rectangle() -> Result<()> {
    let positions = [
        Point3::new(-2.0, -1.0, 0.0),
        Point3::new(2.0, -1.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(-2.0, 1.0, 0.0),
    ];
    let mut mesh = GeometryData::from_polygons(&positions, &[vec![0, 1, 2, 3]])?;
    for _ in 0..20 {
        ops::squarify(&mut mesh, 0.5, false)?;
    }
    let corners = mesh.face_positions(mesh.faces()[0]);
    let side = |i: usize| (corners[(i + 1) % 4] - corners[i]).norm();
    assert_relative_eq!(side(0), side(1), epsilon = 1e-4);
    assert_relative_eq!(side(1), side(2), epsilon = 1e-4);
    Ok(())
}
