// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cut a mesh along a plane
//!
//! Vertices are classified against the plane with a tolerance. Edges whose
//! endpoints lie strictly on opposite sides are split at the crossing, then
//! every face that straddles the plane is cut along a diagonal between two of
//! its on-plane corners. Faces without a clean separating diagonal are kept.

use super::{split_edge, split_face};
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{GeometryData, VertexHandle};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

/// Side of the plane a vertex lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    Negative,
    On,
    Positive,
}

impl PlaneSide {
    pub fn classify(distance: f64, epsilon: f64) -> Self {
        if distance > epsilon {
            Self::Positive
        } else if distance < -epsilon {
            Self::Negative
        } else {
            Self::On
        }
    }

    fn opposes(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Negative, Self::Positive) | (Self::Positive, Self::Negative)
        )
    }
}

/// What a bisection changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BisectStats {
    pub split_edges: usize,
    pub split_faces: usize,
    /// Straddling faces left whole because no diagonal separated them
    pub skipped_faces: usize,
}

/// Signed-distance plane through `origin` with unit `normal`
#[derive(Debug, Clone, Copy)]
struct Plane {
    origin: Point3<f64>,
    normal: Vector3<f64>,
}

impl Plane {
    fn distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.distance(point)
    }
}

/// Side shared by every strict corner of an arc; `None` when mixed or empty
fn arc_side(sides: impl Iterator<Item = PlaneSide>) -> Option<PlaneSide> {
    let mut result = None;
    for side in sides.filter(|&s| s != PlaneSide::On) {
        match result {
            None => result = Some(side),
            Some(existing) if existing != side => return None,
            _ => {}
        }
    }
    result
}

/// On-plane corner pairs whose diagonal leaves only positive corners on one
/// side and only negative corners on the other, widest separation first
pub fn separating_pairs(sides: &[PlaneSide]) -> Vec<(usize, usize)> {
    let n = sides.len();
    let on: Vec<usize> = (0..n).filter(|&i| sides[i] == PlaneSide::On).collect();
    let mut pairs = Vec::new();
    for (a, &i) in on.iter().enumerate() {
        for &j in &on[a + 1..] {
            let gap = j - i;
            if gap == 1 || gap == n - 1 {
                continue;
            }
            let inner = arc_side(sides[i + 1..j].iter().copied());
            let outer = arc_side(sides[j + 1..].iter().chain(&sides[..i]).copied());
            if let (Some(s1), Some(s2)) = (inner, outer) {
                if s1.opposes(s2) {
                    pairs.push(((i, j), gap.min(n - gap)));
                }
            }
        }
    }
    // Stable sort keeps corner order among equally wide pairs
    pairs.sort_by(|a, b| b.1.cmp(&a.1));
    pairs.into_iter().map(|(pair, _)| pair).collect()
}

/// Bisect `mesh` with the plane through `origin` perpendicular to `normal`.
///
/// Vertices within `epsilon` of the plane count as on it; with `snap` they
/// (and the new crossing vertices) are moved exactly onto the plane.
pub fn bisect_plane(
    mesh: &mut GeometryData,
    origin: Point3<f64>,
    normal: Vector3<f64>,
    epsilon: f64,
    snap: bool,
) -> GeometryResult<BisectStats> {
    let normal = normal
        .try_normalize(1e-12)
        .ok_or_else(|| GeometryError::invalid_argument("normal", "plane normal must be non-zero"))?;
    if !(epsilon >= 0.0) {
        return Err(GeometryError::invalid_argument(
            "epsilon",
            format!("{} must be a non-negative number", epsilon),
        ));
    }
    let plane = Plane { origin, normal };
    let mut stats = BisectStats::default();

    let mut sides: AHashMap<VertexHandle, PlaneSide> = AHashMap::new();
    for vertex in mesh.vertices() {
        let Some(position) = mesh.position(vertex) else {
            continue;
        };
        let side = PlaneSide::classify(plane.distance(&position), epsilon);
        if side == PlaneSide::On && snap {
            mesh.set_position(vertex, plane.project(&position))?;
        }
        sides.insert(vertex, side);
    }

    for edge in mesh.edges() {
        let Some(data) = mesh.edge(edge) else {
            continue;
        };
        let (a, b) = (data.vert1, data.vert2);
        let (Some(&side_a), Some(&side_b)) = (sides.get(&a), sides.get(&b)) else {
            continue;
        };
        if !side_a.opposes(side_b) {
            continue;
        }
        let (Some(pa), Some(pb)) = (mesh.position(a), mesh.position(b)) else {
            continue;
        };
        let (da, db) = (plane.distance(&pa), plane.distance(&pb));
        let (vertex, _) = split_edge(mesh, edge, a, da / (da - db))?;
        if snap {
            if let Some(p) = mesh.position(vertex) {
                mesh.set_position(vertex, plane.project(&p))?;
            }
        }
        sides.insert(vertex, PlaneSide::On);
        stats.split_edges += 1;
    }

    for face in mesh.faces() {
        let vertices = mesh.face_vertices(face);
        let face_sides: Vec<PlaneSide> = vertices
            .iter()
            .map(|v| sides.get(v).copied().unwrap_or(PlaneSide::On))
            .collect();
        let has_negative = face_sides.contains(&PlaneSide::Negative);
        let has_positive = face_sides.contains(&PlaneSide::Positive);
        let on_count = face_sides.iter().filter(|&&s| s == PlaneSide::On).count();
        if !(has_negative && has_positive) || on_count < 2 {
            continue;
        }

        let mut split = false;
        for (i, j) in separating_pairs(&face_sides) {
            match split_face(mesh, face, vertices[i], vertices[j]) {
                Ok(_) => {
                    split = true;
                    break;
                }
                Err(err) => debug!("Bisect split of face {:?} at ({}, {}) failed: {}", face, i, j, err),
            }
        }
        if split {
            stats.split_faces += 1;
        } else {
            stats.skipped_faces += 1;
            warn!("Face {:?} straddles the bisect plane but has no separating diagonal", face);
        }
    }

    debug!(
        "Bisected mesh: {} edges split, {} faces split, {} faces skipped",
        stats.split_edges, stats.split_faces, stats.skipped_faces
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{validate, Primitive};
    use PlaneSide::*;

    #[test]
    fn test_classify() {
        assert_eq!(PlaneSide::classify(0.5, 0.1), Positive);
        assert_eq!(PlaneSide::classify(-0.5, 0.1), Negative);
        assert_eq!(PlaneSide::classify(0.05, 0.1), On);
        assert_eq!(PlaneSide::classify(-0.1, 0.1), On);
    }

    #[test]
    fn test_separating_pairs_simple() {
        // Pentagon from a cut triangle: P, on, N, N, on
        let sides = [Positive, On, Negative, Negative, On];
        assert_eq!(separating_pairs(&sides), vec![(1, 4)]);
    }

    #[test]
    fn test_separating_pairs_rejects_mixed_arcs() {
        let sides = [Negative, On, Positive, On, Negative, On, Positive, On];
        assert!(separating_pairs(&sides).is_empty());

        // Adjacent on-plane corners never form a diagonal
        let sides = [Positive, On, On, Negative];
        assert!(separating_pairs(&sides).is_empty());
    }

    #[test]
    fn test_separating_pairs_prefers_widest() {
        // Both (1, 4) and (1, 5) separate; (1, 4) splits the hexagon in half
        let sides = [Positive, On, Negative, Negative, On, On];
        assert_eq!(separating_pairs(&sides), vec![(1, 4), (1, 5)]);
    }

    #[test]
    fn test_zero_normal_is_rejected() {
        let mut mesh = Primitive::polygon(3, 1.0).to_mesh();
        assert!(bisect_plane(&mut mesh, Point3::origin(), Vector3::zeros(), 1e-6, true).is_err());
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_plane_missing_mesh_is_noop() {
        let mut mesh = Primitive::grid(2, 2, 1.0).to_mesh();
        let stats =
            bisect_plane(&mut mesh, Point3::new(0.0, 0.0, 5.0), Vector3::z(), 1e-6, true).unwrap();
        assert_eq!(stats, BisectStats::default());
        assert_eq!(mesh.face_count(), 4);
    }

    #[test]
    fn test_bisect_along_existing_edges() {
        // Plane x = 1 runs along the shared column of a 2x1 grid
        let mut mesh = Primitive::grid(2, 1, 1.0).to_mesh();
        let stats =
            bisect_plane(&mut mesh, Point3::new(1.0, 0.0, 0.0), Vector3::x(), 1e-6, true).unwrap();
        assert_eq!(stats.split_edges, 0);
        assert_eq!(stats.split_faces, 0);
        assert_eq!(mesh.face_count(), 2);
        validate(&mesh).unwrap();
    }
}
