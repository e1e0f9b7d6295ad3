// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Relax quads toward squares

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{GeometryData, VertexHandle};
use ahash::AHashMap;
use nalgebra::{Point3, Vector2, Vector3};
use tracing::debug;

/// Float×3 vertex attribute holding the position a vertex is pulled back to
pub const REST_POSITION_ATTRIBUTE: &str = "restpos";

/// Float×1 vertex attribute scaling the pull toward the rest position
pub const REST_WEIGHT_ATTRIBUTE: &str = "weight";

/// Quarter turn counter-clockwise in the face plane
fn rotate(v: Vector2<f64>, quarter_turns: usize) -> Vector2<f64> {
    (0..quarter_turns % 4).fold(v, |v, _| Vector2::new(-v.y, v.x))
}

/// A quad in its own plane
struct QuadFrame {
    vertices: [VertexHandle; 4],
    center: Point3<f64>,
    u: Vector3<f64>,
    w: Vector3<f64>,
    local: [Vector2<f64>; 4],
}

impl QuadFrame {
    fn new(vertices: [VertexHandle; 4], positions: [Point3<f64>; 4]) -> Option<Self> {
        let center = Point3::from(positions.iter().map(|p| p.coords).sum::<Vector3<f64>>() / 4.0);
        let r = positions.map(|p| p - center);
        let normal = (0..4)
            .map(|i| r[i].cross(&r[(i + 1) % 4]))
            .sum::<Vector3<f64>>()
            .try_normalize(1e-12)?;
        let u = (r[0] - normal * r[0].dot(&normal)).try_normalize(1e-12)?;
        let w = normal.cross(&u);
        let local = r.map(|ri| Vector2::new(ri.dot(&u), ri.dot(&w)));
        Some(Self {
            vertices,
            center,
            u,
            w,
            local,
        })
    }

    fn average_radius(&self) -> f64 {
        self.local.iter().map(|l| l.norm()).sum::<f64>() / 4.0
    }

    /// Corner targets of the square closest to this quad, optionally scaled
    /// to `radius`
    fn targets(&self, radius: Option<f64>) -> [Point3<f64>; 4] {
        let mut a = (0..4)
            .map(|i| rotate(self.local[i], 4 - i))
            .sum::<Vector2<f64>>()
            / 4.0;
        if let Some(radius) = radius {
            if let Some(unit) = a.try_normalize(1e-12) {
                a = unit * radius;
            }
        }
        [0, 1, 2, 3].map(|i| {
            let t = rotate(a, i);
            self.center + self.u * t.x + self.w * t.y
        })
    }
}

/// Run one relaxation pass over every quad.
///
/// Each quad proposes the square sharing its center and orientation; vertices
/// move by `rate` times the weighted average of their proposals. Vertices with
/// a `restpos` attribute are also pulled toward it with their `weight`
/// (default 1). With `uniform_length` every square gets the mesh-wide average
/// corner radius. Faces that are not quads are ignored.
pub fn squarify(mesh: &mut GeometryData, rate: f64, uniform_length: bool) -> GeometryResult<()> {
    if !rate.is_finite() {
        return Err(GeometryError::invalid_argument(
            "rate",
            format!("{} is not a finite number", rate),
        ));
    }
    if rate == 0.0 {
        return Ok(());
    }

    let mut frames = Vec::new();
    for face in mesh.faces() {
        let vertices = mesh.face_vertices(face);
        let Ok(vertices) = <[VertexHandle; 4]>::try_from(vertices) else {
            continue;
        };
        let Some(positions) = vertices
            .iter()
            .map(|&v| mesh.position(v))
            .collect::<Option<Vec<_>>>()
            .and_then(|p| <[Point3<f64>; 4]>::try_from(p).ok())
        else {
            continue;
        };
        if let Some(frame) = QuadFrame::new(vertices, positions) {
            frames.push(frame);
        }
    }

    let radius = if uniform_length && !frames.is_empty() {
        Some(frames.iter().map(QuadFrame::average_radius).sum::<f64>() / frames.len() as f64)
    } else {
        None
    };

    let mut accumulated: AHashMap<VertexHandle, (Vector3<f64>, f64)> = AHashMap::new();
    for frame in &frames {
        for (&v, target) in frame.vertices.iter().zip(frame.targets(radius)) {
            let Some(p) = mesh.position(v) else {
                continue;
            };
            let entry = accumulated.entry(v).or_insert((Vector3::zeros(), 0.0));
            entry.0 += target - p;
            entry.1 += 1.0;
        }
    }

    if mesh.vertex_attributes().position(REST_POSITION_ATTRIBUTE).is_some() {
        for v in mesh.vertices() {
            let Some(rest) = mesh
                .vertex_attribute(v, REST_POSITION_ATTRIBUTE)
                .and_then(|a| a.as_floats())
                .filter(|f| f.len() == 3)
                .map(|f| Point3::new(f[0], f[1], f[2]))
            else {
                continue;
            };
            let weight = mesh
                .vertex_attribute(v, REST_WEIGHT_ATTRIBUTE)
                .and_then(|a| a.as_floats())
                .and_then(|f| f.first().copied())
                .unwrap_or(1.0);
            let Some(p) = mesh.position(v) else {
                continue;
            };
            let entry = accumulated.entry(v).or_insert((Vector3::zeros(), 0.0));
            entry.0 += (rest - p) * weight;
            entry.1 += weight;
        }
    }

    let mut moved = 0;
    for (v, (delta, total)) in accumulated {
        if total <= 0.0 {
            continue;
        }
        if let Some(p) = mesh.position(v) {
            mesh.set_position(v, p + delta * (rate / total))?;
            moved += 1;
        }
    }

    debug!("Squarify pass over {} quads moved {} vertices", frames.len(), moved);
    Ok(())
}
