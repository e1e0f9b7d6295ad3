// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygonal primitive generators

use super::GeometryData;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Polygonal primitives, all wound counter-clockwise seen from outside
#[derive(Debug, Clone, Copy)]
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Grid { columns: usize, rows: usize, cell: f64 },
    Polygon { sides: usize, radius: f64 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    /// `columns` x `rows` quads in the XY plane, starting at the origin
    pub fn grid(columns: usize, rows: usize, cell: f64) -> Self {
        Self::Grid {
            columns: columns.max(1),
            rows: rows.max(1),
            cell,
        }
    }

    /// Single regular polygon in the XY plane, centered on the origin
    pub fn polygon(sides: usize, radius: f64) -> Self {
        Self::Polygon {
            sides: sides.max(3),
            radius,
        }
    }

    pub fn to_mesh(&self) -> GeometryData {
        match self {
            Self::Cube { size, center } => generate_cube_mesh(*size, *center),
            Self::Grid { columns, rows, cell } => generate_grid_mesh(*columns, *rows, *cell),
            Self::Polygon { sides, radius } => generate_polygon_mesh(*sides, *radius),
        }
    }
}

fn build(positions: &[Point3<f64>], polygons: &[Vec<usize>]) -> GeometryData {
    let mesh = GeometryData::from_polygons(positions, polygons);
    debug_assert!(mesh.is_ok(), "primitive construction failed: {:?}", mesh.as_ref().err());
    mesh.unwrap_or_default()
}

fn generate_cube_mesh(size: Vector3<f64>, center: bool) -> GeometryData {
    let min = if center { -size / 2.0 } else { Vector3::zeros() };
    let max = min + size;

    let positions = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let faces = [
        vec![0, 3, 2, 1], // Bottom (z-)
        vec![4, 5, 6, 7], // Top (z+)
        vec![0, 1, 5, 4], // Front (y-)
        vec![3, 7, 6, 2], // Back (y+)
        vec![0, 4, 7, 3], // Left (x-)
        vec![1, 2, 6, 5], // Right (x+)
    ];

    build(&positions, &faces)
}

fn generate_grid_mesh(columns: usize, rows: usize, cell: f64) -> GeometryData {
    let stride = columns + 1;
    let mut positions = Vec::with_capacity(stride * (rows + 1));
    for j in 0..=rows {
        for i in 0..=columns {
            positions.push(Point3::new(i as f64 * cell, j as f64 * cell, 0.0));
        }
    }

    let mut faces = Vec::with_capacity(columns * rows);
    for j in 0..rows {
        for i in 0..columns {
            let a = j * stride + i;
            faces.push(vec![a, a + 1, a + 1 + stride, a + stride]);
        }
    }

    build(&positions, &faces)
}

fn generate_polygon_mesh(sides: usize, radius: f64) -> GeometryData {
    let positions: Vec<Point3<f64>> = (0..sides)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / sides as f64;
            Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        })
        .collect();
    build(&positions, &[(0..sides).collect()])
}
