// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon mesh store with per-face loops
//!
//! [`GeometryData`] owns vertices, edges, faces and face corners ("loops") in
//! generation-checked arenas, plus one attribute table per element class.
//! Edges are unique per unordered vertex pair. Each face stores its loops in
//! cyclic order; the loop at position `i` references corner vertex `i` and the
//! edge from that vertex to corner `i + 1`.

use super::attribute::{lerp_rows, Attribute, AttributeRow, AttributeTable, AttributeValue};
use super::handle::{Arena, Handle};
use super::operators::canonical_edge;
use crate::error::{GeometryError, GeometryResult};
use ahash::AHashMap;
use nalgebra::{Matrix4, Point3, Vector3};

pub type VertexHandle = Handle<VertexData>;
pub type EdgeHandle = Handle<EdgeData>;
pub type FaceHandle = Handle<FaceData>;
pub type LoopHandle = Handle<LoopData>;

/// Vertex position and incident edges
#[derive(Debug, Clone)]
pub struct VertexData {
    pub position: Point3<f64>,
    edges: Vec<EdgeHandle>,
}

impl VertexData {
    pub fn edges(&self) -> &[EdgeHandle] {
        &self.edges
    }
}

/// Undirected edge; endpoints never change after creation
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub vert1: VertexHandle,
    pub vert2: VertexHandle,
    loops: Vec<LoopHandle>,
}

impl EdgeData {
    pub fn contains(&self, vertex: VertexHandle) -> bool {
        self.vert1 == vertex || self.vert2 == vertex
    }

    /// The endpoint opposite to `vertex`
    pub fn other(&self, vertex: VertexHandle) -> Option<VertexHandle> {
        if self.vert1 == vertex {
            Some(self.vert2)
        } else if self.vert2 == vertex {
            Some(self.vert1)
        } else {
            None
        }
    }

    /// Face corners whose outgoing edge is this edge
    pub fn loops(&self) -> &[LoopHandle] {
        &self.loops
    }
}

/// One face corner
#[derive(Debug, Clone, Copy)]
pub struct LoopData {
    pub vertex: VertexHandle,
    /// Edge from `vertex` to the next corner's vertex
    pub edge: EdgeHandle,
    pub face: FaceHandle,
}

/// Face with its corners in cyclic order
#[derive(Debug, Clone, Default)]
pub struct FaceData {
    loops: Vec<LoopHandle>,
}

impl FaceData {
    pub fn loops(&self) -> &[LoopHandle] {
        &self.loops
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

/// Everything needed to rebuild a face after it was removed
#[derive(Debug, Clone)]
pub struct FaceSnapshot {
    pub vertices: Vec<VertexHandle>,
    /// `edges[i]` joins `vertices[i]` and `vertices[i + 1]`
    pub edges: Vec<EdgeHandle>,
    pub face_row: AttributeRow,
    pub corner_rows: Vec<AttributeRow>,
}

impl FaceSnapshot {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn next(&self, i: usize) -> usize {
        (i + 1) % self.len()
    }

    pub fn prev(&self, i: usize) -> usize {
        (i + self.len() - 1) % self.len()
    }

    pub fn corner_of(&self, vertex: VertexHandle) -> Option<usize> {
        self.vertices.iter().position(|&v| v == vertex)
    }

    /// Loop attributes blended between corners `i` and `j`
    pub fn lerp_corner(&self, i: usize, j: usize, t: f64) -> AttributeRow {
        lerp_rows(&self.corner_rows[i], &self.corner_rows[j], t)
    }
}

/// Polygon mesh container
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    vertices: Arena<VertexData>,
    edges: Arena<EdgeData>,
    faces: Arena<FaceData>,
    loops: Arena<LoopData>,
    edge_lookup: AHashMap<(VertexHandle, VertexHandle), EdgeHandle>,
    vertex_attributes: AttributeTable,
    face_attributes: AttributeTable,
    loop_attributes: AttributeTable,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from positions and polygon index lists
    pub fn from_polygons(positions: &[Point3<f64>], polygons: &[Vec<usize>]) -> GeometryResult<Self> {
        let mut mesh = Self::new();
        let handles: Vec<VertexHandle> = positions.iter().map(|&p| mesh.add_vertex(p)).collect();
        for polygon in polygons {
            let vertices = polygon
                .iter()
                .map(|&i| {
                    handles.get(i).copied().ok_or_else(|| {
                        GeometryError::invalid_argument(
                            "polygons",
                            format!("vertex index {} out of range ({} vertices)", i, handles.len()),
                        )
                    })
                })
                .collect::<GeometryResult<Vec<_>>>()?;
            mesh.add_face(&vertices)?;
        }
        Ok(mesh)
    }

    // ----- counts and iteration -----

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    pub fn vertices(&self) -> Vec<VertexHandle> {
        self.vertices.handles()
    }

    pub fn edges(&self) -> Vec<EdgeHandle> {
        self.edges.handles()
    }

    pub fn faces(&self) -> Vec<FaceHandle> {
        self.faces.handles()
    }

    pub fn vertex_iter(&self) -> impl Iterator<Item = (VertexHandle, &VertexData)> + '_ {
        self.vertices.iter()
    }

    pub fn edge_iter(&self) -> impl Iterator<Item = (EdgeHandle, &EdgeData)> + '_ {
        self.edges.iter()
    }

    pub fn face_iter(&self) -> impl Iterator<Item = (FaceHandle, &FaceData)> + '_ {
        self.faces.iter()
    }

    pub fn vertex(&self, vertex: VertexHandle) -> Option<&VertexData> {
        self.vertices.get(vertex)
    }

    pub fn edge(&self, edge: EdgeHandle) -> Option<&EdgeData> {
        self.edges.get(edge)
    }

    pub fn face(&self, face: FaceHandle) -> Option<&FaceData> {
        self.faces.get(face)
    }

    pub fn loop_data(&self, corner: LoopHandle) -> Option<&LoopData> {
        self.loops.get(corner)
    }

    pub fn contains_vertex(&self, vertex: VertexHandle) -> bool {
        self.vertices.contains(vertex)
    }

    pub fn contains_edge(&self, edge: EdgeHandle) -> bool {
        self.edges.contains(edge)
    }

    pub fn contains_face(&self, face: FaceHandle) -> bool {
        self.faces.contains(face)
    }

    pub fn position(&self, vertex: VertexHandle) -> Option<Point3<f64>> {
        self.vertices.get(vertex).map(|v| v.position)
    }

    pub fn set_position(&mut self, vertex: VertexHandle, position: Point3<f64>) -> GeometryResult<()> {
        let data = self
            .vertices
            .get_mut(vertex)
            .ok_or_else(|| GeometryError::stale("vertex", vertex))?;
        data.position = position;
        Ok(())
    }

    /// Transform all vertex positions by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for vertex in self.vertices.handles() {
            if let Some(data) = self.vertices.get_mut(vertex) {
                data.position = matrix.transform_point(&data.position);
            }
        }
    }

    pub fn translate(&mut self, offset: Vector3<f64>) {
        self.transform(&Matrix4::new_translation(&offset));
    }

    // ----- creation -----

    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexHandle {
        self.vertices.insert(VertexData {
            position,
            edges: Vec::new(),
        })
    }

    /// Return the edge between `v1` and `v2`, creating it if needed
    pub fn add_edge(&mut self, v1: VertexHandle, v2: VertexHandle) -> GeometryResult<EdgeHandle> {
        if !self.vertices.contains(v1) {
            return Err(GeometryError::stale("vertex", v1));
        }
        if !self.vertices.contains(v2) {
            return Err(GeometryError::stale("vertex", v2));
        }
        if v1 == v2 {
            return Err(GeometryError::DuplicateVertex);
        }
        let key = canonical_edge(v1, v2);
        if let Some(&edge) = self.edge_lookup.get(&key) {
            return Ok(edge);
        }
        let edge = self.edges.insert(EdgeData {
            vert1: v1,
            vert2: v2,
            loops: Vec::new(),
        });
        self.edge_lookup.insert(key, edge);
        for v in [v1, v2] {
            if let Some(data) = self.vertices.get_mut(v) {
                data.edges.push(edge);
            }
        }
        Ok(edge)
    }

    /// Add a face over `vertices` (at least three, all distinct), creating missing edges
    pub fn add_face(&mut self, vertices: &[VertexHandle]) -> GeometryResult<FaceHandle> {
        if vertices.len() < 3 {
            return Err(GeometryError::DegenerateFace {
                corners: vertices.len(),
            });
        }
        for (i, &v) in vertices.iter().enumerate() {
            if !self.vertices.contains(v) {
                return Err(GeometryError::stale("vertex", v));
            }
            if vertices[..i].contains(&v) {
                return Err(GeometryError::DuplicateVertex);
            }
        }

        let n = vertices.len();
        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            edges.push(self.add_edge(vertices[i], vertices[(i + 1) % n])?);
        }

        let face = self.faces.insert(FaceData::default());
        let mut loops = Vec::with_capacity(n);
        for (&vertex, &edge) in vertices.iter().zip(&edges) {
            let corner = self.loops.insert(LoopData { vertex, edge, face });
            if let Some(data) = self.edges.get_mut(edge) {
                data.loops.push(corner);
            }
            loops.push(corner);
        }
        if let Some(data) = self.faces.get_mut(face) {
            data.loops = loops;
        }
        Ok(face)
    }

    /// Add a face and restore face and per-corner attributes onto it.
    ///
    /// `corner_rows` is either empty or holds one row per vertex.
    pub fn add_face_with_attributes(
        &mut self,
        vertices: &[VertexHandle],
        face_row: Option<&AttributeRow>,
        corner_rows: &[AttributeRow],
    ) -> GeometryResult<FaceHandle> {
        let face = self.add_face(vertices)?;
        if let Some(row) = face_row {
            self.face_attributes.set_row(face.index(), row);
        }
        let loops = self.faces.get(face).map(|f| f.loops.clone()).unwrap_or_default();
        for (corner, row) in loops.iter().zip(corner_rows) {
            self.loop_attributes.set_row(corner.index(), row);
        }
        Ok(face)
    }

    // ----- removal -----

    /// Remove a face and its loops; edges and vertices stay
    pub fn remove_face(&mut self, face: FaceHandle) -> GeometryResult<()> {
        let data = self.faces.remove(face).ok_or_else(|| GeometryError::stale("face", face))?;
        for corner in data.loops {
            if let Some(loop_data) = self.loops.remove(corner) {
                if let Some(edge) = self.edges.get_mut(loop_data.edge) {
                    edge.loops.retain(|&l| l != corner);
                }
            }
            self.loop_attributes.clear(corner.index());
        }
        self.face_attributes.clear(face.index());
        Ok(())
    }

    /// Remove an edge together with every face that uses it
    pub fn remove_edge(&mut self, edge: EdgeHandle) -> GeometryResult<()> {
        if !self.edges.contains(edge) {
            return Err(GeometryError::stale("edge", edge));
        }
        for face in self.edge_faces(edge) {
            self.remove_face(face)?;
        }
        let data = self.edges.remove(edge).ok_or_else(|| GeometryError::stale("edge", edge))?;
        self.edge_lookup.remove(&canonical_edge(data.vert1, data.vert2));
        for v in [data.vert1, data.vert2] {
            if let Some(vertex) = self.vertices.get_mut(v) {
                vertex.edges.retain(|&e| e != edge);
            }
        }
        Ok(())
    }

    /// Remove a vertex; any edge or face still using it goes first
    pub fn remove_vertex(&mut self, vertex: VertexHandle) -> GeometryResult<()> {
        let edges = self
            .vertices
            .get(vertex)
            .map(|v| v.edges.clone())
            .ok_or_else(|| GeometryError::stale("vertex", vertex))?;
        for edge in edges {
            self.remove_edge(edge)?;
        }
        self.vertices.remove(vertex);
        self.vertex_attributes.clear(vertex.index());
        Ok(())
    }

    /// Remove the given edges that no face uses anymore
    pub fn remove_loose_edges(&mut self, candidates: impl IntoIterator<Item = EdgeHandle>) -> usize {
        let mut removed = 0;
        for edge in candidates {
            let loose = self.edges.get(edge).map(|e| e.loops.is_empty()).unwrap_or(false);
            if loose && self.remove_edge(edge).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    // ----- neighbor queries -----

    pub fn edge_between(&self, v1: VertexHandle, v2: VertexHandle) -> Option<EdgeHandle> {
        self.edge_lookup.get(&canonical_edge(v1, v2)).copied()
    }

    pub fn vertex_edges(&self, vertex: VertexHandle) -> &[EdgeHandle] {
        self.vertices.get(vertex).map(|v| v.edges.as_slice()).unwrap_or(&[])
    }

    /// Vertices sharing an edge with `vertex`
    pub fn vertex_neighbors(&self, vertex: VertexHandle) -> Vec<VertexHandle> {
        self.vertex_edges(vertex)
            .iter()
            .filter_map(|&e| self.edges.get(e).and_then(|e| e.other(vertex)))
            .collect()
    }

    /// Faces with a corner at `vertex`
    pub fn vertex_faces(&self, vertex: VertexHandle) -> Vec<FaceHandle> {
        let mut faces = Vec::new();
        for &edge in self.vertex_edges(vertex) {
            let Some(data) = self.edges.get(edge) else {
                continue;
            };
            for &corner in &data.loops {
                if let Some(l) = self.loops.get(corner) {
                    if l.vertex == vertex && !faces.contains(&l.face) {
                        faces.push(l.face);
                    }
                }
            }
        }
        faces
    }

    pub fn edge_faces(&self, edge: EdgeHandle) -> Vec<FaceHandle> {
        let mut faces = Vec::new();
        if let Some(data) = self.edges.get(edge) {
            for &corner in &data.loops {
                if let Some(l) = self.loops.get(corner) {
                    if !faces.contains(&l.face) {
                        faces.push(l.face);
                    }
                }
            }
        }
        faces
    }

    pub fn face_loops(&self, face: FaceHandle) -> &[LoopHandle] {
        self.faces.get(face).map(|f| f.loops.as_slice()).unwrap_or(&[])
    }

    pub fn face_vertices(&self, face: FaceHandle) -> Vec<VertexHandle> {
        self.face_loops(face)
            .iter()
            .filter_map(|&l| self.loops.get(l).map(|l| l.vertex))
            .collect()
    }

    pub fn face_edges(&self, face: FaceHandle) -> Vec<EdgeHandle> {
        self.face_loops(face)
            .iter()
            .filter_map(|&l| self.loops.get(l).map(|l| l.edge))
            .collect()
    }

    pub fn face_positions(&self, face: FaceHandle) -> Vec<Point3<f64>> {
        self.face_vertices(face)
            .into_iter()
            .filter_map(|v| self.position(v))
            .collect()
    }

    /// Average of the corner positions
    pub fn face_center(&self, face: FaceHandle) -> Option<Point3<f64>> {
        let positions = self.face_positions(face);
        if positions.is_empty() {
            return None;
        }
        let sum = positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / positions.len() as f64))
    }

    /// Unit normal by Newell's method; zero for degenerate faces
    pub fn face_normal(&self, face: FaceHandle) -> Option<Vector3<f64>> {
        if !self.faces.contains(face) {
            return None;
        }
        Some(super::operators::newell_normal(&self.face_positions(face)))
    }

    // ----- attributes -----

    pub fn vertex_attributes(&self) -> &AttributeTable {
        &self.vertex_attributes
    }

    pub fn face_attributes(&self) -> &AttributeTable {
        &self.face_attributes
    }

    pub fn loop_attributes(&self) -> &AttributeTable {
        &self.loop_attributes
    }

    pub fn add_vertex_attribute(&mut self, attribute: Attribute) -> GeometryResult<()> {
        self.vertex_attributes.declare(attribute).map(|_| ())
    }

    pub fn add_face_attribute(&mut self, attribute: Attribute) -> GeometryResult<()> {
        self.face_attributes.declare(attribute).map(|_| ())
    }

    pub fn add_loop_attribute(&mut self, attribute: Attribute) -> GeometryResult<()> {
        self.loop_attributes.declare(attribute).map(|_| ())
    }

    pub fn vertex_attribute(&self, vertex: VertexHandle, name: &str) -> Option<&AttributeValue> {
        if !self.vertices.contains(vertex) {
            return None;
        }
        self.vertex_attributes.get_by_name(name, vertex.index())
    }

    pub fn face_attribute(&self, face: FaceHandle, name: &str) -> Option<&AttributeValue> {
        if !self.faces.contains(face) {
            return None;
        }
        self.face_attributes.get_by_name(name, face.index())
    }

    pub fn loop_attribute(&self, corner: LoopHandle, name: &str) -> Option<&AttributeValue> {
        if !self.loops.contains(corner) {
            return None;
        }
        self.loop_attributes.get_by_name(name, corner.index())
    }

    pub fn set_vertex_attribute(
        &mut self,
        vertex: VertexHandle,
        name: &str,
        value: AttributeValue,
    ) -> GeometryResult<()> {
        if !self.vertices.contains(vertex) {
            return Err(GeometryError::stale("vertex", vertex));
        }
        self.vertex_attributes.set_by_name(name, vertex.index(), value)
    }

    pub fn set_face_attribute(
        &mut self,
        face: FaceHandle,
        name: &str,
        value: AttributeValue,
    ) -> GeometryResult<()> {
        if !self.faces.contains(face) {
            return Err(GeometryError::stale("face", face));
        }
        self.face_attributes.set_by_name(name, face.index(), value)
    }

    pub fn set_loop_attribute(
        &mut self,
        corner: LoopHandle,
        name: &str,
        value: AttributeValue,
    ) -> GeometryResult<()> {
        if !self.loops.contains(corner) {
            return Err(GeometryError::stale("loop", corner));
        }
        self.loop_attributes.set_by_name(name, corner.index(), value)
    }

    pub fn vertex_row(&self, vertex: VertexHandle) -> AttributeRow {
        self.vertex_attributes.row(vertex.index())
    }

    pub fn set_vertex_row(&mut self, vertex: VertexHandle, row: &AttributeRow) {
        if self.vertices.contains(vertex) {
            self.vertex_attributes.set_row(vertex.index(), row);
        }
    }

    pub fn face_row(&self, face: FaceHandle) -> AttributeRow {
        self.face_attributes.row(face.index())
    }

    pub fn set_face_row(&mut self, face: FaceHandle, row: &AttributeRow) {
        if self.faces.contains(face) {
            self.face_attributes.set_row(face.index(), row);
        }
    }

    pub fn loop_row(&self, corner: LoopHandle) -> AttributeRow {
        self.loop_attributes.row(corner.index())
    }

    pub fn set_loop_row(&mut self, corner: LoopHandle, row: &AttributeRow) {
        if self.loops.contains(corner) {
            self.loop_attributes.set_row(corner.index(), row);
        }
    }

    /// Copy every vertex attribute of `source` onto `target`
    pub fn copy_vertex_attributes(&mut self, target: VertexHandle, source: VertexHandle) {
        let row = self.vertex_row(source);
        self.set_vertex_row(target, &row);
    }

    /// Capture a face so it can be removed and rebuilt
    pub fn snapshot_face(&self, face: FaceHandle) -> Option<FaceSnapshot> {
        let data = self.faces.get(face)?;
        let mut vertices = Vec::with_capacity(data.loops.len());
        let mut edges = Vec::with_capacity(data.loops.len());
        let mut corner_rows = Vec::with_capacity(data.loops.len());
        for &corner in &data.loops {
            let l = self.loops.get(corner)?;
            vertices.push(l.vertex);
            edges.push(l.edge);
            corner_rows.push(self.loop_row(corner));
        }
        Some(FaceSnapshot {
            vertices,
            edges,
            face_row: self.face_row(face),
            corner_rows,
        })
    }
}
