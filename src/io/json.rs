// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lossless JSON snapshot of a mesh, attributes included

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{Attribute, AttributeRow, AttributeTable, AttributeValue, GeometryData, VertexHandle};
use ahash::AHashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// One attribute channel with a value per element, in document order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDocument {
    pub attribute: Attribute,
    pub values: Vec<Option<AttributeValue>>,
}

/// Serializable form of [`GeometryData`].
///
/// Elements are renumbered densely: faces index into `positions`, edges are
/// vertex index pairs, and loop channels hold one value per face corner in
/// face order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDocument {
    pub positions: Vec<[f64; 3]>,
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
    pub faces: Vec<Vec<usize>>,
    #[serde(default)]
    pub vertex_attributes: Vec<ChannelDocument>,
    #[serde(default)]
    pub face_attributes: Vec<ChannelDocument>,
    #[serde(default)]
    pub loop_attributes: Vec<ChannelDocument>,
}

fn channels(table: &AttributeTable, rows: impl Iterator<Item = AttributeRow>) -> Vec<ChannelDocument> {
    let mut documents: Vec<ChannelDocument> = table
        .attributes()
        .iter()
        .map(|attribute| ChannelDocument {
            attribute: attribute.clone(),
            values: Vec::new(),
        })
        .collect();
    for row in rows {
        for (document, value) in documents.iter_mut().zip(row) {
            document.values.push(value);
        }
    }
    documents
}

/// Row `index` across channels; missing entries read as unset
fn row_at(documents: &[ChannelDocument], index: usize) -> AttributeRow {
    documents
        .iter()
        .map(|d| d.values.get(index).cloned().flatten())
        .collect()
}

impl MeshDocument {
    pub fn from_mesh(mesh: &GeometryData) -> Self {
        let mut index: AHashMap<VertexHandle, usize> = AHashMap::with_capacity(mesh.vertex_count());
        let mut positions = Vec::with_capacity(mesh.vertex_count());
        for (i, (handle, data)) in mesh.vertex_iter().enumerate() {
            positions.push([data.position.x, data.position.y, data.position.z]);
            index.insert(handle, i);
        }
        let lookup = |v: &VertexHandle| index.get(v).copied().unwrap_or(0);

        let edges = mesh
            .edge_iter()
            .map(|(_, e)| [lookup(&e.vert1), lookup(&e.vert2)])
            .collect();
        let faces = mesh
            .face_iter()
            .map(|(f, _)| mesh.face_vertices(f).iter().map(lookup).collect())
            .collect();

        Self {
            positions,
            edges,
            faces,
            vertex_attributes: channels(
                mesh.vertex_attributes(),
                mesh.vertex_iter().map(|(v, _)| mesh.vertex_row(v)),
            ),
            face_attributes: channels(
                mesh.face_attributes(),
                mesh.face_iter().map(|(f, _)| mesh.face_row(f)),
            ),
            loop_attributes: channels(
                mesh.loop_attributes(),
                mesh.face_iter()
                    .flat_map(|(_, data)| data.loops().iter().map(|&c| mesh.loop_row(c))),
            ),
        }
    }

    pub fn to_mesh(&self) -> GeometryResult<GeometryData> {
        let mut mesh = GeometryData::new();
        for channel in &self.vertex_attributes {
            mesh.add_vertex_attribute(channel.attribute.clone())?;
        }
        for channel in &self.face_attributes {
            mesh.add_face_attribute(channel.attribute.clone())?;
        }
        for channel in &self.loop_attributes {
            mesh.add_loop_attribute(channel.attribute.clone())?;
        }

        let vertices: Vec<VertexHandle> = self
            .positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let v = mesh.add_vertex(Point3::new(p[0], p[1], p[2]));
                mesh.set_vertex_row(v, &row_at(&self.vertex_attributes, i));
                v
            })
            .collect();
        let vertex = |i: usize| {
            vertices.get(i).copied().ok_or_else(|| {
                GeometryError::invalid_argument("positions", format!("vertex index {} out of range", i))
            })
        };

        for &[a, b] in &self.edges {
            mesh.add_edge(vertex(a)?, vertex(b)?)?;
        }
        let mut corner = 0;
        for (i, face) in self.faces.iter().enumerate() {
            let handles = face.iter().map(|&v| vertex(v)).collect::<GeometryResult<Vec<_>>>()?;
            let corners: Vec<AttributeRow> = (corner..corner + face.len())
                .map(|c| row_at(&self.loop_attributes, c))
                .collect();
            corner += face.len();
            mesh.add_face_with_attributes(&handles, Some(&row_at(&self.face_attributes, i)), &corners)?;
        }
        Ok(mesh)
    }
}

pub fn write_json(mesh: &GeometryData, mut writer: impl Write) -> GeometryResult<()> {
    serde_json::to_writer_pretty(&mut writer, &MeshDocument::from_mesh(mesh)).map_err(std::io::Error::from)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json(reader: impl Read) -> GeometryResult<GeometryData> {
    let document: MeshDocument = serde_json::from_reader(reader).map_err(|err| GeometryError::Parse {
        line: err.line(),
        message: err.to_string(),
    })?;
    document.to_mesh()
}

pub fn export_json(mesh: &GeometryData, path: impl AsRef<Path>) -> GeometryResult<()> {
    write_json(mesh, BufWriter::new(File::create(path)?))
}

pub fn import_json(path: impl AsRef<Path>) -> GeometryResult<GeometryData> {
    read_json(BufReader::new(File::open(path)?))
}
