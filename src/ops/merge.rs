// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Append one mesh to another

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{AttributeRow, AttributeTable, GeometryData, VertexHandle};
use ahash::AHashMap;
use tracing::debug;

/// Channels of `source` translated to the channel order of `target`
fn remap_row(source: &AttributeTable, target: &AttributeTable, row: &AttributeRow) -> AttributeRow {
    let mut out: AttributeRow = vec![None; target.len()];
    for (attribute, value) in source.attributes().iter().zip(row) {
        if let Some(channel) = target.position(&attribute.name) {
            out[channel] = value.clone();
        }
    }
    out
}

/// Fail before touching anything if a shared attribute name disagrees on type
fn check_compatible(target: &AttributeTable, source: &AttributeTable) -> GeometryResult<()> {
    for attribute in source.attributes() {
        let Some(existing) = target.attributes().iter().find(|a| a.name == attribute.name) else {
            continue;
        };
        if existing != attribute {
            return Err(GeometryError::AttributeMismatch {
                name: attribute.name.clone(),
                details: format!(
                    "{:?}x{} in target, {:?}x{} in source",
                    existing.base_type, existing.dimensions, attribute.base_type, attribute.dimensions
                ),
            });
        }
    }
    Ok(())
}

/// Copy every vertex, edge and face of `source` into `target`.
///
/// Nothing is welded; run [`weld_vertices`](super::weld_vertices) afterwards
/// to join coincident vertices. Attributes declared only on `source` are
/// declared on `target` first.
pub fn merge(target: &mut GeometryData, source: &GeometryData) -> GeometryResult<()> {
    check_compatible(target.vertex_attributes(), source.vertex_attributes())?;
    check_compatible(target.face_attributes(), source.face_attributes())?;
    check_compatible(target.loop_attributes(), source.loop_attributes())?;

    for attribute in source.vertex_attributes().attributes() {
        target.add_vertex_attribute(attribute.clone())?;
    }
    for attribute in source.face_attributes().attributes() {
        target.add_face_attribute(attribute.clone())?;
    }
    for attribute in source.loop_attributes().attributes() {
        target.add_loop_attribute(attribute.clone())?;
    }

    let mut vertex_map: AHashMap<VertexHandle, VertexHandle> = AHashMap::with_capacity(source.vertex_count());
    for (handle, data) in source.vertex_iter() {
        let v = target.add_vertex(data.position);
        let row = remap_row(source.vertex_attributes(), target.vertex_attributes(), &source.vertex_row(handle));
        target.set_vertex_row(v, &row);
        vertex_map.insert(handle, v);
    }
    let resolve = |v: VertexHandle| {
        vertex_map
            .get(&v)
            .copied()
            .ok_or_else(|| GeometryError::stale("vertex", v))
    };

    for (_, data) in source.edge_iter() {
        target.add_edge(resolve(data.vert1)?, resolve(data.vert2)?)?;
    }

    for (face, _) in source.face_iter() {
        let vertices = source
            .face_vertices(face)
            .into_iter()
            .map(resolve)
            .collect::<GeometryResult<Vec<_>>>()?;
        let face_row = remap_row(source.face_attributes(), target.face_attributes(), &source.face_row(face));
        let corners: Vec<AttributeRow> = source
            .face_loops(face)
            .iter()
            .map(|&c| remap_row(source.loop_attributes(), target.loop_attributes(), &source.loop_row(c)))
            .collect();
        target.add_face_with_attributes(&vertices, Some(&face_row), &corners)?;
    }

    debug!(
        "Merged {} vertices and {} faces",
        source.vertex_count(),
        source.face_count()
    );
    Ok(())
}
