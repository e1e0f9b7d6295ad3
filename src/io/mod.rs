// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - importing and exporting meshes

mod json;
mod obj;
mod stl;

pub use json::{export_json, import_json, read_json, write_json, ChannelDocument, MeshDocument};
pub use obj::{export_obj, import_obj, read_obj, write_obj, UV_ATTRIBUTE};
pub use stl::{export_stl, import_stl, read_stl, triangulate, write_stl};

use crate::error::{GeometryError, GeometryResult};
use crate::geometry::GeometryData;
use std::path::Path;

/// File formats recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Stl,
    Json,
}

impl MeshFormat {
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "obj" => Some(Self::Obj),
            "stl" => Some(Self::Stl),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn format_of(path: &Path) -> GeometryResult<MeshFormat> {
    MeshFormat::from_path(path).ok_or_else(|| {
        GeometryError::invalid_argument("path", format!("unsupported mesh format: {:?}", path))
    })
}

/// Load a mesh, choosing the reader from the file extension
pub fn load_mesh(path: impl AsRef<Path>) -> GeometryResult<GeometryData> {
    let path = path.as_ref();
    match format_of(path)? {
        MeshFormat::Obj => import_obj(path),
        MeshFormat::Stl => import_stl(path),
        MeshFormat::Json => import_json(path),
    }
}

/// Save a mesh, choosing the writer from the file extension
pub fn save_mesh(mesh: &GeometryData, path: impl AsRef<Path>) -> GeometryResult<()> {
    let path = path.as_ref();
    match format_of(path)? {
        MeshFormat::Obj => export_obj(mesh, path),
        MeshFormat::Stl => export_stl(mesh, path),
        MeshFormat::Json => export_json(mesh, path),
    }
}
