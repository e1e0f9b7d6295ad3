// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh store, attributes and shared topology helpers

pub mod attribute;
pub mod handle;
mod mesh;
pub mod operators;
mod primitives;
pub mod validation;

pub use attribute::{Attribute, AttributeBaseType, AttributeRow, AttributeTable, AttributeValue};
pub use handle::{Arena, Handle};
pub use mesh::{
    EdgeData, EdgeHandle, FaceData, FaceHandle, FaceSnapshot, GeometryData, LoopData, LoopHandle,
    VertexData, VertexHandle,
};
pub use primitives::Primitive;
pub use validation::{validate, validate_mesh, MeshValidation};
