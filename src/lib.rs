// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Loopmesh editing kernel
//!
//! A polygon mesh store with per-corner loops and typed attribute channels,
//! plus the editing operators built on it: edge and face splits, plane
//! bisection, welding, inset, extrusion, subdivision, vertex bevel, quad
//! relaxation and merging.

pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod ops;

pub use config::EditConfig;
pub use error::{GeometryError, GeometryResult};
pub use geometry::{
    Attribute, AttributeBaseType, AttributeValue, EdgeHandle, FaceHandle, GeometryData, LoopHandle,
    Primitive, VertexHandle,
};
pub use io::{load_mesh, save_mesh};
