// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for mesh editing operations

use crate::geometry::Handle;
use thiserror::Error;

/// Result type for mesh editing operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors that can occur while editing a mesh.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// A handle refers to an element that was removed (or never existed).
    #[error("stale {kind} handle {index}:{generation}")]
    StaleHandle {
        /// Element class ("vertex", "edge", "face", "loop").
        kind: &'static str,
        /// Slot index of the handle.
        index: u32,
        /// Generation of the handle.
        generation: u32,
    },

    /// A scalar parameter is outside its valid range.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A vertex is not part of the edge or face it was paired with.
    #[error("vertex is not incident to the given {element}")]
    NotIncident {
        /// Element class the vertex was expected on.
        element: &'static str,
    },

    /// A face would have fewer than three corners.
    #[error("degenerate face with {corners} corners")]
    DegenerateFace {
        /// Number of corners supplied.
        corners: usize,
    },

    /// A face lists the same vertex twice.
    #[error("face references the same vertex more than once")]
    DuplicateVertex,

    /// A value or declaration does not match an existing attribute.
    #[error("attribute `{name}` mismatch: {details}")]
    AttributeMismatch {
        /// Attribute name.
        name: String,
        /// Description of the mismatch.
        details: String,
    },

    /// No attribute with this name is declared for the element class.
    #[error("unknown attribute `{0}`")]
    UnknownAttribute(String),

    /// The mesh store is internally inconsistent.
    #[error("mesh invariant violated: {0}")]
    InvariantViolation(String),

    /// Reading or writing a mesh file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A mesh file could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },
}

impl GeometryError {
    pub(crate) fn stale<T>(kind: &'static str, handle: Handle<T>) -> Self {
        Self::StaleHandle {
            kind,
            index: handle.index() as u32,
            generation: handle.generation(),
        }
    }

    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}
