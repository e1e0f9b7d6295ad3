// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Default operator parameters

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Plane-distance tolerance used by bisection
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Offsets and distances at or below this magnitude are treated as zero
pub const AMOUNT_EPSILON: f64 = 1e-9;

/// Configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "loopmesh.toml";

/// Editing defaults, used by the CLI when a parameter is not given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// On-plane tolerance for bisection
    pub bisect_epsilon: f64,
    /// Snap on-plane vertices exactly onto the bisection plane
    pub bisect_snap: bool,
    /// Weld distance
    pub weld_threshold: f64,
    /// Inset fraction toward the target position
    pub inset_thickness: f64,
    /// Extrusion distance
    pub extrude_distance: f64,
    /// Bevel offset fraction along each edge, in (0, 1)
    pub bevel_offset: f64,
    /// Relaxation rate per squarify pass
    pub squarify_rate: f64,
    /// Number of squarify passes the CLI runs
    pub squarify_iterations: usize,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            bisect_epsilon: DEFAULT_EPSILON,
            bisect_snap: true,
            weld_threshold: 1e-4,
            inset_thickness: 0.2,
            extrude_distance: 1.0,
            bevel_offset: 0.25,
            squarify_rate: 0.5,
            squarify_iterations: 10,
        }
    }
}

impl EditConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EditConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `loopmesh.toml` if present, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override fields from `LOOPMESH_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        fn read<T: std::str::FromStr>(name: &str, field: &mut T) {
            if let Some(value) = std::env::var(name).ok().and_then(|v| v.parse().ok()) {
                *field = value;
            }
        }

        read("LOOPMESH_BISECT_EPSILON", &mut self.bisect_epsilon);
        read("LOOPMESH_BISECT_SNAP", &mut self.bisect_snap);
        read("LOOPMESH_WELD_THRESHOLD", &mut self.weld_threshold);
        read("LOOPMESH_INSET_THICKNESS", &mut self.inset_thickness);
        read("LOOPMESH_EXTRUDE_DISTANCE", &mut self.extrude_distance);
        read("LOOPMESH_BEVEL_OFFSET", &mut self.bevel_offset);
        read("LOOPMESH_SQUARIFY_RATE", &mut self.squarify_rate);
        read("LOOPMESH_SQUARIFY_ITERATIONS", &mut self.squarify_iterations);
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
