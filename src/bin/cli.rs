// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Loopmesh CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use loopmesh::geometry::{validate, validate_mesh};
use loopmesh::ops::{self, ExtrudeMode, InsetMode};
use loopmesh::{load_mesh, save_mesh, EditConfig, FaceHandle, GeometryData, VertexHandle};
use nalgebra::{Point3, Vector3};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "loopmesh")]
#[command(about = "Loopmesh - polygon mesh editing kernel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print topology and attribute summary of a mesh
    Info {
        input: PathBuf,
    },

    /// Quad-subdivide every face
    Subdivide {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Number of subdivision levels
        #[arg(short, long, default_value_t = 1)]
        levels: usize,
    },

    /// Merge vertices closer than a threshold
    Weld {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Cut the mesh along a plane
    Bisect {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Point on the plane, as x,y,z
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 0.0, 0.0])]
        origin: Vec<f64>,
        /// Plane normal, as x,y,z
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 0.0, 1.0])]
        normal: Vec<f64>,
        #[arg(long)]
        epsilon: Option<f64>,
        /// Keep on-plane vertices where they are
        #[arg(long)]
        no_snap: bool,
    },

    /// Inset faces
    Inset {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        thickness: Option<f64>,
        /// Move faces of the selection together
        #[arg(long)]
        shared: bool,
        /// Face indices to inset (all faces when omitted)
        #[arg(long, value_delimiter = ',')]
        faces: Vec<usize>,
    },

    /// Extrude faces
    Extrude {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, allow_negative_numbers = true)]
        distance: Option<f64>,
        #[arg(short, long, value_enum, default_value_t = ExtrudeArg::PerFace)]
        mode: ExtrudeArg,
        /// Face indices to extrude (all faces when omitted)
        #[arg(long, value_delimiter = ',')]
        faces: Vec<usize>,
    },

    /// Bevel vertices
    Bevel {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Fraction of each incident edge, in (0, 1)
        #[arg(long)]
        offset: Option<f64>,
        /// Vertex indices to bevel (all vertices when omitted)
        #[arg(long, value_delimiter = ',')]
        vertices: Vec<usize>,
    },

    /// Relax quads toward squares
    Squarify {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        rate: Option<f64>,
        #[arg(short, long)]
        iterations: Option<usize>,
        /// Give every quad the mesh-wide average size
        #[arg(long)]
        uniform: bool,
    },

    /// Append several meshes into one
    Merge {
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
        /// Weld coincident vertices afterwards with this threshold
        #[arg(long)]
        weld: Option<f64>,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExtrudeArg {
    PerFace,
    AlongNormals,
    AverageNormal,
}

impl From<ExtrudeArg> for ExtrudeMode {
    fn from(arg: ExtrudeArg) -> Self {
        match arg {
            ExtrudeArg::PerFace => ExtrudeMode::PerFace,
            ExtrudeArg::AlongNormals => ExtrudeMode::AlongNormals,
            ExtrudeArg::AverageNormal => ExtrudeMode::AverageNormal,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EditConfig::load()?;
    let verbose = cli.verbose;

    match cli.command {
        Commands::Info { input } => {
            let mesh = open(&input, verbose)?;
            print_info(&input, &mesh);
        }
        Commands::Subdivide { input, output, levels } => {
            let mut mesh = open(&input, verbose)?;
            for _ in 0..levels {
                ops::subdivide(&mut mesh)?;
            }
            finish(&mesh, &output, &format!("subdivided {} time(s)", levels), verbose)?;
        }
        Commands::Weld { input, output, threshold } => {
            let mut mesh = open(&input, verbose)?;
            let removed = ops::weld_vertices(&mut mesh, threshold.unwrap_or(config.weld_threshold))?;
            finish(&mesh, &output, &format!("welded {} vertices", removed), verbose)?;
        }
        Commands::Bisect {
            input,
            output,
            origin,
            normal,
            epsilon,
            no_snap,
        } => {
            let (Ok(origin), Ok(normal)) = (<[f64; 3]>::try_from(origin), <[f64; 3]>::try_from(normal)) else {
                bail!("--origin and --normal take exactly three comma-separated numbers");
            };
            let mut mesh = open(&input, verbose)?;
            let stats = ops::bisect_plane(
                &mut mesh,
                Point3::from(origin),
                Vector3::from(normal),
                epsilon.unwrap_or(config.bisect_epsilon),
                config.bisect_snap && !no_snap,
            )?;
            if stats.skipped_faces > 0 {
                eprintln!(
                    "{} {} faces straddle the plane but could not be split",
                    "Warning:".yellow(),
                    stats.skipped_faces
                );
            }
            let summary = format!("split {} edges and {} faces", stats.split_edges, stats.split_faces);
            finish(&mesh, &output, &summary, verbose)?;
        }
        Commands::Inset {
            input,
            output,
            thickness,
            shared,
            faces,
        } => {
            let mut mesh = open(&input, verbose)?;
            let selection = select_faces(&mesh, &faces)?;
            let mode = if shared { InsetMode::Shared } else { InsetMode::PerFace };
            let inner = ops::inset_faces(
                &mut mesh,
                &selection,
                thickness.unwrap_or(config.inset_thickness),
                mode,
            )?;
            finish(&mesh, &output, &format!("inset {} faces", inner.len()), verbose)?;
        }
        Commands::Extrude {
            input,
            output,
            distance,
            mode,
            faces,
        } => {
            let mut mesh = open(&input, verbose)?;
            let selection = select_faces(&mesh, &faces)?;
            let tops = ops::extrude_faces(
                &mut mesh,
                &selection,
                distance.unwrap_or(config.extrude_distance),
                mode.into(),
            )?;
            finish(&mesh, &output, &format!("extruded {} faces", tops.len()), verbose)?;
        }
        Commands::Bevel {
            input,
            output,
            offset,
            vertices,
        } => {
            let mut mesh = open(&input, verbose)?;
            let selection = select_vertices(&mesh, &vertices)?;
            ops::bevel_vertices(&mut mesh, &selection, offset.unwrap_or(config.bevel_offset))?;
            finish(&mesh, &output, &format!("beveled {} vertices", selection.len()), verbose)?;
        }
        Commands::Squarify {
            input,
            output,
            rate,
            iterations,
            uniform,
        } => {
            let mut mesh = open(&input, verbose)?;
            let iterations = iterations.unwrap_or(config.squarify_iterations);
            let rate = rate.unwrap_or(config.squarify_rate);
            for _ in 0..iterations {
                ops::squarify(&mut mesh, rate, uniform)?;
            }
            finish(&mesh, &output, &format!("ran {} squarify passes", iterations), verbose)?;
        }
        Commands::Merge { inputs, output, weld } => {
            let mut mesh = GeometryData::new();
            for input in &inputs {
                let part = open(input, verbose)?;
                ops::merge(&mut mesh, &part)?;
            }
            let mut summary = format!("merged {} meshes", inputs.len());
            if let Some(threshold) = weld {
                let removed = ops::weld_vertices(&mut mesh, threshold)?;
                summary.push_str(&format!(", welded {} vertices", removed));
            }
            finish(&mesh, &output, &summary, verbose)?;
        }
        Commands::Version => {
            println!("Loopmesh v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn open(path: &Path, verbose: bool) -> Result<GeometryData> {
    if !path.exists() {
        bail!("Input file not found: {}", path.display());
    }
    let start = Instant::now();
    let mesh = load_mesh(path).with_context(|| format!("Failed to load {}", path.display()))?;
    if verbose {
        println!(
            "{} {} ({} vertices, {} faces) in {:.2?}",
            "Loaded".bright_blue(),
            path.display(),
            mesh.vertex_count(),
            mesh.face_count(),
            start.elapsed()
        );
    }
    Ok(mesh)
}

fn finish(mesh: &GeometryData, output: &Path, summary: &str, verbose: bool) -> Result<()> {
    validate(mesh).context("Edited mesh failed validation")?;
    save_mesh(mesh, output).with_context(|| format!("Failed to write {}", output.display()))?;
    if verbose {
        println!(
            "  {} {}, {} {}, {} {}",
            "Vertices:".bright_black(),
            mesh.vertex_count().to_string().cyan(),
            "Edges:".bright_black(),
            mesh.edge_count().to_string().cyan(),
            "Faces:".bright_black(),
            mesh.face_count().to_string().cyan()
        );
    }
    println!("{} {} -> {}", "✅".green(), summary, output.display());
    Ok(())
}

fn select_faces(mesh: &GeometryData, indices: &[usize]) -> Result<Vec<FaceHandle>> {
    let faces = mesh.faces();
    if indices.is_empty() {
        return Ok(faces);
    }
    indices
        .iter()
        .map(|&i| {
            faces
                .get(i)
                .copied()
                .with_context(|| format!("Face index {} out of range ({} faces)", i, faces.len()))
        })
        .collect()
}

fn select_vertices(mesh: &GeometryData, indices: &[usize]) -> Result<Vec<VertexHandle>> {
    let vertices = mesh.vertices();
    if indices.is_empty() {
        return Ok(vertices);
    }
    indices
        .iter()
        .map(|&i| {
            vertices
                .get(i)
                .copied()
                .with_context(|| format!("Vertex index {} out of range ({} vertices)", i, vertices.len()))
        })
        .collect()
}

fn print_info(path: &Path, mesh: &GeometryData) {
    let report = validate_mesh(mesh);
    println!("{}", path.display().to_string().bold());
    println!("  {} {}", "Vertices:".bright_black(), mesh.vertex_count().to_string().cyan());
    println!("  {} {}", "Edges:".bright_black(), mesh.edge_count().to_string().cyan());
    println!("  {} {}", "Faces:".bright_black(), mesh.face_count().to_string().cyan());
    println!(
        "  {} {} boundary, {} loose",
        "Edge use:".bright_black(),
        report.boundary_edge_count,
        report.loose_edge_count
    );
    let flag = |ok: bool| if ok { "yes".green() } else { "no".red() };
    println!("  {} {}", "Manifold:".bright_black(), flag(report.is_manifold));
    println!("  {} {}", "Closed:".bright_black(), flag(report.is_closed));
    println!("  {} {}", "Consistent winding:".bright_black(), flag(report.has_consistent_winding));

    for (label, table) in [
        ("Vertex", mesh.vertex_attributes()),
        ("Face", mesh.face_attributes()),
        ("Loop", mesh.loop_attributes()),
    ] {
        for attribute in table.attributes() {
            println!(
                "  {} {} ({:?}x{})",
                format!("{} attribute:", label).bright_black(),
                attribute.name,
                attribute.base_type,
                attribute.dimensions
            );
        }
    }
}
