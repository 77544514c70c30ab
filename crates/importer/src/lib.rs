//! Mesh import: decode a source file into an [`asset::Scene`] and apply the
//! post-processing the mesh packer expects (node transforms baked in, primitives
//! merged, triangles only, no degenerates, tangents present, cache-friendly
//! order, flipped winding).

use std::path::{Path, PathBuf};

use asset::Scene;
use thiserror::Error;

mod gltf_loader;
pub mod postprocess;

pub use gltf_loader::PrimitiveTopology;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to import {}", path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("mesh '{mesh}' uses {topology:?} primitives, which cannot be triangulated")]
    UnsupportedTopology {
        mesh: String,
        topology: PrimitiveTopology,
    },

    #[error("mesh '{mesh}' has no vertex positions")]
    MissingPositions { mesh: String },

    #[error("mesh '{mesh}' has {count} vertices, more than 32-bit indices can address")]
    TooManyVertices { mesh: String, count: usize },
}

/// Post-processing switches. Everything is on by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Walk the node graph and bake world transforms into vertex data.
    pub pretransform: bool,
    /// Collapse every primitive into a single mesh.
    pub merge_meshes: bool,
    pub generate_tangents: bool,
    pub remove_degenerates: bool,
    /// Reorder triangles for post-transform vertex cache reuse.
    pub optimize_cache: bool,
    pub flip_winding: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            pretransform: true,
            merge_meshes: true,
            generate_tangents: true,
            remove_degenerates: true,
            optimize_cache: true,
            flip_winding: true,
        }
    }
}

/// Import a glTF 2.0 file (`.gltf` or `.glb`).
///
/// Each primitive is read as one scene mesh; with `merge_meshes` they end up
/// as a single mesh so the first-mesh packer sees the whole model.
pub fn import_scene(path: impl AsRef<Path>, options: &ImportOptions) -> Result<Scene, ImportError> {
    let path = path.as_ref();
    log::info!("Importing mesh from {}", path.display());

    let mut scene = gltf_loader::load(path, options.pretransform)?;
    if options.merge_meshes && scene.meshes.len() > 1 {
        let merged = postprocess::merge_meshes(std::mem::take(&mut scene.meshes))?;
        scene.meshes.push(merged);
    }
    for mesh in &mut scene.meshes {
        postprocess::apply(mesh, options);
        log::debug!(
            "Mesh '{}': {} vertices, {} triangles after post-processing",
            mesh.label(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
    }

    if !scene.has_meshes() {
        log::warn!("{} contains no meshes", path.display());
    }
    log::info!(
        "Imported {} mesh(es) from {}",
        scene.meshes.len(),
        path.display()
    );
    Ok(scene)
}
