//! Decoded importer output handed to the mesh packer.

use std::fmt;

/// Optional per-vertex channels a source mesh may lack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshChannel {
    TexCoord,
    Normal,
    Tangent,
}

impl fmt::Display for MeshChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TexCoord => "texture coordinate",
            Self::Normal => "normal",
            Self::Tangent => "tangent",
        })
    }
}

/// One triangulated mesh as produced by an importer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneMesh {
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    /// First UV set only.
    pub texcoords: Option<Vec<[f32; 2]>>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangents: Option<Vec<[f32; 3]>>,
    /// Flattened triangle list.
    pub indices: Vec<u32>,
}

impl SceneMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
}

impl Scene {
    pub fn new(meshes: Vec<SceneMesh>) -> Self {
        Self { meshes }
    }

    pub fn has_meshes(&self) -> bool {
        !self.meshes.is_empty()
    }
}
