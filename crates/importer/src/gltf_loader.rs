//! glTF decoding via the `gltf` crate.

use std::path::Path;

use asset::{Scene, SceneMesh};
use glam::Mat4;
use gltf::mesh::Mode;

use crate::{ImportError, postprocess};

/// How a primitive's index stream is assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveTopology {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl From<Mode> for PrimitiveTopology {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Points => Self::Points,
            Mode::Lines => Self::Lines,
            Mode::LineLoop => Self::LineLoop,
            Mode::LineStrip => Self::LineStrip,
            Mode::Triangles => Self::Triangles,
            Mode::TriangleStrip => Self::TriangleStrip,
            Mode::TriangleFan => Self::TriangleFan,
        }
    }
}

/// Decode `path`. With `pretransform`, meshes are instanced by walking the
/// default scene's node graph and each copy is baked into world space; without
/// it (or when the file has no scene) every mesh is read once in local space.
pub(crate) fn load(path: &Path, pretransform: bool) -> Result<Scene, ImportError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| ImportError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut meshes = Vec::new();
    let scene = document.default_scene().or_else(|| document.scenes().next());
    match scene {
        Some(scene) if pretransform => {
            for node in scene.nodes() {
                visit(&node, Mat4::IDENTITY, &buffers, &mut meshes)?;
            }
        }
        _ => {
            for mesh in document.meshes() {
                read_mesh(&mesh, &buffers, &mut meshes)?;
            }
        }
    }

    Ok(Scene::new(meshes))
}

fn visit(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<SceneMesh>,
) -> Result<(), ImportError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let first = out.len();
        read_mesh(&mesh, buffers, out)?;
        for scene_mesh in &mut out[first..] {
            postprocess::transform(scene_mesh, &world);
        }
    }
    for child in node.children() {
        visit(&child, world, buffers, out)?;
    }
    Ok(())
}

/// Push one `SceneMesh` per primitive of `mesh`.
fn read_mesh(
    mesh: &gltf::Mesh<'_>,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<SceneMesh>,
) -> Result<(), ImportError> {
    let base = mesh
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("mesh{}", mesh.index()));
    let split = mesh.primitives().len() > 1;

    for primitive in mesh.primitives() {
        let name = if split {
            format!("{base}#{}", primitive.index())
        } else {
            base.clone()
        };
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let positions: Vec<[f32; 3]> = match reader.read_positions() {
            Some(iter) => iter.collect(),
            None => return Err(ImportError::MissingPositions { mesh: name }),
        };
        let vertex_count =
            u32::try_from(positions.len()).map_err(|_| ImportError::TooManyVertices {
                mesh: name.clone(),
                count: positions.len(),
            })?;

        let texcoords = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect());
        let normals = reader.read_normals().map(|iter| iter.collect());
        // w holds bitangent handedness, which the asset format does not store
        let tangents = reader
            .read_tangents()
            .map(|iter| iter.map(|[x, y, z, _w]| [x, y, z]).collect());

        let raw: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..vertex_count).collect(),
        };
        let topology = PrimitiveTopology::from(primitive.mode());
        let indices = triangulate(topology, &raw).ok_or_else(|| {
            ImportError::UnsupportedTopology {
                mesh: name.clone(),
                topology,
            }
        })?;

        log::debug!(
            "Primitive '{}': {} vertices, {} triangles, uv={} normals={} tangents={}",
            name,
            positions.len(),
            indices.len() / 3,
            texcoords.is_some(),
            normals.is_some(),
            tangents.is_some()
        );

        out.push(SceneMesh {
            name: Some(name),
            positions,
            texcoords,
            normals,
            tangents,
            indices,
        });
    }
    Ok(())
}

/// Expand an index stream into a flat triangle list. `None` for point/line topologies.
pub(crate) fn triangulate(topology: PrimitiveTopology, indices: &[u32]) -> Option<Vec<u32>> {
    match topology {
        PrimitiveTopology::Triangles => {
            let whole = indices.len() - indices.len() % 3;
            Some(indices[..whole].to_vec())
        }
        PrimitiveTopology::TriangleStrip => Some(
            indices
                .windows(3)
                .enumerate()
                .flat_map(|(i, w)| {
                    // keep a consistent winding on odd triangles
                    if i % 2 == 0 {
                        [w[0], w[1], w[2]]
                    } else {
                        [w[1], w[0], w[2]]
                    }
                })
                .collect(),
        ),
        PrimitiveTopology::TriangleFan => {
            let (&hub, rest) = match indices.split_first() {
                Some(split) => split,
                None => return Some(Vec::new()),
            };
            Some(
                rest.windows(2)
                    .flat_map(|w| [hub, w[0], w[1]])
                    .collect(),
            )
        }
        PrimitiveTopology::Points
        | PrimitiveTopology::Lines
        | PrimitiveTopology::LineLoop
        | PrimitiveTopology::LineStrip => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_list_drops_partial_tail() {
        assert_eq!(
            triangulate(PrimitiveTopology::Triangles, &[0, 1, 2, 3, 4]),
            Some(vec![0, 1, 2])
        );
    }

    #[test]
    fn strip_alternates_winding() {
        assert_eq!(
            triangulate(PrimitiveTopology::TriangleStrip, &[0, 1, 2, 3, 4]),
            Some(vec![0, 1, 2, 2, 1, 3, 2, 3, 4])
        );
        assert_eq!(
            triangulate(PrimitiveTopology::TriangleStrip, &[0, 1]),
            Some(Vec::new())
        );
    }

    #[test]
    fn fan_shares_first_vertex() {
        assert_eq!(
            triangulate(PrimitiveTopology::TriangleFan, &[0, 1, 2, 3]),
            Some(vec![0, 1, 2, 0, 2, 3])
        );
        assert_eq!(triangulate(PrimitiveTopology::TriangleFan, &[]), Some(Vec::new()));
    }

    #[test]
    fn lines_and_points_are_rejected() {
        assert_eq!(triangulate(PrimitiveTopology::Lines, &[0, 1]), None);
        assert_eq!(triangulate(PrimitiveTopology::Points, &[0]), None);
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = load(Path::new("does/not/exist.gltf"), true).unwrap_err();
        match err {
            ImportError::Gltf { path, .. } => assert_eq!(path, Path::new("does/not/exist.gltf")),
            other => panic!("expected gltf error, got {other:?}"),
        }
    }
}
