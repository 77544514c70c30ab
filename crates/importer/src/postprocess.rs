//! Mesh clean-up run between decoding and packing.

use asset::SceneMesh;
use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::{ImportError, ImportOptions};

/// Squared cross-product length under which a triangle counts as zero-area.
const DEGENERATE_AREA_EPSILON: f32 = 1e-12;

/// Run the enabled per-mesh steps: degenerate removal, tangent generation,
/// vertex cache ordering, winding flip.
pub fn apply(mesh: &mut SceneMesh, options: &ImportOptions) {
    if options.remove_degenerates {
        let removed = remove_degenerates(mesh);
        if removed > 0 {
            log::debug!("Removed {} degenerate triangles from '{}'", removed, mesh.label());
        }
    }
    if options.generate_tangents && mesh.tangents.is_none() {
        if generate_tangents(mesh) {
            log::debug!("Generated tangents for '{}'", mesh.label());
        } else {
            log::warn!(
                "Cannot generate tangents for '{}' without texture coordinates and normals",
                mesh.label()
            );
        }
    }
    if options.optimize_cache && !optimize_vertex_cache(mesh) {
        log::debug!("Skipped cache optimisation for '{}'", mesh.label());
    }
    if options.flip_winding {
        flip_winding(mesh);
    }
}

/// Bake `matrix` into positions, normals and tangents. A mirroring transform
/// also reverses the winding so front faces stay front faces.
pub fn transform(mesh: &mut SceneMesh, matrix: &Mat4) {
    if *matrix == Mat4::IDENTITY {
        return;
    }

    for p in &mut mesh.positions {
        *p = matrix.transform_point3(Vec3::from(*p)).to_array();
    }

    let linear = Mat3::from_mat4(*matrix);
    let normal_matrix = if linear.determinant().abs() > f32::EPSILON {
        linear.inverse().transpose()
    } else {
        linear
    };
    let direction = |m: &Mat3, v: &mut [f32; 3]| {
        *v = (*m * Vec3::from(*v)).normalize_or_zero().to_array();
    };
    for n in mesh.normals.iter_mut().flatten() {
        direction(&normal_matrix, n);
    }
    for t in mesh.tangents.iter_mut().flatten() {
        direction(&linear, t);
    }

    if linear.determinant() < 0.0 {
        flip_winding(mesh);
    }
}

/// Concatenate meshes into one, re-basing each mesh's indices past the
/// vertices before it. A channel survives only if every mesh carries it.
pub fn merge_meshes(meshes: Vec<SceneMesh>) -> Result<SceneMesh, ImportError> {
    let total: usize = meshes.iter().map(SceneMesh::vertex_count).sum();
    if u32::try_from(total).is_err() {
        return Err(ImportError::TooManyVertices {
            mesh: "merged".into(),
            count: total,
        });
    }

    let texcoords = merge_channel(&meshes, |m| m.texcoords.as_ref());
    let normals = merge_channel(&meshes, |m| m.normals.as_ref());
    let tangents = merge_channel(&meshes, |m| m.tangents.as_ref());

    let mut positions = Vec::with_capacity(total);
    let mut indices = Vec::with_capacity(meshes.iter().map(|m| m.indices.len()).sum());
    for mesh in &meshes {
        // fits: total was checked above
        let base = positions.len() as u32;
        indices.extend(mesh.indices.iter().map(|&i| i.saturating_add(base)));
        positions.extend_from_slice(&mesh.positions);
    }

    log::debug!(
        "Merged {} meshes: {} vertices, {} triangles",
        meshes.len(),
        positions.len(),
        indices.len() / 3
    );

    Ok(SceneMesh {
        name: meshes.into_iter().next().and_then(|m| m.name),
        positions,
        texcoords,
        normals,
        tangents,
        indices,
    })
}

fn merge_channel<T: Copy>(
    meshes: &[SceneMesh],
    channel: impl Fn(&SceneMesh) -> Option<&Vec<T>>,
) -> Option<Vec<T>> {
    let mut merged = Vec::new();
    for mesh in meshes {
        let values = channel(mesh).filter(|v| v.len() == mesh.vertex_count())?;
        merged.extend_from_slice(values);
    }
    Some(merged)
}

/// Reorder triangles for post-transform vertex cache reuse. Vertex data and
/// each triangle's winding are untouched. Returns `false` when the index list
/// is empty or not a valid triangle list for this mesh.
pub fn optimize_vertex_cache(mesh: &mut SceneMesh) -> bool {
    let count = mesh.vertex_count();
    if mesh.indices.is_empty()
        || mesh.indices.len() % 3 != 0
        || mesh.indices.iter().any(|&i| i as usize >= count)
    {
        return false;
    }
    mesh.indices = meshopt::optimize_vertex_cache(&mesh.indices, count);
    true
}

/// Drop triangles that repeat a vertex, reference a missing one, or have no area.
/// Returns the number of triangles removed.
pub fn remove_degenerates(mesh: &mut SceneMesh) -> usize {
    let positions = &mesh.positions;
    let before = mesh.indices.len() / 3;

    let kept: Vec<u32> = mesh
        .indices
        .chunks_exact(3)
        .filter(|tri| {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            if a == b || b == c || a == c {
                return false;
            }
            let fetch = |i: u32| positions.get(i as usize).copied().map(Vec3::from);
            match (fetch(a), fetch(b), fetch(c)) {
                (Some(p0), Some(p1), Some(p2)) => {
                    (p1 - p0).cross(p2 - p0).length_squared() > DEGENERATE_AREA_EPSILON
                }
                _ => false,
            }
        })
        .flatten()
        .copied()
        .collect();

    mesh.indices = kept;
    before - mesh.indices.len() / 3
}

/// Per-vertex tangents from UV gradients, orthogonalised against the normal.
/// Returns `false` (leaving the mesh alone) when UVs or normals are missing.
pub fn generate_tangents(mesh: &mut SceneMesh) -> bool {
    let (Some(uvs), Some(normals)) = (&mesh.texcoords, &mesh.normals) else {
        return false;
    };
    let count = mesh.positions.len();
    if uvs.len() != count || normals.len() != count {
        return false;
    }

    let mut accum = vec![Vec3::ZERO; count];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= count || b >= count || c >= count {
            continue;
        }
        let p0 = Vec3::from(mesh.positions[a]);
        let e1 = Vec3::from(mesh.positions[b]) - p0;
        let e2 = Vec3::from(mesh.positions[c]) - p0;
        let uv0 = Vec2::from(uvs[a]);
        let d1 = Vec2::from(uvs[b]) - uv0;
        let d2 = Vec2::from(uvs[c]) - uv0;

        let det = d1.x * d2.y - d2.x * d1.y;
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let tangent = (e1 * d2.y - e2 * d1.y) / det;
        accum[a] += tangent;
        accum[b] += tangent;
        accum[c] += tangent;
    }

    let tangents = accum
        .into_iter()
        .zip(normals)
        .map(|(t, n)| {
            let n = Vec3::from(*n).normalize_or_zero();
            // Gram-Schmidt; fall back to any perpendicular when UVs give nothing
            (t - n * n.dot(t))
                .try_normalize()
                .unwrap_or_else(|| fallback_tangent(n))
                .to_array()
        })
        .collect();

    mesh.tangents = Some(tangents);
    true
}

fn fallback_tangent(normal: Vec3) -> Vec3 {
    if normal == Vec3::ZERO {
        Vec3::X
    } else {
        normal.any_orthonormal_vector()
    }
}

/// Reverse triangle winding (clockwise <-> counter-clockwise).
pub fn flip_winding(mesh: &mut SceneMesh) {
    for tri in mesh.indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
}

/// Triangles rotated to start at their smallest index, then sorted, so lists
/// that differ only in triangle order compare equal.
#[cfg(test)]
pub(crate) fn canonical_triangles(indices: &[u32]) -> Vec<[u32; 3]> {
    let mut triangles: Vec<[u32; 3]> = indices
        .chunks_exact(3)
        .map(|t| {
            let mut tri = [t[0], t[1], t[2]];
            let lowest = (0..3).min_by_key(|&k| tri[k]).unwrap_or(0);
            tri.rotate_left(lowest);
            tri
        })
        .collect();
    triangles.sort_unstable();
    triangles
}
