//! Mesh asset: interleaved vertices followed by a triangle index list.
//!
//! Layout (little-endian, no padding):
//! - `vertex_count`: u32
//! - per vertex: position xyz, texcoord xy, normal xyz, tangent xyz (11 x f32)
//! - `index_count`: u32 (indices, not triangles)
//! - `index_count` x u32

use bytemuck::{Pod, Zeroable};

use crate::{
    bytes::{ByteReader, ByteWriter},
    error::{AssetError, AssetResult},
    scene::{MeshChannel, Scene, SceneMesh},
};

/// Bytes per packed vertex.
pub const VERTEX_STRIDE: usize = std::mem::size_of::<MeshVertex>();

/// Vertex with position/texcoord/normal/tangent, in object space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
}

const _: () = assert!(VERTEX_STRIDE == 44);

impl MeshVertex {
    pub fn new(position: [f32; 3], texcoord: [f32; 2], normal: [f32; 3], tangent: [f32; 3]) -> Self {
        Self {
            position,
            texcoord,
            normal,
            tangent,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshAsset {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshAsset {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Build from the first mesh of an imported scene. Further meshes are ignored.
    pub fn from_scene(scene: &Scene) -> AssetResult<Self> {
        let (first, rest) = scene.meshes.split_first().ok_or(AssetError::EmptyMesh)?;
        if !rest.is_empty() {
            log::warn!(
                "Scene has {} meshes; only the first ('{}') is packed",
                scene.meshes.len(),
                first.label()
            );
        }
        Self::from_scene_mesh(first)
    }

    pub fn from_scene_mesh(mesh: &SceneMesh) -> AssetResult<Self> {
        let expected = mesh.positions.len();
        let texcoords = require_channel(&mesh.texcoords, MeshChannel::TexCoord, expected)?;
        let normals = require_channel(&mesh.normals, MeshChannel::Normal, expected)?;
        let tangents = require_channel(&mesh.tangents, MeshChannel::Tangent, expected)?;

        let vertices = mesh
            .positions
            .iter()
            .zip(texcoords)
            .zip(normals)
            .zip(tangents)
            .map(|(((p, t), n), tg)| MeshVertex::new(*p, *t, *n, *tg))
            .collect();

        Ok(Self::new(vertices, mesh.indices.clone()))
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn validate(&self) -> AssetResult<()> {
        validate_indices(self.vertices.len(), &self.indices)
    }

    pub fn pack(&self) -> AssetResult<Vec<u8>> {
        pack_mesh(&self.vertices, &self.indices)
    }

    pub fn decode(bytes: &[u8]) -> AssetResult<Self> {
        decode_mesh(bytes)
    }
}

fn require_channel<'a, T>(
    channel: &'a Option<Vec<T>>,
    which: MeshChannel,
    expected: usize,
) -> AssetResult<&'a [T]> {
    let values = channel
        .as_deref()
        .ok_or(AssetError::MissingChannel(which))?;
    if values.len() != expected {
        return Err(AssetError::ChannelLengthMismatch {
            channel: which,
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

/// Index list must be whole triangles referencing existing vertices.
pub fn validate_indices(vertex_count: usize, indices: &[u32]) -> AssetResult<()> {
    if indices.len() % 3 != 0 {
        return Err(AssetError::InvalidIndices(indices.len()));
    }
    match indices
        .iter()
        .position(|&index| index as usize >= vertex_count)
    {
        Some(position) => Err(AssetError::IndexOutOfRange {
            index: indices[position],
            position,
            vertex_count,
        }),
        None => Ok(()),
    }
}

/// Serialize vertices and indices after validating the index list.
pub fn pack_mesh(vertices: &[MeshVertex], indices: &[u32]) -> AssetResult<Vec<u8>> {
    validate_indices(vertices.len(), indices)?;

    let mut out = ByteWriter::with_capacity(8 + vertices.len() * VERTEX_STRIDE + indices.len() * 4);
    out.put_len_u32(vertices.len(), "vertex count")?;
    // repr(C) field order is the on-disk float order.
    for &value in bytemuck::cast_slice::<MeshVertex, f32>(vertices) {
        out.put_f32(value);
    }
    out.put_len_u32(indices.len(), "index count")?;
    for &index in indices {
        out.put_u32(index);
    }
    Ok(out.into_inner())
}

pub fn decode_mesh(bytes: &[u8]) -> AssetResult<MeshAsset> {
    let mut reader = ByteReader::new(bytes);

    let vertex_count = reader.read_u32("vertex count")? as usize;
    let vertex_bytes = vertex_count
        .checked_mul(VERTEX_STRIDE)
        .ok_or(AssetError::TooLarge {
            what: "vertex count",
            len: vertex_count,
        })?;
    let mut vertex_reader = ByteReader::new(reader.take(vertex_bytes, "vertices")?);
    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let mut floats = [0f32; VERTEX_STRIDE / 4];
        for value in &mut floats {
            *value = vertex_reader.read_f32("vertex")?;
        }
        vertices.push(bytemuck::cast(floats));
    }

    let index_count = reader.read_u32("index count")? as usize;
    let index_bytes = index_count.checked_mul(4).ok_or(AssetError::TooLarge {
        what: "index count",
        len: index_count,
    })?;
    let mut index_reader = ByteReader::new(reader.take(index_bytes, "indices")?);
    let indices = (0..index_count)
        .map(|_| index_reader.read_u32("index"))
        .collect::<AssetResult<Vec<_>>>()?;
    reader.finish()?;

    Ok(MeshAsset::new(vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(i: usize) -> MeshVertex {
        let f = i as f32;
        MeshVertex::new(
            [f, f + 0.5, -f],
            [f * 0.1, 1.0 - f * 0.1],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, f],
        )
    }

    fn triangle() -> MeshAsset {
        MeshAsset::new((0..3).map(vertex).collect(), vec![0, 1, 2])
    }

    fn full_scene_mesh(name: &str) -> SceneMesh {
        SceneMesh {
            name: Some(name.to_owned()),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            texcoords: Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
            normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
            tangents: Some(vec![[1.0, 0.0, 0.0]; 3]),
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn triangle_layout() {
        let mesh = triangle();
        let bytes = mesh.pack().expect("pack");
        assert_eq!(bytes.len(), 4 + 3 * 44 + 4 + 3 * 4);
        assert_eq!(&bytes[0..4], &3u32.to_le_bytes());

        // second vertex starts at 4 + 44; floats in position/uv/normal/tangent order
        let v1 = &bytes[48..92];
        let floats: Vec<f32> = v1
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        let v = vertex(1);
        let expected: Vec<f32> = [
            &v.position[..],
            &v.texcoord[..],
            &v.normal[..],
            &v.tangent[..],
        ]
        .concat();
        assert_eq!(floats, expected);

        assert_eq!(&bytes[136..140], &3u32.to_le_bytes());
        assert_eq!(&bytes[140..144], &0u32.to_le_bytes());
        assert_eq!(&bytes[148..152], &2u32.to_le_bytes());
    }

    #[test]
    fn empty_mesh_packs_to_two_counts() {
        let bytes = MeshAsset::default().pack().unwrap();
        assert_eq!(bytes, [0u8; 8]);
        assert_eq!(MeshAsset::decode(&bytes).unwrap(), MeshAsset::default());
    }

    #[test]
    fn round_trip() {
        let vertices: Vec<_> = (0..64).map(vertex).collect();
        let indices: Vec<u32> = (0..63).flat_map(|i| [i, i + 1, 63 - i]).collect();
        let mesh = MeshAsset::new(vertices, indices);

        let decoded = MeshAsset::decode(&mesh.pack().unwrap()).unwrap();
        assert_eq!(decoded, mesh);
        assert_eq!(decoded.triangle_count(), 63);
    }

    #[test]
    fn packing_is_deterministic() {
        let mesh = triangle();
        assert_eq!(mesh.pack().unwrap(), mesh.pack().unwrap());
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = triangle();
        mesh.indices = vec![0, 1, 3];
        assert!(matches!(
            mesh.pack(),
            Err(AssetError::IndexOutOfRange {
                index: 3,
                position: 2,
                vertex_count: 3
            })
        ));
    }

    #[test]
    fn partial_triangle_is_rejected() {
        let mut mesh = triangle();
        mesh.indices = vec![0, 1];
        assert!(matches!(mesh.pack(), Err(AssetError::InvalidIndices(2))));
    }

    #[test]
    fn decode_rejects_truncated_vertices() {
        let bytes = triangle().pack().unwrap();
        assert!(matches!(
            MeshAsset::decode(&bytes[..100]),
            Err(AssetError::Truncated {
                what: "vertices",
                ..
            })
        ));
    }

    #[test]
    fn decode_rejects_huge_counts_without_allocating() {
        let bytes = u32::MAX.to_le_bytes();
        assert!(MeshAsset::decode(&bytes).is_err());
    }

    #[test]
    fn from_scene_uses_first_mesh_only() {
        let mut second = full_scene_mesh("second");
        second.positions.push([5.0, 5.0, 5.0]);
        let scene = Scene::new(vec![full_scene_mesh("first"), second]);

        let mesh = MeshAsset::from_scene(&scene).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2].texcoord, [0.0, 1.0]);
        assert_eq!(mesh.indices, [0, 1, 2]);
    }

    #[test]
    fn from_scene_without_meshes_fails() {
        assert!(matches!(
            MeshAsset::from_scene(&Scene::default()),
            Err(AssetError::EmptyMesh)
        ));
    }

    #[test]
    fn missing_channels_are_reported() {
        let mut no_uv = full_scene_mesh("a");
        no_uv.texcoords = None;
        assert!(matches!(
            MeshAsset::from_scene_mesh(&no_uv),
            Err(AssetError::MissingChannel(MeshChannel::TexCoord))
        ));

        let mut no_normals = full_scene_mesh("b");
        no_normals.normals = None;
        assert!(matches!(
            MeshAsset::from_scene_mesh(&no_normals),
            Err(AssetError::MissingChannel(MeshChannel::Normal))
        ));

        let mut no_tangents = full_scene_mesh("c");
        no_tangents.tangents = None;
        assert!(matches!(
            MeshAsset::from_scene_mesh(&no_tangents),
            Err(AssetError::MissingChannel(MeshChannel::Tangent))
        ));
    }

    #[test]
    fn short_channel_is_reported() {
        let mut mesh = full_scene_mesh("short");
        mesh.normals = Some(vec![[0.0, 1.0, 0.0]; 2]);
        assert!(matches!(
            MeshAsset::from_scene_mesh(&mesh),
            Err(AssetError::ChannelLengthMismatch {
                channel: MeshChannel::Normal,
                expected: 3,
                actual: 2
            })
        ));
    }
}
