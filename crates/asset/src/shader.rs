//! Shader program asset: attribute table followed by vertex and fragment bytecode.
//!
//! Layout (little-endian, no padding):
//! - `attribute_count`: i32
//! - per attribute: name (i32 byte length + UTF-8), type ordinal (u32), count (u32)
//! - `vertex_len`: u32, then `vertex_len` bytes
//! - `fragment_len`: u32, then `fragment_len` bytes

use std::{fmt, str::FromStr};

use crate::{
    bytes::{ByteReader, ByteWriter},
    error::{AssetError, AssetResult},
};

/// Largest array multiplicity an attribute may declare.
pub const MAX_ATTRIBUTE_COUNT: u32 = 4;

/// Attribute type. The discriminant is the on-disk ordinal.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Sampler = 0,
    Vec4 = 1,
    Mat3 = 2,
    Mat4 = 3,
}

impl AttributeType {
    pub const ALL: [AttributeType; 4] = [Self::Sampler, Self::Vec4, Self::Mat3, Self::Mat4];

    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sampler => "sampler",
            Self::Vec4 => "vec4",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttributeType {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AssetError::UnknownAttributeTypeName(s.to_owned()))
    }
}

/// One named, typed entry of the attribute table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDeclaration {
    pub name: String,
    pub ty: AttributeType,
    pub count: u32,
}

impl AttributeDeclaration {
    /// Builds a declaration, rejecting empty names and counts outside `1..=4`.
    pub fn new(name: impl Into<String>, ty: AttributeType, count: u32) -> AssetResult<Self> {
        let decl = Self {
            name: name.into(),
            ty,
            count,
        };
        decl.validate()?;
        Ok(decl)
    }

    pub fn validate(&self) -> AssetResult<()> {
        if self.name.is_empty() {
            return Err(AssetError::EmptyAttributeName);
        }
        if !(1..=MAX_ATTRIBUTE_COUNT).contains(&self.count) {
            return Err(AssetError::AttributeCountOutOfRange {
                name: self.name.clone(),
                count: self.count,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Attribute table plus compiled bytecode for both stages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderAsset {
    pub attributes: Vec<AttributeDeclaration>,
    pub vertex_bytecode: Vec<u8>,
    pub fragment_bytecode: Vec<u8>,
}

impl ShaderAsset {
    pub fn new(
        attributes: Vec<AttributeDeclaration>,
        vertex_bytecode: Vec<u8>,
        fragment_bytecode: Vec<u8>,
    ) -> Self {
        Self {
            attributes,
            vertex_bytecode,
            fragment_bytecode,
        }
    }

    pub fn pack(&self) -> AssetResult<Vec<u8>> {
        pack_shader(
            &self.attributes,
            &self.vertex_bytecode,
            &self.fragment_bytecode,
        )
    }

    pub fn decode(bytes: &[u8]) -> AssetResult<Self> {
        decode_shader(bytes)
    }
}

/// Serialize an attribute table and both stages' bytecode.
///
/// Fails with [`AssetError::EmptyInput`] if either buffer is empty and with an
/// attribute error if any declaration would not survive [`AttributeDeclaration::validate`].
pub fn pack_shader(
    attributes: &[AttributeDeclaration],
    vertex_bytecode: &[u8],
    fragment_bytecode: &[u8],
) -> AssetResult<Vec<u8>> {
    if vertex_bytecode.is_empty() {
        return Err(AssetError::EmptyInput {
            stage: ShaderStage::Vertex,
        });
    }
    if fragment_bytecode.is_empty() {
        return Err(AssetError::EmptyInput {
            stage: ShaderStage::Fragment,
        });
    }
    for attr in attributes {
        attr.validate()?;
    }

    let table_len: usize = attributes.iter().map(|a| 12 + a.name.len()).sum();
    let mut out =
        ByteWriter::with_capacity(12 + table_len + vertex_bytecode.len() + fragment_bytecode.len());

    out.put_len_i32(attributes.len(), "attribute count")?;
    for attr in attributes {
        out.put_str(&attr.name)?;
        out.put_u32(attr.ty.ordinal());
        out.put_u32(attr.count);
    }

    out.put_len_u32(vertex_bytecode.len(), "vertex bytecode")?;
    out.put_bytes(vertex_bytecode);
    out.put_len_u32(fragment_bytecode.len(), "fragment bytecode")?;
    out.put_bytes(fragment_bytecode);

    Ok(out.into_inner())
}

/// Parse a packed shader program back into its parts.
pub fn decode_shader(bytes: &[u8]) -> AssetResult<ShaderAsset> {
    let mut reader = ByteReader::new(bytes);

    let count = reader.read_len_i32("attribute count")?;
    // Every entry takes at least 12 bytes; cap the preallocation accordingly.
    let mut attributes = Vec::with_capacity(count.min(reader.remaining() / 12));
    for _ in 0..count {
        let name = reader.read_str()?;
        let ordinal = reader.read_u32("attribute type")?;
        let ty = AttributeType::from_ordinal(ordinal)
            .ok_or(AssetError::UnknownAttributeType(ordinal))?;
        let multiplicity = reader.read_u32("attribute multiplicity")?;
        let attribute = AttributeDeclaration {
            name,
            ty,
            count: multiplicity,
        };
        attribute.validate()?;
        attributes.push(attribute);
    }

    let vertex_len = reader.read_u32("vertex bytecode length")? as usize;
    let vertex_bytecode = reader.take(vertex_len, "vertex bytecode")?.to_vec();
    let fragment_len = reader.read_u32("fragment bytecode length")? as usize;
    let fragment_bytecode = reader.take(fragment_len, "fragment bytecode")?.to_vec();
    reader.finish()?;

    Ok(ShaderAsset {
        attributes,
        vertex_bytecode,
        fragment_bytecode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str, ty: AttributeType, count: u32) -> AttributeDeclaration {
        AttributeDeclaration::new(name, ty, count).expect("valid attribute")
    }

    #[test]
    fn single_attribute_layout() {
        let attrs = vec![attr("uColor", AttributeType::Vec4, 1)];
        let vs: Vec<u8> = (0..10).collect();
        let fs: Vec<u8> = (100..120).collect();
        let bytes = pack_shader(&attrs, &vs, &fs).expect("pack");

        // count + (len + "uColor" + type + count) + vs block + fs block
        assert_eq!(bytes.len(), 4 + (4 + 6 + 4 + 4) + (4 + 10) + (4 + 20));
        assert_eq!(i32::from_le_bytes(bytes[0..4].try_into().unwrap()), 1);
        assert_eq!(&bytes[4..8], &6i32.to_le_bytes());
        assert_eq!(&bytes[8..14], b"uColor");
        assert_eq!(&bytes[14..18], &1u32.to_le_bytes());
        assert_eq!(&bytes[18..22], &1u32.to_le_bytes());
        assert_eq!(&bytes[22..26], &10u32.to_le_bytes());
        assert_eq!(&bytes[26..36], vs.as_slice());
        assert_eq!(&bytes[36..40], &20u32.to_le_bytes());
        assert_eq!(&bytes[40..], fs.as_slice());
    }

    #[test]
    fn empty_table_with_one_byte_stages() {
        let bytes = pack_shader(&[], &[0xAA], &[0xBB]).expect("pack");
        assert_eq!(bytes.len(), 14);
        assert_eq!(bytes, [0, 0, 0, 0, 1, 0, 0, 0, 0xAA, 1, 0, 0, 0, 0xBB]);
    }

    #[test]
    fn empty_vertex_bytecode_is_rejected() {
        let err = pack_shader(&[], &[], &[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            AssetError::EmptyInput {
                stage: ShaderStage::Vertex
            }
        ));
    }

    #[test]
    fn empty_fragment_bytecode_is_rejected() {
        let err = pack_shader(&[], &[1], &[]).unwrap_err();
        assert!(matches!(
            err,
            AssetError::EmptyInput {
                stage: ShaderStage::Fragment
            }
        ));
    }

    #[test]
    fn constructor_rejects_bad_counts_and_names() {
        assert!(matches!(
            AttributeDeclaration::new("u", AttributeType::Mat4, 0),
            Err(AssetError::AttributeCountOutOfRange { count: 0, .. })
        ));
        assert!(matches!(
            AttributeDeclaration::new("u", AttributeType::Mat4, 5),
            Err(AssetError::AttributeCountOutOfRange { count: 5, .. })
        ));
        assert!(matches!(
            AttributeDeclaration::new("", AttributeType::Vec4, 1),
            Err(AssetError::EmptyAttributeName)
        ));
        assert!(AttributeDeclaration::new("u", AttributeType::Mat4, 4).is_ok());
    }

    #[test]
    fn packer_rejects_unvalidated_count() {
        let bad = AttributeDeclaration {
            name: "uBones".into(),
            ty: AttributeType::Mat4,
            count: 7,
        };
        let err = pack_shader(&[bad], &[1], &[2]).unwrap_err();
        assert!(matches!(
            err,
            AssetError::AttributeCountOutOfRange { count: 7, .. }
        ));
    }

    #[test]
    fn round_trip_preserves_order_and_lengths() {
        let types = AttributeType::ALL;
        let attributes: Vec<_> = (0..100u32)
            .map(|i| {
                attr(
                    &format!("a_{i}_ünï"),
                    types[(i % 4) as usize],
                    i % MAX_ATTRIBUTE_COUNT + 1,
                )
            })
            .collect();
        let asset = ShaderAsset::new(attributes, vec![7; 333], vec![0, 255, 0, 1]);

        let decoded = ShaderAsset::decode(&asset.pack().unwrap()).unwrap();
        assert_eq!(decoded, asset);
    }

    #[test]
    fn round_trip_without_attributes() {
        let asset = ShaderAsset::new(Vec::new(), vec![1], vec![2, 3]);
        assert_eq!(ShaderAsset::decode(&asset.pack().unwrap()).unwrap(), asset);
    }

    #[test]
    fn packing_is_deterministic() {
        let asset = ShaderAsset::new(
            vec![
                attr("s_tex", AttributeType::Sampler, 1),
                attr("u_model", AttributeType::Mat3, 2),
            ],
            b"vs-bytecode".to_vec(),
            b"fs-bytecode".to_vec(),
        );
        assert_eq!(asset.pack().unwrap(), asset.pack().unwrap());
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let mut bytes = pack_shader(&[attr("u", AttributeType::Vec4, 1)], &[1], &[1]).unwrap();
        // type ordinal sits after count (4) + name length (4) + "u" (1)
        bytes[9..13].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            decode_shader(&bytes),
            Err(AssetError::UnknownAttributeType(9))
        ));
    }

    #[test]
    fn decode_rejects_out_of_range_count() {
        let mut bytes = pack_shader(&[attr("u", AttributeType::Vec4, 1)], &[1], &[1]).unwrap();
        // multiplicity follows the type ordinal
        bytes[13..17].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            decode_shader(&bytes),
            Err(AssetError::AttributeCountOutOfRange { count: 0, .. })
        ));

        bytes[13..17].copy_from_slice(&5u32.to_le_bytes());
        assert!(matches!(
            decode_shader(&bytes),
            Err(AssetError::AttributeCountOutOfRange { count: 5, .. })
        ));
    }

    #[test]
    fn decode_rejects_empty_name() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&AttributeType::Vec4.ordinal().to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        for stage in [[0xAAu8], [0xBB]] {
            bytes.extend_from_slice(&1u32.to_le_bytes());
            bytes.extend_from_slice(&stage);
        }
        assert!(matches!(
            decode_shader(&bytes),
            Err(AssetError::EmptyAttributeName)
        ));
    }

    #[test]
    fn decode_rejects_truncated_and_trailing_data() {
        let bytes = pack_shader(&[attr("u", AttributeType::Vec4, 1)], &[1, 2], &[3]).unwrap();
        assert!(matches!(
            decode_shader(&bytes[..bytes.len() - 1]),
            Err(AssetError::Truncated { .. })
        ));

        let mut padded = bytes.clone();
        padded.push(0);
        assert!(matches!(
            decode_shader(&padded),
            Err(AssetError::TrailingBytes(1))
        ));
    }

    #[test]
    fn attribute_type_parsing() {
        assert_eq!("Vec4".parse::<AttributeType>().unwrap(), AttributeType::Vec4);
        assert_eq!(
            " sampler ".parse::<AttributeType>().unwrap(),
            AttributeType::Sampler
        );
        assert!(matches!(
            "vec3".parse::<AttributeType>(),
            Err(AssetError::UnknownAttributeTypeName(_))
        ));
        for ty in AttributeType::ALL {
            assert_eq!(AttributeType::from_ordinal(ty.ordinal()), Some(ty));
        }
        assert_eq!(AttributeType::from_ordinal(4), None);
    }
}
