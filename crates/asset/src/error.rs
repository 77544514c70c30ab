//! Errors raised while packing, unpacking or persisting assets.

use std::{io, path::PathBuf, string::FromUtf8Error};

use thiserror::Error;

use crate::{scene::MeshChannel, shader::ShaderStage};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{stage} bytecode is empty; compile step produced no output")]
    EmptyInput { stage: ShaderStage },

    #[error("attribute name must not be empty")]
    EmptyAttributeName,

    #[error("attribute '{name}' has count {count}; expected 1..=4")]
    AttributeCountOutOfRange { name: String, count: u32 },

    #[error("unknown attribute type ordinal {0}")]
    UnknownAttributeType(u32),

    #[error("unknown attribute type '{0}' (expected sampler, vec4, mat3 or mat4)")]
    UnknownAttributeTypeName(String),

    #[error("scene contains no meshes")]
    EmptyMesh,

    #[error("mesh has no {0} channel")]
    MissingChannel(MeshChannel),

    #[error("{channel} channel has {actual} entries but mesh has {expected} positions")]
    ChannelLengthMismatch {
        channel: MeshChannel,
        expected: usize,
        actual: usize,
    },

    #[error("index count {0} is not a multiple of 3")]
    InvalidIndices(usize),

    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        index: u32,
        position: usize,
        vertex_count: usize,
    },

    #[error("{what} of {len} does not fit the format's length field")]
    TooLarge { what: &'static str, len: usize },

    #[error("unexpected end of data reading {what}: need {needed} bytes, {remaining} left")]
    Truncated {
        what: &'static str,
        needed: usize,
        remaining: usize,
    },

    #[error("negative {what}: {value}")]
    NegativeLength { what: &'static str, value: i32 },

    #[error("attribute name is not valid UTF-8")]
    InvalidName(#[source] FromUtf8Error),

    #[error("{0} trailing bytes after end of asset")]
    TrailingBytes(usize),

    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type AssetResult<T> = Result<T, AssetError>;
