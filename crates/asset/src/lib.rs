//! Asset packers: shader programs and meshes in the engine's flat binary layouts.
//! Both formats are little-endian with no alignment padding.

mod bytes;
pub mod error;
pub mod mesh;
pub mod scene;
pub mod shader;
pub mod write;

pub use error::AssetError;
pub use mesh::{MeshAsset, MeshVertex};
pub use scene::{MeshChannel, Scene, SceneMesh};
pub use shader::{AttributeDeclaration, AttributeType, ShaderAsset, ShaderStage};
pub use write::write_atomic;
