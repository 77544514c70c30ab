//! External compiler settings.

use std::path::PathBuf;

use asset::ShaderStage;

/// How to invoke the external shader compiler. Defaults target D3D11 on Windows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Executable name or path; bare names are resolved through `PATH`.
    pub compiler: PathBuf,
    pub platform: String,
    pub vertex_profile: String,
    pub fragment_profile: String,
    pub include_dir: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from("shaderc"),
            platform: "windows".to_owned(),
            vertex_profile: "vs_5_0".to_owned(),
            fragment_profile: "ps_5_0".to_owned(),
            include_dir: PathBuf::from("../Content/shaders"),
        }
    }
}

impl CompilerConfig {
    pub fn profile(&self, stage: ShaderStage) -> &str {
        match stage {
            ShaderStage::Vertex => &self.vertex_profile,
            ShaderStage::Fragment => &self.fragment_profile,
        }
    }
}

/// Value of the compiler's `--type` flag.
pub(crate) fn stage_flag(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "v",
        ShaderStage::Fragment => "f",
    }
}

/// Stage-local output file name inside the build's work directory.
pub(crate) fn stage_output_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "VSOutput.bin",
        ShaderStage::Fragment => "FSOutput.bin",
    }
}
