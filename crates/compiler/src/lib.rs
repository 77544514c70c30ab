//! Drives the external shader compiler over a vertex/fragment pair.
//!
//! The compiler reports problems on stdout: any captured text means the stage
//! failed, whatever the exit status. Stages run one after another and their
//! outputs live in a temporary directory that is removed when the build ends.

use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use asset::{AttributeDeclaration, ShaderAsset, ShaderStage};
use thiserror::Error;

mod config;

pub use config::CompilerConfig;
use config::{stage_flag, stage_output_name};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compile failed, {stage} shader compiler message:\n{diagnostics}")]
    Failure {
        stage: ShaderStage,
        diagnostics: String,
    },

    #[error("failed to launch shader compiler '{}'", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {stage} shader output {}", path.display())]
    ReadOutput {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create compiler work directory")]
    WorkDir(#[source] io::Error),
}

/// The three source files a shader program is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
    pub varying_def: PathBuf,
}

impl ShaderSources {
    pub fn stage(&self, stage: ShaderStage) -> &Path {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ShaderCompiler {
    config: CompilerConfig,
}

impl ShaderCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Command-line arguments for one stage.
    pub fn stage_args(
        &self,
        stage: ShaderStage,
        input: &Path,
        output: &Path,
        varying_def: &Path,
    ) -> Vec<OsString> {
        vec![
            "-f".into(),
            input.into(),
            "-o".into(),
            output.into(),
            "--varyingdef".into(),
            varying_def.into(),
            "--type".into(),
            stage_flag(stage).into(),
            "--platform".into(),
            self.config.platform.as_str().into(),
            "-p".into(),
            self.config.profile(stage).into(),
            "-i".into(),
            self.config.include_dir.as_os_str().to_owned(),
        ]
    }

    /// Compile one stage into `work_dir` and return its bytecode.
    ///
    /// A compiler that stays silent but writes no output yields an empty buffer;
    /// the packer rejects that later.
    pub fn compile_stage(
        &self,
        stage: ShaderStage,
        input: &Path,
        varying_def: &Path,
        work_dir: &Path,
    ) -> Result<Vec<u8>, CompileError> {
        let output_path = work_dir.join(stage_output_name(stage));
        let args = self.stage_args(stage, input, &output_path, varying_def);
        log::debug!(
            "Running {} {:?}",
            self.config.compiler.display(),
            args
        );

        let output = Command::new(&self.config.compiler)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| CompileError::Launch {
                program: self.config.compiler.clone(),
                source,
            })?;

        let diagnostics = String::from_utf8_lossy(&output.stdout);
        if !diagnostics.is_empty() {
            return Err(CompileError::Failure {
                stage,
                diagnostics: diagnostics.into_owned(),
            });
        }
        if !output.status.success() {
            log::warn!(
                "Shader compiler exited with {} for {} stage but printed nothing; treating as success",
                output.status,
                stage
            );
        }

        match fs::read(&output_path) {
            Ok(bytes) => {
                log::info!("Compiled {} shader ({} bytes)", stage, bytes.len());
                Ok(bytes)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("Shader compiler produced no {} output file", stage);
                Ok(Vec::new())
            }
            Err(source) => Err(CompileError::ReadOutput {
                stage,
                path: output_path,
                source,
            }),
        }
    }

    /// Compile vertex then fragment stage. Fragment never starts if vertex failed.
    pub fn compile_program(
        &self,
        sources: &ShaderSources,
    ) -> Result<(Vec<u8>, Vec<u8>), CompileError> {
        let work_dir = tempfile::tempdir().map_err(CompileError::WorkDir)?;

        let vertex = self.compile_stage(
            ShaderStage::Vertex,
            sources.stage(ShaderStage::Vertex),
            &sources.varying_def,
            work_dir.path(),
        )?;
        let fragment = self.compile_stage(
            ShaderStage::Fragment,
            sources.stage(ShaderStage::Fragment),
            &sources.varying_def,
            work_dir.path(),
        )?;

        Ok((vertex, fragment))
    }

    /// Compile both stages and assemble the asset with the given attribute table.
    pub fn build(
        &self,
        sources: &ShaderSources,
        attributes: Vec<AttributeDeclaration>,
    ) -> Result<ShaderAsset, CompileError> {
        let (vertex, fragment) = self.compile_program(sources)?;
        Ok(ShaderAsset::new(attributes, vertex, fragment))
    }
}
