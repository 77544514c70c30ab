//! Command-line arguments.

use std::path::PathBuf;

use asset::{AttributeDeclaration, AttributeType};
use clap::{Args, Parser, Subcommand, ValueEnum};
use compiler::{CompilerConfig, ShaderSources};
use importer::ImportOptions;

#[derive(Debug, Parser)]
#[command(author, version, about = "Pack shader programs and meshes into engine assets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile a vertex/fragment pair and write a shader program asset
    Shader(ShaderArgs),
    /// Import a glTF mesh and write a mesh asset
    Mesh(MeshArgs),
    /// Decode an asset and print a summary
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct ShaderArgs {
    /// Vertex shader source
    #[arg(long = "vs")]
    pub vertex: PathBuf,

    /// Fragment shader source
    #[arg(long = "fs")]
    pub fragment: PathBuf,

    /// Varying definition file
    #[arg(long)]
    pub varying: PathBuf,

    /// Output asset path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Attribute as name:type:count, e.g. u_color:vec4:1 (repeatable, order kept)
    #[arg(long = "attr", value_name = "NAME:TYPE:COUNT", value_parser = parse_attribute)]
    pub attributes: Vec<AttributeDeclaration>,

    #[command(flatten)]
    pub compiler: CompilerArgs,
}

impl ShaderArgs {
    pub fn sources(&self) -> ShaderSources {
        ShaderSources {
            vertex: self.vertex.clone(),
            fragment: self.fragment.clone(),
            varying_def: self.varying.clone(),
        }
    }
}

/// Overrides for [`CompilerConfig`]; unset flags keep the defaults.
#[derive(Debug, Args)]
pub struct CompilerArgs {
    /// Shader compiler executable
    #[arg(long)]
    pub compiler: Option<PathBuf>,

    /// Target platform passed to the compiler
    #[arg(long)]
    pub platform: Option<String>,

    /// Vertex shader profile
    #[arg(long)]
    pub vs_profile: Option<String>,

    /// Fragment shader profile
    #[arg(long)]
    pub fs_profile: Option<String>,

    /// Shader include directory
    #[arg(long, short = 'i')]
    pub include: Option<PathBuf>,
}

impl CompilerArgs {
    pub fn to_config(&self) -> CompilerConfig {
        let defaults = CompilerConfig::default();
        CompilerConfig {
            compiler: self.compiler.clone().unwrap_or(defaults.compiler),
            platform: self.platform.clone().unwrap_or(defaults.platform),
            vertex_profile: self.vs_profile.clone().unwrap_or(defaults.vertex_profile),
            fragment_profile: self.fs_profile.clone().unwrap_or(defaults.fragment_profile),
            include_dir: self.include.clone().unwrap_or(defaults.include_dir),
        }
    }
}

#[derive(Debug, Args)]
pub struct MeshArgs {
    /// Source mesh (.gltf or .glb)
    pub input: PathBuf,

    /// Output asset path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Do not generate tangents for meshes that lack them
    #[arg(long)]
    pub no_tangents: bool,

    /// Keep the source triangle winding
    #[arg(long)]
    pub no_flip_winding: bool,

    /// Keep zero-area and repeated-vertex triangles
    #[arg(long)]
    pub keep_degenerates: bool,

    /// Import meshes in local space instead of applying node transforms
    #[arg(long)]
    pub no_pretransform: bool,

    /// Keep primitives separate (only the first is packed)
    #[arg(long)]
    pub no_merge: bool,

    /// Keep the source triangle order
    #[arg(long)]
    pub no_cache_optimize: bool,
}

impl MeshArgs {
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            pretransform: !self.no_pretransform,
            merge_meshes: !self.no_merge,
            generate_tangents: !self.no_tangents,
            remove_degenerates: !self.keep_degenerates,
            optimize_cache: !self.no_cache_optimize,
            flip_winding: !self.no_flip_winding,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AssetKind {
    Shader,
    Mesh,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    pub kind: AssetKind,
    pub file: PathBuf,
}

/// Parse `name:type:count`. Names may not contain ':'.
pub fn parse_attribute(raw: &str) -> Result<AttributeDeclaration, String> {
    let mut parts = raw.split(':');
    let (Some(name), Some(ty), Some(count), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected NAME:TYPE:COUNT, got '{raw}'"));
    };

    let ty: AttributeType = ty.parse().map_err(|e| format!("{e}"))?;
    let count: u32 = count
        .trim()
        .parse()
        .map_err(|_| "attribute count must be an integer value".to_owned())?;
    AttributeDeclaration::new(name.trim(), ty, count).map_err(|e| e.to_string())
}
