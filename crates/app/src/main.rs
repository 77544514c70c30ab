//! Entry point for assetpack.
//! Each invocation performs one pack operation; any error aborts it with nothing written.

use anyhow::{Context, Result};
use asset::{MeshAsset, ShaderAsset, write_atomic};
use clap::Parser;
use compiler::ShaderCompiler;

mod cli;

use cli::{AssetKind, Cli, Command, InspectArgs, MeshArgs, ShaderArgs};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Shader(args) => run_shader(args),
        Command::Mesh(args) => run_mesh(args),
        Command::Inspect(args) => run_inspect(args),
    }
}

fn run_shader(args: ShaderArgs) -> Result<()> {
    build_shader_program(&args)?;
    log::info!("Compilation successful");
    Ok(())
}

/// Compile, pack and save. The output is only touched once the packed bytes exist.
fn build_shader_program(args: &ShaderArgs) -> Result<()> {
    let compiler = ShaderCompiler::new(args.compiler.to_config());
    log::info!(
        "Building shader program: vs={} fs={} varying={} ({} attributes, platform {})",
        args.vertex.display(),
        args.fragment.display(),
        args.varying.display(),
        args.attributes.len(),
        compiler.config().platform
    );

    let asset = compiler.build(&args.sources(), args.attributes.clone())?;
    let bytes = asset.pack()?;
    write_atomic(&args.output, &bytes)
        .with_context(|| format!("Failed to save shader program {}", args.output.display()))?;
    Ok(())
}

fn run_mesh(args: MeshArgs) -> Result<()> {
    let scene = importer::import_scene(&args.input, &args.import_options())
        .with_context(|| format!("Failed to import mesh {}", args.input.display()))?;
    let mesh = MeshAsset::from_scene(&scene)
        .with_context(|| format!("Cannot convert {}", args.input.display()))?;
    let bytes = mesh.pack()?;
    write_atomic(&args.output, &bytes)
        .with_context(|| format!("Failed to save mesh {}", args.output.display()))?;

    log::info!(
        "Converted mesh: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    match args.kind {
        AssetKind::Shader => {
            let asset = ShaderAsset::decode(&bytes)
                .with_context(|| format!("{} is not a shader program", args.file.display()))?;
            log::info!(
                "{}: {} attributes, vertex {} bytes, fragment {} bytes",
                args.file.display(),
                asset.attributes.len(),
                asset.vertex_bytecode.len(),
                asset.fragment_bytecode.len()
            );
            for (i, attr) in asset.attributes.iter().enumerate() {
                log::info!("  [{}] {} {} x{}", i, attr.name, attr.ty, attr.count);
            }
        }
        AssetKind::Mesh => {
            let mesh = MeshAsset::decode(&bytes)
                .with_context(|| format!("{} is not a mesh", args.file.display()))?;
            log::info!(
                "{}: {} vertices, {} indices ({} triangles)",
                args.file.display(),
                mesh.vertices.len(),
                mesh.indices.len(),
                mesh.triangle_count()
            );
            if let Some((min, max)) = bounds(&mesh) {
                log::info!("  bounds min={:?} max={:?}", min, max);
            }
            if let Err(e) = mesh.validate() {
                log::warn!("  {}", e);
            }
        }
    }
    Ok(())
}

fn bounds(mesh: &MeshAsset) -> Option<([f32; 3], [f32; 3])> {
    let first = mesh.vertices.first()?.position;
    Some(mesh.vertices.iter().fold((first, first), |(mut min, mut max), v| {
        for axis in 0..3 {
            min[axis] = min[axis].min(v.position[axis]);
            max[axis] = max[axis].max(v.position[axis]);
        }
        (min, max)
    }))
}
