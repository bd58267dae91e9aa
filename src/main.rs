//! Command-line batch generator.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use bodygen::{
    composer_for, load_catalog, run_batch, Backend, BatchOptions, BodyKind, GeneratorOptions,
    TemplateSource, ToolchainSettings,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate articulated rigid bodies as URDF", long_about = None)]
struct Args {
    /// Body kind to generate: hammer, t_shape (or t)
    #[arg(long)]
    body: BodyKind,

    /// Glob of library meshes; omit to generate meshes procedurally
    #[arg(long = "obj")]
    obj_glob: Option<String>,

    /// Output root; one numbered subdirectory per body
    #[arg(long)]
    output: PathBuf,

    /// Number of bodies to generate
    #[arg(long)]
    num: usize,

    /// Master seed for reproducible batches
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads
    #[arg(long, default_value = "1")]
    jobs: usize,

    /// Body catalog (TOML); defaults to $BODYGEN_CONFIG, then the built-in one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of URDF templates; defaults to the built-in ones
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Procedural STL backend: openscad, vcad
    #[arg(long, default_value = "openscad")]
    backend: Backend,

    /// Directory holding the meshconv binaries
    #[arg(long, default_value = "bin")]
    bin_dir: PathBuf,

    /// OpenSCAD executable
    #[arg(long, default_value = "openscad")]
    openscad: PathBuf,
}

fn mesh_pool(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern)
        .with_context(|| format!("invalid mesh glob '{pattern}'"))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("reading meshes matching '{pattern}'"))?;
    info!("{} meshes match '{pattern}'", paths.len());
    Ok(paths)
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let catalog = load_catalog(args.config.as_deref())?;
    let templates = args
        .templates
        .map(TemplateSource::Directory)
        .unwrap_or_default();
    let options = GeneratorOptions {
        mesh_pool: args.obj_glob.as_deref().map(mesh_pool).transpose()?,
        toolchain: ToolchainSettings {
            backend: args.backend,
            bin_dir: args.bin_dir,
            openscad: args.openscad,
        },
    };

    let composer = composer_for(args.body, &catalog, &templates, &options)
        .with_context(|| format!("setting up '{}' generator", args.body))?;

    let report = run_batch(
        &composer,
        &BatchOptions {
            output_root: args.output,
            count: args.num,
            seed: args.seed,
            jobs: args.jobs.max(1),
        },
    )?;

    info!(
        "done: {} generated, {} skipped, {} failed (seed {})",
        report.generated(),
        report.skipped(),
        report.failed(),
        report.seed
    );
    if report.failed() > 0 {
        warn!("some bodies failed; see errors above");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
