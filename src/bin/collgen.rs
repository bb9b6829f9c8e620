//! Command line front end of the dispatch generator.

use clap::Parser;
use collgen::synth::parse_modes;
use collgen::{generate, AlgorithmCatalog, GenError, GenResult, GeneratorConfig, Registry};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Generate the collective dispatch layer", long_about = None)]
struct Args {
    /// Algorithm catalog
    #[arg(long)]
    catalog: PathBuf,

    /// Signature registry; the built-in one when omitted
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Output path of the implementation source
    #[arg(long, default_value = "coll_algos.c")]
    source: PathBuf,

    /// Output path of the prototype header
    #[arg(long, default_value = "coll_algos.h")]
    header: PathBuf,

    /// Operation to generate (repeatable); all collectives when omitted
    #[arg(long = "op")]
    ops: Vec<String>,

    /// Blocking mode to generate (repeatable): blocking, nonblocking or persistent
    #[arg(long = "mode")]
    modes: Vec<String>,

    /// Log every emitted function
    #[arg(short, long)]
    verbose: bool,
}

fn read(path: &Path) -> GenResult<String> {
    fs::read_to_string(path).map_err(|source| GenError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> GenResult<()> {
    fs::write(path, contents).map_err(|source| GenError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn run(args: &Args) -> GenResult<()> {
    let catalog = AlgorithmCatalog::parse(&read(&args.catalog)?)?;
    let registry = match &args.registry {
        Some(path) => Registry::parse(&read(path)?)?,
        None => Registry::builtin()?,
    };
    log::info!(
        "loaded {} catalog groups and {} signatures",
        catalog.len(),
        registry.len()
    );

    let mut config = GeneratorConfig::default();
    if !args.ops.is_empty() {
        config = config.with_operations(args.ops.iter().cloned());
    }
    if !args.modes.is_empty() {
        config = config.with_modes(parse_modes(args.modes.iter().map(String::as_str))?);
    }

    let artifacts = generate(&catalog, &registry, &config)?;
    write(&args.source, &artifacts.source)?;
    write(&args.header, &artifacts.header)?;
    log::info!("{}", artifacts.stats);
    Ok(())
}

fn main() {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
