use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};
use unitypackage_bundler::logging::init_logging;
use unitypackage_bundler::{PackageBuilder, PackageConfig, PackageError};

/// Create a .unitypackage from a folder of assets and their .meta sidecars.
#[derive(Parser)]
#[command(name = "unitypackage-bundler", version, about, long_about = None)]
struct Cli {
    /// Input directory path
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Root directory prepended to every asset path inside the package
    #[arg(short, long)]
    root_directory: Option<String>,

    /// Drop the input folder's own name from asset paths
    #[arg(short, long)]
    exclude_base_directory: bool,

    /// Generate GUIDs and metadata for assets without a .meta file
    #[arg(short, long)]
    generate_guid: bool,

    /// Files or folders to leave out of the package
    #[arg(short, long, num_args = 1..)]
    ignores: Vec<PathBuf>,

    /// Configuration file (defaults to unitypackage.config.json in the input directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            let code = err
                .downcast_ref::<PackageError>()
                .map_or(2, PackageError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input.is_dir() {
        return Err(PackageError::InputNotFound(cli.input).into());
    }

    let mut config = match &cli.config {
        Some(path) => PackageConfig::from_path(path)?,
        None => PackageConfig::discover(&cli.input)?,
    };
    config.apply_overrides(
        cli.root_directory,
        cli.exclude_base_directory,
        cli.generate_guid,
    );

    let mut resolve = config.resolve_options(&cli.input);
    for path in &cli.ignores {
        resolve.ignore.insert(path);
    }
    if let Some(path) = &cli.config {
        resolve.ignore.insert(path);
    }

    let summary = PackageBuilder::new(&cli.input, &cli.output)
        .with_resolve_options(resolve)
        .with_package_options(config.package_options())
        .build()
        .with_context(|| format!("failed to build {}", cli.output.display()))?;

    if summary.skipped > 0 {
        warn!("{} assets were left out of the package", summary.skipped);
    }
    Ok(())
}
