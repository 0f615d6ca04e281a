//! Package build orchestrator: resolves the input tree and writes the compressed archive.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;

use crate::archive::write_package;
use crate::error::{PackageError, Result};
use crate::models::{PackageOptions, PackageRoot, PackageSummary, ResolveOptions};
use crate::resolver::resolve_assets;

/// High-level helper that turns an asset folder into a `.unitypackage` file.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
  input: PathBuf,
  output: PathBuf,
  resolve: ResolveOptions,
  package: PackageOptions,
}

impl PackageBuilder {
  /// Create a builder for `input` writing to `output` with default options.
  pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
    Self {
      input: input.into(),
      output: output.into(),
      resolve: ResolveOptions::default(),
      package: PackageOptions::default(),
    }
  }

  /// Replace the scanning options.
  pub fn with_resolve_options(mut self, options: ResolveOptions) -> Self {
    self.resolve = options;
    self
  }

  /// Replace the archive writing options.
  pub fn with_package_options(mut self, options: PackageOptions) -> Self {
    self.package = options;
    self
  }

  /// Scan the input, then write every resolved asset into a gzip-compressed tar at `output`.
  ///
  /// The scan runs over the canonical input path, but pathnames start with the input folder's
  /// name as given, even when it is a symlink. The scan finishes before the output file is
  /// created. A failure while writing leaves a partial file behind that must not be used.
  pub fn build(&self) -> Result<PackageSummary> {
    let root = package_root(&self.input, canonical_input(&self.input)?);

    let mut resolve = self.resolve.clone();
    if self.output.exists() {
      resolve.ignore.insert(&self.output);
    }

    let assets = resolve_assets(&root.path, &resolve)?;
    info!("resolved {} assets under {}", assets.len(), root.path.display());

    let file = File::create(&self.output).map_err(|source| PackageError::File {
      path: self.output.clone(),
      source,
    })?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::best());

    let (encoder, summary) = write_package(&root, &assets, encoder, &self.package)?;
    let mut writer = encoder.finish()?;
    writer.flush()?;

    info!(
      "wrote {} units ({} with content, {} skipped) to {}",
      summary.units,
      summary.content_records,
      summary.skipped,
      self.output.display()
    );
    Ok(summary)
  }
}

/// Name pathnames after the input as the caller spelled it; `..` and similar fall back to the
/// canonical folder name.
fn package_root(input: &Path, canonical: PathBuf) -> PackageRoot {
  let name = std::path::absolute(input)
    .ok()
    .and_then(|absolute| absolute.file_name().map(|name| name.to_os_string()));
  match name {
    Some(name) => PackageRoot::new(canonical).with_name(name),
    None => PackageRoot::new(canonical),
  }
}

fn canonical_input(input: &Path) -> Result<PathBuf> {
  match fs::canonicalize(input) {
    Ok(path) if path.is_dir() => Ok(path),
    Ok(_) => Err(PackageError::InputNotFound(input.to_path_buf())),
    Err(err) if err.kind() == ErrorKind::NotFound => {
      Err(PackageError::InputNotFound(input.to_path_buf()))
    }
    Err(source) => Err(PackageError::File {
      path: input.to_path_buf(),
      source,
    }),
  }
}
