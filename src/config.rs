//! Project configuration loader supplying defaults for a package build.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PackageError, Result};
use crate::models::{PackageOptions, ResolveOptions};
use crate::selection::IgnoreList;

/// File looked up in the input directory when no explicit configuration is given.
pub const DEFAULT_CONFIG_FILE: &str = "unitypackage.config.json";

/// Discoverable configuration describing how an input folder is packaged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageConfig {
    /// Prefix joined in front of every pathname record.
    pub root_directory: Option<String>,
    /// Strip the input folder's own name from pathname records.
    pub exclude_base_directory: bool,
    /// Derive identifiers and metadata for assets without a sidecar.
    pub generate_guid: bool,
    /// Paths to exclude; relative entries are resolved against the input directory.
    pub ignores: Vec<PathBuf>,
}

impl PackageConfig {
    /// Load the default configuration file from `input_dir`.
    ///
    /// A missing file yields default values; a file that exists but cannot be read or parsed is
    /// reported so a typo does not silently change what gets packaged.
    pub fn discover(input_dir: &Path) -> Result<Self> {
        let candidate = input_dir.join(DEFAULT_CONFIG_FILE);
        match fs::read_to_string(&candidate) {
            Ok(content) => Self::parse(&candidate, &content),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(PackageError::Config {
                path: candidate,
                reason: err.to_string(),
            }),
        }
    }

    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| PackageError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|err| PackageError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// Layer command line values over the file: a given root directory replaces the configured
    /// one and switches turned on stay on.
    pub fn apply_overrides(
        &mut self,
        root_directory: Option<String>,
        exclude_base_directory: bool,
        generate_guid: bool,
    ) {
        if root_directory.is_some() {
            self.root_directory = root_directory;
        }
        self.exclude_base_directory |= exclude_base_directory;
        self.generate_guid |= generate_guid;
    }

    /// Scanning options with configured ignores resolved against `input_dir`.
    ///
    /// The configuration file itself is always ignored.
    pub fn resolve_options(&self, input_dir: &Path) -> ResolveOptions {
        let mut ignore = IgnoreList::new(self.ignores.iter().map(|path| input_dir.join(path)));
        ignore.insert(input_dir.join(DEFAULT_CONFIG_FILE));
        ResolveOptions {
            generate_guids: self.generate_guid,
            ignore,
        }
    }

    /// Archive writing options; generating identifiers also turns on metadata synthesis.
    pub fn package_options(&self) -> PackageOptions {
        PackageOptions {
            root_directory: self.root_directory.clone(),
            exclude_base_directory: self.exclude_base_directory,
            synthesize_metadata: self.generate_guid,
        }
    }
}
