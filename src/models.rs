//! Data structures produced while resolving and packaging assets.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_128;

use crate::asset_paths::META_SUFFIX;
use crate::selection::IgnoreList;

/// Number of hex digits in the serialised form of an [`AssetGuid`].
pub const GUID_HEX_LEN: usize = 32;

/// 128-bit asset identifier written as the directory name of each archive unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetGuid(Uuid);

impl AssetGuid {
  /// Derive a stable identifier from a path relative to the scanned root.
  ///
  /// The path is hashed as UTF-16LE code units with XXH3-128 and the big-endian digest is read
  /// back with the first three GUID fields little-endian. Identifiers produced this way match
  /// the ones generated by earlier `.unitypackage` tooling for the same relative path, so a
  /// tree without sidecars re-archives to the same identifiers every time.
  pub fn from_relative_path(relative_path: &str) -> Self {
    let bytes: Vec<u8> = relative_path
      .encode_utf16()
      .flat_map(u16::to_le_bytes)
      .collect();
    let digest = xxh3_128(&bytes).to_be_bytes();
    Self(Uuid::from_bytes_le(digest))
  }

  /// Parse exactly 32 hex digits (either case, no hyphens).
  pub fn parse_hex(text: &str) -> Option<Self> {
    if text.len() != GUID_HEX_LEN || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
      return None;
    }
    Uuid::try_parse(text).ok().map(Self)
  }

  /// Underlying UUID value.
  pub fn as_uuid(&self) -> &Uuid {
    &self.0
  }
}

impl From<Uuid> for AssetGuid {
  fn from(value: Uuid) -> Self {
    Self(value)
  }
}

impl fmt::Display for AssetGuid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.simple())
  }
}

/// One importable entry discovered in the input tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
  /// Absolute path of the file or folder; `None` for metadata-only entries.
  pub content_path: Option<PathBuf>,
  /// Sidecar `.meta` file found next to the entry during the scan.
  pub metadata_path: Option<PathBuf>,
  /// Identifier read from the sidecar or derived from the relative path.
  pub guid: AssetGuid,
}

impl ResolvedAsset {
  /// Whether the asset's identifier came from a sidecar file.
  pub fn has_sidecar(&self) -> bool {
    self.metadata_path.is_some()
  }

  /// Content path, if any, as a borrowed path.
  pub fn content(&self) -> Option<&Path> {
    self.content_path.as_deref()
  }

  /// Path the asset occupies in the tree: the content path, or the sidecar path without its
  /// `.meta` suffix for metadata-only entries.
  pub fn entry_path(&self) -> Option<PathBuf> {
    if let Some(content) = &self.content_path {
      return Some(content.clone());
    }
    let metadata = self.metadata_path.as_deref()?.to_str()?;
    metadata.strip_suffix(META_SUFFIX).map(PathBuf::from)
  }
}

/// Scanned input folder and the folder name its pathname records start with.
///
/// The scan runs over the canonical path, while the name is the one the caller used for the
/// input, so a folder reached through a symlink keeps the link's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRoot {
  /// Directory the assets were resolved under.
  pub path: PathBuf,
  /// Leading pathname component unless the base directory is excluded.
  pub name: OsString,
}

impl PackageRoot {
  /// Use the last component of `path` as the folder name.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let name = path
      .file_name()
      .map(OsStr::to_os_string)
      .unwrap_or_default();
    Self { path, name }
  }

  /// Replace the folder name written in front of every pathname.
  pub fn with_name(mut self, name: impl Into<OsString>) -> Self {
    self.name = name.into();
    self
  }
}

/// Options consumed by [`crate::resolver::resolve_assets`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
  /// Derive identifiers for assets without a sidecar instead of excluding them.
  pub generate_guids: bool,
  /// Paths excluded from the scan.
  pub ignore: IgnoreList,
}

/// Options controlling how resolved assets are written into the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageOptions {
  /// Prefix joined in front of every pathname record (for example `Assets/Vendor`).
  pub root_directory: Option<String>,
  /// Strip the input folder's own name from pathname records.
  pub exclude_base_directory: bool,
  /// Write a generated `asset.meta` for assets that have no sidecar.
  pub synthesize_metadata: bool,
}

/// Counters reported after an archive has been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageSummary {
  /// Archive units written.
  pub units: usize,
  /// Units that carried an `asset` content record.
  pub content_records: usize,
  /// Assets skipped because no complete unit could be produced for them.
  pub skipped: usize,
}
