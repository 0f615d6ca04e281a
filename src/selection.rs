//! Helpers used to filter which paths are packaged.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Trait describing selection filters for scanned entries.
pub trait AssetInclusion {
  /// Returns `true` when the entry at `path` should be packaged.
  fn is_included(&self, path: &Path) -> bool;
}

/// Set of normalised paths excluded from a package.
///
/// An ignored directory excludes everything beneath it. Symlinks are resolved in the folders
/// leading to an entry but not in its final component, so naming a link ignores the link and
/// leaves its target alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
  paths: BTreeSet<PathBuf>,
}

impl IgnoreList {
  /// Build an ignore list, normalising every entry.
  pub fn new<I, P>(paths: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
  {
    let mut list = Self::default();
    for path in paths {
      list.insert(path);
    }
    list
  }

  /// Add a path to the list.
  pub fn insert(&mut self, path: impl AsRef<Path>) {
    if let Some(normalised) = normalise(path.as_ref()) {
      self.paths.insert(normalised);
    }
  }

  /// Determine whether a path is covered by one of the ignored entries.
  pub fn is_ignored(&self, path: &Path) -> bool {
    self.paths.iter().any(|rule| path.starts_with(rule))
  }

  /// Number of distinct ignored paths.
  pub fn len(&self) -> usize {
    self.paths.len()
  }

  /// Returns true when nothing is ignored.
  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }
}

impl AssetInclusion for IgnoreList {
  fn is_included(&self, path: &Path) -> bool {
    !self.is_ignored(path)
  }
}

/// Canonicalise the parent of `path` and re-attach its last component. Falls back to the plain
/// absolute path when the parent does not exist.
fn normalise(path: &Path) -> Option<PathBuf> {
  if path.as_os_str().is_empty() {
    return None;
  }

  let absolute = std::path::absolute(path).ok()?;
  if let Some(Component::Normal(name)) = absolute.components().next_back() {
    let parent = absolute.parent().and_then(|parent| fs::canonicalize(parent).ok());
    return Some(parent.map_or_else(|| absolute.clone(), |dir| dir.join(name)));
  }
  Some(fs::canonicalize(&absolute).unwrap_or(absolute))
}
