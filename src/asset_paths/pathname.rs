use std::path::{Path, PathBuf};

use crate::models::PackageRoot;

/// Strip the scanned root from an entry path.
///
/// By default the root's folder name is kept (`/data/project/a.png` scanned from
/// `/data/project` yields `project/a.png`); with `exclude_base_directory` it is dropped too.
pub fn relative_output_path(
    root: &PackageRoot,
    content: &Path,
    exclude_base_directory: bool,
) -> Option<PathBuf> {
    let relative = content.strip_prefix(&root.path).ok()?;
    if exclude_base_directory || root.name.is_empty() {
        return Some(relative.to_path_buf());
    }
    if relative.as_os_str().is_empty() {
        return Some(PathBuf::from(&root.name));
    }
    Some(Path::new(&root.name).join(relative))
}

/// Produce the pathname record text for an asset.
///
/// The optional root directory is joined in front with a single separator and the result
/// always uses forward slashes, regardless of the native separator used on disk.
pub fn make_package_pathname(root_directory: Option<&str>, relative_path: &str) -> String {
    match root_directory {
        Some(prefix) if !prefix.is_empty() => {
            if prefix.ends_with(['/', '\\']) {
                format!("{prefix}{relative_path}")
            } else {
                format!("{prefix}/{relative_path}")
            }
        }
        _ => relative_path.to_string(),
    }
    .replace('\\', "/")
}
