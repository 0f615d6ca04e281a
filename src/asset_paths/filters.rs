use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Suffix appended to an asset path to name its sidecar metadata file.
pub const META_SUFFIX: &str = ".meta";

const VERSION_CONTROL_DIR: &str = ".git";

/// Dot-prefixed names are hidden and never packaged.
pub fn is_hidden_name(name: &OsStr) -> bool {
    name.as_encoded_bytes().starts_with(b".")
}

/// Determine whether the path names a `.meta` sidecar rather than an asset.
pub fn is_sidecar_path(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().ends_with(META_SUFFIX.as_bytes()))
}

/// Determine whether any component of a root-relative path is a version control folder.
pub fn is_version_control_path(relative: &Path) -> bool {
    relative
        .components()
        .any(|component| matches!(component, Component::Normal(name) if name == VERSION_CONTROL_DIR))
}

/// Path of the sidecar that would belong to `asset`.
pub fn sidecar_path_for(asset: &Path) -> PathBuf {
    let mut raw = asset.as_os_str().to_owned();
    raw.push(META_SUFFIX);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_dot_prefixed_names_as_hidden() {
        assert!(is_hidden_name(OsStr::new(".DS_Store")));
        assert!(is_hidden_name(OsStr::new(".git")));
        assert!(!is_hidden_name(OsStr::new("cube.fbx")));
    }

    #[test]
    fn recognises_sidecar_suffix() {
        assert!(is_sidecar_path(Path::new("models/cube.fbx.meta")));
        assert!(is_sidecar_path(Path::new("models.meta")));
        assert!(!is_sidecar_path(Path::new("models/cube.fbx")));
        assert!(!is_sidecar_path(Path::new("models/metadata.json")));
    }

    #[test]
    fn detects_git_components_but_not_lookalikes() {
        assert!(is_version_control_path(Path::new("vendor/.git/config")));
        assert!(!is_version_control_path(Path::new("docs/.github-notes.md")));
        assert!(!is_version_control_path(Path::new("models/cube.fbx")));
    }

    #[test]
    fn appends_suffix_for_sidecar_path() {
        let asset = Path::new("/data/project/models/cube.fbx");
        let sidecar = sidecar_path_for(asset);
        assert_eq!(sidecar, PathBuf::from("/data/project/models/cube.fbx.meta"));
        assert!(is_sidecar_path(&sidecar));
    }
}
