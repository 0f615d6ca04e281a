//! Directory scanning and sidecar pairing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::sidecar::read_sidecar_guid;
use crate::asset_paths::{
    is_hidden_name, is_sidecar_path, is_version_control_path, sidecar_path_for,
};
use crate::error::{PackageError, Result};
use crate::models::{AssetGuid, ResolveOptions, ResolvedAsset};
use crate::selection::AssetInclusion;

/// Entries found under the root, keyed by root-relative path.
#[derive(Debug, Default)]
struct ScannedTree {
    assets: BTreeMap<PathBuf, PathBuf>,
    sidecars: BTreeSet<PathBuf>,
}

/// Scan `root` and resolve every packagable entry to an identifier.
///
/// The whole tree is read before anything is resolved. Entries come back in component-wise
/// lexicographic order of their root-relative path, which is stable across runs on an unchanged
/// tree. Folders are returned as well as files.
///
/// A sidecar that cannot be read or parsed drops its asset from the result; an unreadable
/// directory fails the whole scan.
pub fn resolve_assets(root: &Path, options: &ResolveOptions) -> Result<Vec<ResolvedAsset>> {
    let tree = scan_tree(root, &options.ignore)?;
    Ok(pair_entries(root, tree, options.generate_guids))
}

fn scan_tree(root: &Path, inclusion: &impl AssetInclusion) -> Result<ScannedTree> {
    let mut tree = ScannedTree::default();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !is_hidden_name(entry.file_name()) && inclusion.is_included(entry.path())
        });

    for entry in walker {
        let entry = entry.map_err(|source| PackageError::Scan {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source,
        })?;

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if is_version_control_path(relative) {
            continue;
        }

        if is_sidecar_path(relative) {
            tree.sidecars.insert(relative.to_path_buf());
        } else {
            tree.assets
                .insert(relative.to_path_buf(), entry.path().to_path_buf());
        }
    }

    Ok(tree)
}

fn pair_entries(root: &Path, tree: ScannedTree, generate_guids: bool) -> Vec<ResolvedAsset> {
    let ScannedTree {
        assets,
        mut sidecars,
    } = tree;
    let mut resolved = Vec::with_capacity(assets.len());

    for (relative, content_path) in assets {
        let sidecar_relative = sidecar_path_for(&relative);

        if sidecars.remove(&sidecar_relative) {
            let metadata_path = root.join(&sidecar_relative);
            match read_sidecar_guid(&metadata_path) {
                Ok(guid) => resolved.push(ResolvedAsset {
                    content_path: Some(content_path),
                    metadata_path: Some(metadata_path),
                    guid,
                }),
                Err(err) => {
                    warn!("skipping {}: {}", metadata_path.display(), err);
                }
            }
        } else if generate_guids {
            let guid = AssetGuid::from_relative_path(&relative.to_string_lossy());
            resolved.push(ResolvedAsset {
                content_path: Some(content_path),
                metadata_path: None,
                guid,
            });
        } else {
            debug!("skipping {} without a sidecar", relative.display());
        }
    }

    for orphan in sidecars {
        debug!("ignoring sidecar without an asset: {}", orphan.display());
    }

    resolved
}
