//! Helpers for classifying scanned entries and normalising archive pathnames.
//!
//! Filtering (hidden entries, version control folders, `.meta` sidecars) and pathname
//! construction are kept apart so the resolver and the archive builder can share them and each
//! rule can be tested on its own.

mod filters;
mod pathname;

pub use filters::{
    META_SUFFIX, is_hidden_name, is_sidecar_path, is_version_control_path, sidecar_path_for,
};
pub use pathname::{make_package_pathname, relative_output_path};
