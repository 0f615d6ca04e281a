#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod archive;
pub mod asset_paths;
pub mod builder;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod resolver;
pub mod selection;

pub use archive::{PackageWriter, UnitOutcome, write_package};
pub use builder::PackageBuilder;
pub use config::PackageConfig;
pub use error::{PackageError, Result};
pub use models::{
  AssetGuid, PackageOptions, PackageRoot, PackageSummary, ResolveOptions, ResolvedAsset,
};
pub use resolver::resolve_assets;
pub use selection::{AssetInclusion, IgnoreList};
