//! Asset resolution: scanning the input tree, pairing sidecars and assigning identifiers.

mod scanning;
mod sidecar;

pub use scanning::resolve_assets;
pub use sidecar::{SidecarError, parse_sidecar_guid, read_sidecar_guid};
