//! Reading identifiers out of `.meta` sidecar files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::models::AssetGuid;

/// Sidecars are small; the identifier sits on the second line, well inside this prefix.
const SIDECAR_PREFIX_LEN: u64 = 256;

/// Reasons a sidecar cannot provide an identifier. Each one skips the asset, never the run.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// The sidecar could not be opened or read.
    #[error("unreadable sidecar: {0}")]
    Io(#[from] std::io::Error),
    /// The sidecar has no second line.
    #[error("missing identifier line")]
    MissingLine,
    /// The second line has no `label: value` separator.
    #[error("identifier line has no ':' separator")]
    MissingSeparator,
    /// The value is not 32 hex digits.
    #[error("invalid identifier {0:?}")]
    InvalidGuid(String),
}

/// Open a sidecar and parse the identifier from its leading bytes.
pub fn read_sidecar_guid(path: &Path) -> Result<AssetGuid, SidecarError> {
    let mut prefix = Vec::with_capacity(SIDECAR_PREFIX_LEN as usize);
    File::open(path)?
        .take(SIDECAR_PREFIX_LEN)
        .read_to_end(&mut prefix)?;
    parse_sidecar_guid(&prefix)
}

/// Parse the identifier from sidecar text.
///
/// Line 1 is a format marker and is not inspected. Line 2 must read `<label>: <32 hex digits>`;
/// surrounding whitespace (including a trailing `\r`) is ignored and later lines are not read.
pub fn parse_sidecar_guid(bytes: &[u8]) -> Result<AssetGuid, SidecarError> {
    let mut lines = bytes.split(|byte| *byte == b'\n');
    lines.next();
    let line = lines.next().ok_or(SidecarError::MissingLine)?;

    let separator = line
        .iter()
        .position(|byte| *byte == b':')
        .ok_or(SidecarError::MissingSeparator)?;
    let value = String::from_utf8_lossy(&line[separator + 1..]);
    let value = value.trim();

    AssetGuid::parse_hex(value).ok_or_else(|| SidecarError::InvalidGuid(value.to_string()))
}
