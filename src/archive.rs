//! Serialisation of resolved assets into `.unitypackage` archive units.
//!
//! Each asset becomes a `<guid>/` directory followed by `asset.meta`, `pathname` and, when the
//! source is still a regular file, `asset`. The names and order are fixed by the importer.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tar::{EntryType, Header};
use tracing::{debug, warn};

use crate::asset_paths::{make_package_pathname, relative_output_path};
use crate::error::{PackageError, Result};
use crate::models::{AssetGuid, PackageOptions, PackageRoot, PackageSummary, ResolvedAsset};

/// Record holding the sidecar metadata.
pub const META_RECORD: &str = "asset.meta";
/// Record holding the UTF-8 project path of the asset.
pub const PATHNAME_RECORD: &str = "pathname";
/// Record holding the asset bytes.
pub const CONTENT_RECORD: &str = "asset";

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Minimal metadata written for assets without a sidecar.
pub fn synthesize_metadata(guid: &AssetGuid) -> String {
    format!("fileFormatVersion: 2\nguid: {guid}")
}

enum MetaSource {
    Sidecar(File, u64),
    Synthesized(String),
}

/// What [`PackageWriter::write_asset`] did with one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The unit was written.
    Written {
        /// Whether the unit carries an `asset` record.
        content: bool,
    },
    /// No unit was written for the asset.
    Skipped,
}

/// Reader that fails when its source ends before `remaining` bytes were produced.
///
/// The tar header already declares the size, so a file that shrank after it was measured must
/// abort the stream instead of being padded silently.
struct ExactLength<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> Read for ExactLength<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let limit = usize::try_from(self.remaining).map_or(buf.len(), |left| left.min(buf.len()));
        let read = self.inner.read(&mut buf[..limit])?;
        if read == 0 && limit > 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("source ended {} bytes early", self.remaining),
            ));
        }
        self.remaining -= read as u64;
        Ok(read)
    }
}

/// Tar writer that emits one archive unit per asset.
pub struct PackageWriter<W: Write> {
    builder: tar::Builder<W>,
    mtime: u64,
}

impl<W: Write> PackageWriter<W> {
    /// Wrap a byte sink; entries are stamped with the current time.
    pub fn new(writer: W) -> Self {
        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Self::with_mtime(writer, mtime)
    }

    /// Wrap a byte sink using a fixed modification time for every entry.
    pub fn with_mtime(writer: W, mtime: u64) -> Self {
        Self {
            builder: tar::Builder::new(writer),
            mtime,
        }
    }

    /// Write the unit for one asset.
    ///
    /// The asset is skipped when no metadata record could be produced or its path does not lie
    /// under `root`.
    pub fn write_asset(
        &mut self,
        root: &PackageRoot,
        asset: &ResolvedAsset,
        options: &PackageOptions,
    ) -> Result<UnitOutcome> {
        let Some(source_path) = asset.entry_path() else {
            warn!("skipping {}: asset has no path", asset.guid);
            return Ok(UnitOutcome::Skipped);
        };
        let Some(relative) = relative_output_path(root, &source_path, options.exclude_base_directory)
        else {
            warn!(
                "skipping {}: not under {}",
                source_path.display(),
                root.path.display()
            );
            return Ok(UnitOutcome::Skipped);
        };
        let pathname = make_package_pathname(
            options.root_directory.as_deref(),
            &pathname_text(&relative),
        );

        let Some(meta) = open_metadata(asset, options)? else {
            warn!("skipping {}: no sidecar and metadata synthesis is off", pathname);
            return Ok(UnitOutcome::Skipped);
        };

        let guid = asset.guid.to_string();
        self.append_directory(&format!("{guid}/"))?;

        let meta_name = format!("{guid}/{META_RECORD}");
        match meta {
            MetaSource::Sidecar(file, len) => self.append_stream(&meta_name, file, len)?,
            MetaSource::Synthesized(text) => self.append_bytes(&meta_name, text.as_bytes())?,
        }

        self.append_bytes(&format!("{guid}/{PATHNAME_RECORD}"), pathname.as_bytes())?;

        let content = match asset.content() {
            Some(path) => open_regular_file(path)?,
            None => None,
        };
        let has_content = content.is_some();
        if let Some((file, len)) = content {
            self.append_stream(&format!("{guid}/{CONTENT_RECORD}"), file, len)?;
        } else {
            debug!("{} has no content record", pathname);
        }

        debug!("packed {} as {}", pathname, guid);
        Ok(UnitOutcome::Written {
            content: has_content,
        })
    }

    /// Finish the tar stream and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.builder.into_inner()?)
    }

    fn header(&self, entry_type: EntryType, size: u64, mode: u32) -> Header {
        let mut header = Header::new_ustar();
        header.set_entry_type(entry_type);
        header.set_size(size);
        header.set_mode(mode);
        header.set_mtime(self.mtime);
        header.set_uid(0);
        header.set_gid(0);
        header
    }

    fn append_directory(&mut self, name: &str) -> io::Result<()> {
        let mut header = self.header(EntryType::Directory, 0, DIR_MODE);
        self.builder.append_data(&mut header, name, io::empty())
    }

    fn append_bytes(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let mut header = self.header(EntryType::Regular, bytes.len() as u64, FILE_MODE);
        self.builder.append_data(&mut header, name, bytes)
    }

    fn append_stream(&mut self, name: &str, source: impl Read, len: u64) -> io::Result<()> {
        let mut header = self.header(EntryType::Regular, len, FILE_MODE);
        let exact = ExactLength {
            inner: source,
            remaining: len,
        };
        self.builder
            .append_data(&mut header, name, exact)
            .map_err(|err| io::Error::new(err.kind(), format!("{name}: {err}")))
    }
}

/// Write every asset through a fresh [`PackageWriter`] and return the finished sink.
pub fn write_package<W: Write>(
    root: &PackageRoot,
    assets: &[ResolvedAsset],
    writer: W,
    options: &PackageOptions,
) -> Result<(W, PackageSummary)> {
    let mut package = PackageWriter::new(writer);
    let mut summary = PackageSummary::default();

    for asset in assets {
        match package.write_asset(root, asset, options)? {
            UnitOutcome::Written { content } => {
                summary.units += 1;
                if content {
                    summary.content_records += 1;
                }
            }
            UnitOutcome::Skipped => summary.skipped += 1,
        }
    }

    Ok((package.finish()?, summary))
}

fn pathname_text(relative: &Path) -> Cow<'_, str> {
    let text = relative.to_string_lossy();
    if let Cow::Owned(_) = text {
        warn!("{} is not valid Unicode, writing a lossy pathname", text);
    }
    text
}

fn open_metadata(asset: &ResolvedAsset, options: &PackageOptions) -> Result<Option<MetaSource>> {
    if let Some(path) = &asset.metadata_path {
        return match open_regular_file(path)? {
            Some((file, len)) => Ok(Some(MetaSource::Sidecar(file, len))),
            None => {
                debug!("{} vanished, writing generated metadata", path.display());
                Ok(Some(MetaSource::Synthesized(synthesize_metadata(&asset.guid))))
            }
        };
    }

    Ok(options
        .synthesize_metadata
        .then(|| MetaSource::Synthesized(synthesize_metadata(&asset.guid))))
}

/// Open a regular file with its current length; folders and missing files yield `None`.
fn open_regular_file(path: &Path) -> Result<Option<(File, u64)>> {
    let to_error = |source| PackageError::File {
        path: path.to_path_buf(),
        source,
    };

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => return Ok(None),
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(to_error(err)),
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(to_error(err)),
    };
    let len = file.metadata().map_err(to_error)?.len();
    Ok(Some((file, len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const CUBE_GUID: &str = "0123456789abcdef0123456789abcdef";

    struct Record {
        name: String,
        entry_type: EntryType,
        data: Vec<u8>,
    }

    fn read_records(bytes: &[u8]) -> Vec<Record> {
        let mut archive = tar::Archive::new(bytes);
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let name = String::from_utf8(entry.path_bytes().into_owned()).unwrap();
                let entry_type = entry.header().entry_type();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                Record {
                    name,
                    entry_type,
                    data,
                }
            })
            .collect()
    }

    fn guid(text: &str) -> AssetGuid {
        AssetGuid::parse_hex(text).unwrap()
    }

    fn project() -> (tempfile::TempDir, PathBuf) {
        let temp = tempdir().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap().join("project");
        fs::create_dir_all(root.join("models")).unwrap();
        fs::write(root.join("models/cube.fbx"), b"cube-bytes").unwrap();
        fs::write(
            root.join("models/cube.fbx.meta"),
            format!("fileFormatVersion: 2\nguid: {CUBE_GUID}\n"),
        )
        .unwrap();
        (temp, root)
    }

    fn cube(root: &Path) -> ResolvedAsset {
        ResolvedAsset {
            content_path: Some(root.join("models/cube.fbx")),
            metadata_path: Some(root.join("models/cube.fbx.meta")),
            guid: guid(CUBE_GUID),
        }
    }

    #[test]
    fn writes_records_in_unit_order() {
        let (_temp, root) = project();
        let (bytes, summary) =
            write_package(&PackageRoot::new(&root), &[cube(&root)], Vec::new(), &PackageOptions::default()).unwrap();

        let records = read_records(&bytes);
        let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec![
            format!("{CUBE_GUID}/"),
            format!("{CUBE_GUID}/asset.meta"),
            format!("{CUBE_GUID}/pathname"),
            format!("{CUBE_GUID}/asset"),
        ]);
        assert_eq!(records[0].entry_type, EntryType::Directory);
        assert_eq!(
            records[1].data,
            format!("fileFormatVersion: 2\nguid: {CUBE_GUID}\n").into_bytes()
        );
        assert_eq!(records[2].data, b"project/models/cube.fbx");
        assert_eq!(records[3].data, b"cube-bytes");
        assert_eq!(summary, PackageSummary {
            units: 1,
            content_records: 1,
            skipped: 0,
        });
    }

    #[test]
    fn applies_root_directory_and_base_exclusion() {
        let (_temp, root) = project();
        let options = PackageOptions {
            root_directory: Some("Assets/Vendor".into()),
            exclude_base_directory: true,
            synthesize_metadata: false,
        };
        let (bytes, _) = write_package(&PackageRoot::new(&root), &[cube(&root)], Vec::new(), &options).unwrap();

        let records = read_records(&bytes);
        assert_eq!(records[2].data, b"Assets/Vendor/models/cube.fbx");
    }

    #[test]
    fn folders_have_no_content_record() {
        let (_temp, root) = project();
        let folder = ResolvedAsset {
            content_path: Some(root.join("models")),
            metadata_path: None,
            guid: AssetGuid::from_relative_path("models"),
        };
        let options = PackageOptions {
            synthesize_metadata: true,
            ..PackageOptions::default()
        };
        let (bytes, summary) = write_package(&PackageRoot::new(&root), &[folder], Vec::new(), &options).unwrap();

        let records = read_records(&bytes);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].data, b"project/models");
        assert_eq!(summary.content_records, 0);
    }

    #[test]
    fn synthesizes_metadata_without_trailing_newline() {
        let (_temp, root) = project();
        let asset = ResolvedAsset {
            metadata_path: None,
            ..cube(&root)
        };
        let options = PackageOptions {
            synthesize_metadata: true,
            ..PackageOptions::default()
        };
        let (bytes, _) = write_package(&PackageRoot::new(&root), &[asset], Vec::new(), &options).unwrap();

        let records = read_records(&bytes);
        assert_eq!(
            records[1].data,
            format!("fileFormatVersion: 2\nguid: {CUBE_GUID}").into_bytes()
        );
    }

    #[test]
    fn skips_units_that_would_lack_metadata() {
        let (_temp, root) = project();
        let asset = ResolvedAsset {
            metadata_path: None,
            ..cube(&root)
        };
        let (bytes, summary) =
            write_package(&PackageRoot::new(&root), &[asset], Vec::new(), &PackageOptions::default()).unwrap();

        assert!(read_records(&bytes).is_empty());
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.units, 0);
    }

    #[test]
    fn tolerates_content_that_vanished_after_scanning() {
        let (_temp, root) = project();
        let asset = cube(&root);
        fs::remove_file(root.join("models/cube.fbx")).unwrap();

        let (bytes, summary) =
            write_package(&PackageRoot::new(&root), &[asset], Vec::new(), &PackageOptions::default()).unwrap();

        let records = read_records(&bytes);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].name, format!("{CUBE_GUID}/pathname"));
        assert_eq!(summary.units, 1);
        assert_eq!(summary.content_records, 0);
    }

    #[test]
    fn falls_back_to_generated_metadata_when_sidecar_vanished() {
        let (_temp, root) = project();
        let asset = cube(&root);
        fs::remove_file(root.join("models/cube.fbx.meta")).unwrap();

        let (bytes, _) =
            write_package(&PackageRoot::new(&root), &[asset], Vec::new(), &PackageOptions::default()).unwrap();

        let records = read_records(&bytes);
        assert_eq!(
            records[1].data,
            synthesize_metadata(&guid(CUBE_GUID)).into_bytes()
        );
    }

    #[test]
    fn metadata_only_assets_use_the_sidecar_path() {
        let (_temp, root) = project();
        let asset = ResolvedAsset {
            content_path: None,
            ..cube(&root)
        };
        let (bytes, _) =
            write_package(&PackageRoot::new(&root), &[asset], Vec::new(), &PackageOptions::default()).unwrap();

        let records = read_records(&bytes);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].data, b"project/models/cube.fbx");
    }

    #[test]
    fn stamps_entries_with_fixed_mtime() {
        let (_temp, root) = project();
        let mut writer = PackageWriter::with_mtime(Vec::new(), 1_700_000_000);
        let outcome = writer
            .write_asset(&PackageRoot::new(&root), &cube(&root), &PackageOptions::default())
            .unwrap();
        assert_eq!(outcome, UnitOutcome::Written { content: true });
        let bytes = writer.finish().unwrap();

        let mut archive = tar::Archive::new(bytes.as_slice());
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            assert_eq!(entry.header().mtime().unwrap(), 1_700_000_000);
            assert!(entry.header().as_ustar().is_some());
        }
    }

    #[test]
    fn reports_skipped_units_to_the_caller() {
        let (_temp, root) = project();
        let mut writer = PackageWriter::with_mtime(Vec::new(), 0);
        let asset = ResolvedAsset {
            metadata_path: None,
            ..cube(&root)
        };

        let outcome = writer
            .write_asset(&PackageRoot::new(&root), &asset, &PackageOptions::default())
            .unwrap();

        assert_eq!(outcome, UnitOutcome::Skipped);
        assert!(read_records(&writer.finish().unwrap()).is_empty());
    }

    #[test]
    fn fails_when_a_stream_is_shorter_than_its_header() {
        let mut writer = PackageWriter::with_mtime(Vec::new(), 0);

        let err = writer
            .append_stream("shrunk/asset", &b"abc"[..], 10)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
        assert!(err.to_string().contains("shrunk/asset"));
    }

    #[test]
    fn streams_exactly_the_declared_length() {
        let mut writer = PackageWriter::with_mtime(Vec::new(), 0);
        writer
            .append_stream("grown/asset", &b"abcdef"[..], 3)
            .unwrap();

        let records = read_records(&writer.finish().unwrap());
        assert_eq!(records[0].data, b"abc");
    }

    #[test]
    fn keeps_the_root_name_of_a_linked_input() {
        let (_temp, root) = project();
        let linked = PackageRoot::new(&root).with_name("MyPlugin");

        let (bytes, _) =
            write_package(&linked, &[cube(&root)], Vec::new(), &PackageOptions::default()).unwrap();

        assert_eq!(read_records(&bytes)[2].data, b"MyPlugin/models/cube.fbx");
    }
}
