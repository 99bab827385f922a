//! ZIP packaging of converted outputs

use std::collections::HashSet;
use std::io::{Cursor, Write};

use tracing::debug;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::{Error, Result};
use crate::formats::{file_stem, target_name};
use crate::types::FailedItem;

/// Download name of every multi-item response
pub const ARCHIVE_FILE_NAME: &str = "convertedimages.zip";

/// Entry listing the items left out of a partial archive
pub const FAILURE_MANIFEST_NAME: &str = "conversion_failures.json";

/// One named archive member
#[derive(Clone, Debug)]
struct ArchiveEntry {
    name: String,
    bytes: Vec<u8>,
}

/// Collects archive entries in insertion order and encodes them as a ZIP file
///
/// Callers add entries in ascending batch index; the archive keeps that order.
/// Entry names are unique: a name that is already taken gets `-<index>` appended to
/// its stem until it no longer collides. [`FAILURE_MANIFEST_NAME`] is reserved from
/// the start, so a converted file never occupies it. Every entry is
/// Deflate-compressed with a fixed timestamp, so identical inputs give identical
/// archives.
#[derive(Debug)]
pub struct ArchiveBuilder {
    entries: Vec<ArchiveEntry>,
    used_names: HashSet<String>,
    manifest_added: bool,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            used_names: HashSet::from([FAILURE_MANIFEST_NAME.to_string()]),
            manifest_added: false,
        }
    }

    /// Add the converted output of item `index`; returns the entry name used
    pub fn add_converted(
        &mut self,
        index: usize,
        original_name: &str,
        output_format: &str,
        bytes: Vec<u8>,
    ) -> &str {
        let name = self.unique_name(target_name(original_name, output_format), index);
        self.push(name, bytes)
    }

    /// Add the failure manifest as the last entry, always under [`FAILURE_MANIFEST_NAME`]
    pub fn add_failure_manifest(&mut self, failures: &[FailedItem]) -> Result<&str> {
        if self.manifest_added {
            return Err(Error::Assembly("failure manifest added twice".into()));
        }
        let bytes = serde_json::to_vec_pretty(failures)?;
        self.manifest_added = true;
        Ok(self.push(FAILURE_MANIFEST_NAME.to_string(), bytes))
    }

    /// Entry names in archive order
    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of entries added so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was added
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the archive on a blocking thread
    pub async fn build(self) -> Result<Vec<u8>> {
        let entries = self.entries;
        let count = entries.len();
        let bytes = tokio::task::spawn_blocking(move || encode(&entries))
            .await
            .map_err(|e| Error::Assembly(format!("archive task failed: {e}")))?
            .map_err(|e| Error::Assembly(e.to_string()))?;

        debug!(entries = count, bytes = bytes.len(), "archive assembled");
        Ok(bytes)
    }

    fn push(&mut self, name: String, bytes: Vec<u8>) -> &str {
        self.used_names.insert(name.clone());
        self.entries.push(ArchiveEntry { name, bytes });
        self.entries
            .last()
            .map(|e| e.name.as_str())
            .unwrap_or_default()
    }

    fn unique_name(&self, candidate: String, index: usize) -> String {
        let mut name = candidate;
        while self.used_names.contains(&name) {
            let stem = file_stem(&name);
            let extension = &name[stem.len()..];
            let renamed = format!("{stem}-{index}{extension}");
            debug!(from = %name, to = %renamed, "renamed colliding archive entry");
            name = renamed;
        }
        name
    }
}

fn encode(entries: &[ArchiveEntry]) -> zip::result::ZipResult<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for entry in entries {
        writer.start_file(entry.name.as_str(), options)?;
        writer.write_all(&entry.bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}
