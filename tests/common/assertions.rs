//! Assertion helpers for conversion responses and scratch storage

use batchconv::{ConversionResponse, FailedItem};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every file or directory below `root`, excluding `root` itself
pub fn leftover_entries(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .collect()
}

pub fn assert_no_leftovers(root: &Path) {
    let leftovers = leftover_entries(root);
    assert!(
        leftovers.is_empty(),
        "scratch storage should be empty, found: {leftovers:?}"
    );
}

/// (name, content) of every archive entry, in archive order
pub fn archive_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("response should be a zip");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).expect("entry should be readable");
            let mut content = Vec::new();
            file.read_to_end(&mut content).expect("entry should decode");
            (file.name().to_string(), content)
        })
        .collect()
}

pub fn entry_names(entries: &[(String, Vec<u8>)]) -> Vec<&str> {
    entries.iter().map(|(name, _)| name.as_str()).collect()
}

/// Unpack an archive response, panicking on a single-file one
pub fn expect_archive(response: ConversionResponse) -> (Vec<(String, Vec<u8>)>, Vec<FailedItem>) {
    match response {
        ConversionResponse::Archive {
            bytes, failures, ..
        } => (archive_entries(&bytes), failures),
        ConversionResponse::Single { file_name, .. } => {
            panic!("expected an archive, got single file {file_name}")
        }
    }
}
