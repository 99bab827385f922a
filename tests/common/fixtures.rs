//! Service fixtures backed by the in-memory fake converter

use batchconv::converter::FakeConverter;
use batchconv::{Config, ConversionService, UploadedFile};
use std::sync::Arc;
use tempfile::TempDir;

/// A service wired to a fake converter, with scratch storage in its own temp dir
pub struct Harness {
    pub service: ConversionService,
    pub converter: FakeConverter,
    pub scratch: TempDir,
}

impl Harness {
    pub fn new(converter: FakeConverter) -> Self {
        Self::with_config(converter, |_| {})
    }

    pub fn with_config(converter: FakeConverter, configure: impl FnOnce(&mut Config)) -> Self {
        let scratch = tempfile::tempdir().expect("Failed to create scratch dir");
        let mut config = Config::default();
        config.conversion.temp_dir = Some(scratch.path().to_path_buf());
        configure(&mut config);

        let service = ConversionService::with_converter(config, Arc::new(converter.clone()))
            .expect("Failed to build service");

        Self {
            service,
            converter,
            scratch,
        }
    }
}

/// Upload whose content is its own name, so outputs are easy to trace back
pub fn upload(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        content: name.as_bytes().to_vec().into(),
    }
}

pub fn uploads(names: &[&str]) -> Vec<UploadedFile> {
    names.iter().map(|name| upload(name)).collect()
}
