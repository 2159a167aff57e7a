// crates/framecut-core/src/archive.rs
//
// Storyboard archive: entries are held in memory while the job runs and only
// serialised into a ZIP at `finish`. Dropping the builder mid-job discards
// everything — a failed run never produces a truncated archive.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{FrameCutError, Result};

pub struct ArchiveBuilder {
    folder:  String,
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new(folder: &str) -> Self {
        Self { folder: folder.trim_end_matches('/').to_string(), entries: Vec::new() }
    }

    pub fn push(&mut self, name: String, bytes: Vec<u8>) {
        self.entries.push((name, bytes));
    }

    pub(crate) fn len(&self) -> usize { self.entries.len() }

    /// Serialise every entry under `folder/` into a deflate-compressed ZIP.
    pub fn finish(self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.add_directory(format!("{}/", self.folder), options)
            .map_err(FrameCutError::encoding)?;
        for (name, bytes) in &self.entries {
            zip.start_file(format!("{}/{name}", self.folder), options)
                .map_err(FrameCutError::encoding)?;
            zip.write_all(bytes)?;
        }

        let cursor = zip.finish().map_err(FrameCutError::encoding)?;
        Ok(cursor.into_inner())
    }
}
