//! Export packager: bundle every preview into one archive, one folder per page.
//!
//! An export is all-or-nothing. Every preview handle is resolved in parallel;
//! if any of them fails the export fails before the archive writer or the save
//! target ever see data.

use std::io::{Cursor, Write};
use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::book::Book;
use crate::capture::{DataHandle, PreviewStore};
use crate::platform::SaveTarget;
use crate::{Error, Result, StudioConfig};

/// One file inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path, `/`-separated
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Archive capability: named blobs in, one archive blob out.
pub trait ArchiveWriter: Send + Sync {
    fn assemble(&self, entries: Vec<ArchiveEntry>) -> Result<Vec<u8>>;
}

/// Writes zip archives.
///
/// Entries are stored uncompressed by default since PNG data does not shrink
/// further.
#[derive(Debug, Clone)]
pub struct ZipArchiveWriter {
    compression: CompressionMethod,
}

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self {
            compression: CompressionMethod::Stored,
        }
    }

    pub fn deflated() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn assemble(&self, entries: Vec<ArchiveEntry>) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(self.compression);

        for entry in &entries {
            zip.start_file(&entry.path, options)
                .map_err(|e| Error::ArchiveError(format!("{}: {}", entry.path, e)))?;
            zip.write_all(&entry.bytes)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| Error::ArchiveError(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// A preview scheduled for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub path: String,
    pub handle: DataHandle,
}

/// What an export will write: the archive name and its entries in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPlan {
    pub file_name: String,
    pub entries: Vec<PlannedEntry>,
}

impl ExportPlan {
    /// Plan an export of every stored preview.
    ///
    /// Paths are `{page folder}/{plate id}.{ext}`; with the default naming
    /// the folder is book id and page number run together (`bk17`).
    pub fn new(book: &Book, store: &PreviewStore, config: &StudioConfig) -> Self {
        let entries = store
            .iter()
            .map(|preview| PlannedEntry {
                path: format!(
                    "{}/{}",
                    preview.plate_id.page.folder(config.folder_naming),
                    preview.file_name
                ),
                handle: preview.handle.clone(),
            })
            .collect();
        Self {
            file_name: book.archive_name(&config.fallback_archive_name),
            entries,
        }
    }

    pub fn paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }
}

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArchive {
    pub file_name: String,
    /// Where the save target put it
    pub location: String,
    pub entries: usize,
    pub size: usize,
}

/// Resolve every planned entry, assemble the archive and save it.
///
/// Resolution runs in parallel and keeps the plan's order. The first failure
/// aborts the export; nothing is assembled or saved in that case.
pub async fn download_all_zip(
    plan: ExportPlan,
    archiver: Arc<dyn ArchiveWriter>,
    save: &dyn SaveTarget,
) -> Result<SavedArchive> {
    let blobs = try_join_all(plan.entries.iter().map(|e| e.handle.resolve())).await?;
    debug!("resolved {} previews for {}", blobs.len(), plan.file_name);

    let entries: Vec<ArchiveEntry> = plan
        .entries
        .into_iter()
        .zip(blobs)
        .map(|(planned, bytes)| ArchiveEntry {
            path: planned.path,
            bytes,
        })
        .collect();
    let count = entries.len();

    let archive = tokio::task::spawn_blocking(move || archiver.assemble(entries)).await??;
    let size = archive.len();

    let location = save.save(plan.file_name.clone(), archive).await?;
    info!("saved {} ({} entries, {} bytes) to {}", plan.file_name, count, size, location);

    Ok(SavedArchive {
        file_name: plan.file_name,
        location,
        entries: count,
        size,
    })
}
