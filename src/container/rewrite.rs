//! Transactional single-entry replacement.
//!
//! A container is never edited in place. The replacement is assembled in a
//! temporary file next to the original:
//!
//! 1. every entry is visited in archive order;
//! 2. the target entry is written with the new bytes, every other entry is
//!    raw-copied (compressed data and headers unchanged);
//! 3. only when the whole archive has been written and synced is the
//!    temporary file persisted over the original (an atomic rename).
//!
//! Any failure before step 3 drops the temporary file, leaving the original
//! byte-for-byte as it was. Replacing cannot create a new entry: if the
//! target is absent the call fails with [`ContainerError::NotFound`] before
//! anything is written.

use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::Path;

use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{entry_names, Archive, ContainerError, ContainerStore};

impl ContainerStore {
    /// Replace the bytes of `entry` inside `container`.
    ///
    /// On success the container has the same entries in the same order, all
    /// byte-identical except `entry`, which now holds `bytes`.
    ///
    /// # Errors
    ///
    /// - [`ContainerError::Io`]/[`ContainerError::Format`] if the source
    ///   cannot be opened
    /// - [`ContainerError::NotFound`] if `entry` does not exist
    /// - [`ContainerError::PartialWrite`] if writing the replacement fails;
    ///   the original container is untouched
    pub fn replace_entry(
        &self,
        container: &Path,
        entry: &str,
        bytes: &[u8],
    ) -> Result<(), ContainerError> {
        self.replace_entry_with(container, entry, bytes, |file| file)
    }

    /// [`Self::replace_entry`] with a hook wrapping the temporary file's
    /// writer, used to inject write failures.
    pub(crate) fn replace_entry_with<W, F>(
        &self,
        container: &Path,
        entry: &str,
        bytes: &[u8],
        wrap: F,
    ) -> Result<(), ContainerError>
    where
        W: Write + Seek,
        F: FnOnce(File) -> W,
    {
        let mut archive = self.open(container)?;

        if !entry_names(&mut archive, container)?
            .iter()
            .any(|name| name == entry)
        {
            return Err(ContainerError::NotFound {
                path: container.to_path_buf(),
                entry: entry.to_string(),
            });
        }

        let partial = |message: String| ContainerError::PartialWrite {
            path: container.to_path_buf(),
            message,
        };

        let dir = container
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp = tempfile::Builder::new()
            .prefix(".spdedup-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| partial(format!("cannot create temporary file: {e}")))?;
        let handle = temp
            .reopen()
            .map_err(|e| partial(format!("cannot open temporary file: {e}")))?;

        let writer = ZipWriter::new(wrap(handle));
        copy_with_replacement(&mut archive, writer, entry, bytes)
            .map_err(|e| partial(e.to_string()))?;

        // Release the source handle before the swap.
        drop(archive);

        temp.as_file()
            .sync_all()
            .map_err(|e| partial(format!("cannot sync temporary file: {e}")))?;
        if let Ok(metadata) = fs::metadata(container) {
            if let Err(e) = fs::set_permissions(temp.path(), metadata.permissions()) {
                log::debug!("Could not carry permissions to {}: {}", temp.path().display(), e);
            }
        }
        temp.persist(container)
            .map_err(|e| partial(format!("cannot swap in rewritten container: {}", e.error)))?;

        log::debug!(
            "Replaced {}!{} ({} byte(s))",
            container.display(),
            entry,
            bytes.len()
        );
        Ok(())
    }
}

/// Stream every entry of `archive` into `writer`, substituting `bytes` for
/// `entry`, then finish the archive.
fn copy_with_replacement<W: Write + Seek>(
    archive: &mut Archive,
    mut writer: ZipWriter<W>,
    entry: &str,
    bytes: &[u8],
) -> ZipResult<()> {
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        if file.name() != entry {
            writer.raw_copy_file(file)?;
            continue;
        }

        let method = match file.compression() {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let mut options = SimpleFileOptions::default().compression_method(method);
        if let Some(modified) = file.last_modified() {
            options = options.last_modified_time(modified);
        }
        drop(file);

        writer.start_file(entry, options)?;
        writer.write_all(bytes)?;
    }
    writer.finish()?;
    Ok(())
}
