// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output packaging — bundle multi-buffer results into a single zip archive.

use std::io::{Cursor, Write};

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::ArchiveNaming;
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Pack a sequence of buffers into a deflate-compressed zip archive.
///
/// Entries are named by `naming` with 1-based indices matching the buffer
/// order. A failure on any entry fails the whole archive; no partial output
/// is returned.
#[instrument(skip(buffers), fields(buffer_count = buffers.len()))]
pub fn pack(buffers: &[Vec<u8>], naming: ArchiveNaming) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (index, buffer) in buffers.iter().enumerate() {
        let entry_name = naming.entry_name(index + 1);
        writer
            .start_file(entry_name, options)
            .map_err(|err| BlattwerkError::Archive(format!("failed to open entry: {err}")))?;
        writer
            .write_all(buffer)
            .map_err(|err| BlattwerkError::Archive(format!("failed to write entry: {err}")))?;
    }

    let cursor = writer
        .finish()
        .map_err(|err| BlattwerkError::Archive(format!("failed to finalise archive: {err}")))?;

    let archive = cursor.into_inner();
    debug!(archive_bytes = archive.len(), "Archive packed");
    Ok(archive)
}
