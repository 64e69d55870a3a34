// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF codec — the single boundary through which documents enter and leave the
// pipeline as bytes, using the `lopdf` crate.

use blattwerk_core::error::{BlattwerkError, Result};
use lopdf::Document;
use tracing::debug;

/// How far back from the end of the buffer the `%%EOF` trailer marker is
/// searched for. Producers append incremental-update data after the marker,
/// but never this much of it.
const TRAILER_SEARCH_WINDOW: usize = 1024;

/// Cheap structural sniff: does this byte buffer plausibly hold a PDF?
///
/// Checks the `%PDF-` header and the presence of an `%%EOF` trailer marker
/// near the end of the buffer. This is a gate against obviously wrong
/// uploads, not a validity proof — `open` still performs full parsing.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    if bytes.len() < 8 || !bytes.starts_with(b"%PDF-") {
        return false;
    }
    let tail_start = bytes.len().saturating_sub(TRAILER_SEARCH_WINDOW);
    bytes[tail_start..]
        .windows(b"%%EOF".len())
        .any(|window| window == b"%%EOF")
}

/// Parse a PDF from memory.
///
/// Password-protected documents are reported as invalid input here; callers
/// that can supply a password go through [`crate::pdf::security`] instead.
pub fn open(bytes: &[u8]) -> Result<Document> {
    let document = Document::load_mem(bytes).map_err(|err| match err {
        lopdf::Error::Decryption(_) => {
            BlattwerkError::InvalidInput("document is password protected".to_string())
        }
        other => BlattwerkError::Corrupt(format!("failed to parse PDF: {other}")),
    })?;

    debug!(pages = document.get_pages().len(), "PDF parsed from bytes");
    Ok(document)
}

/// Serialise a document back to bytes.
pub fn serialize(document: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|err| BlattwerkError::Pdf(format!("failed to serialise document: {err}")))?;
    Ok(output)
}

/// Number of pages in the document's page tree.
pub fn page_count(document: &Document) -> u32 {
    document.get_pages().len() as u32
}
