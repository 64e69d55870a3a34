// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly — split a PDF into per-range parts, and merge multiple
// PDFs into one.

use std::collections::HashSet;

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::PageRange;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, info, instrument};

use crate::pdf::codec;

/// Split a document into one standalone PDF per resolved range.
///
/// Works by whitelist: each output starts as a clone of the full document,
/// pages outside the range are deleted (in reverse order so page numbers stay
/// stable), then orphaned objects are pruned. Ranges keep their input order
/// in the result; overlapping ranges each produce a complete part.
#[instrument(skip(bytes), fields(bytes_len = bytes.len(), range_count = ranges.len()))]
pub fn split(bytes: &[u8], ranges: &[PageRange]) -> Result<Vec<Vec<u8>>> {
    let document = codec::open(bytes)?;
    let total_pages = codec::page_count(&document);

    // The resolver bounds-checks against the same document; this guards
    // callers that pass ranges resolved elsewhere.
    for range in ranges {
        if range.start < 1 || range.end > total_pages {
            return Err(BlattwerkError::RangeBounds {
                start: range.start,
                end: range.end,
                total_pages,
            });
        }
    }

    info!(total_pages, parts = ranges.len(), "Splitting document");

    let mut parts = Vec::with_capacity(ranges.len());
    for range in ranges {
        let mut part = document.clone();

        let keep: HashSet<u32> = (range.start..=range.end).collect();
        let mut delete: Vec<u32> = (1..=total_pages).filter(|p| !keep.contains(p)).collect();
        delete.reverse();
        for page_number in delete {
            part.delete_pages(&[page_number]);
        }

        part.prune_objects();
        part.compress();

        let serialized = codec::serialize(&mut part)?;
        debug!(%range, part_bytes = serialized.len(), "Range extracted");
        parts.push(serialized);
    }

    Ok(parts)
}

/// Merge two or more PDFs into a single document, pages in input order.
///
/// The first document becomes the base; every other document's objects are
/// imported with their IDs shifted past the base's `max_id`, and the base's
/// page tree is rebuilt over the combined page list. Each input is validated
/// before any merging starts, so a bad input fails the whole operation
/// without producing partial output.
#[instrument(skip(documents), fields(document_count = documents.len()))]
pub fn merge(documents: &[Vec<u8>]) -> Result<Vec<u8>> {
    if documents.len() < 2 {
        return Err(BlattwerkError::InsufficientInputs(documents.len()));
    }

    let mut loaded = Vec::with_capacity(documents.len());
    for (index, bytes) in documents.iter().enumerate() {
        if !codec::looks_like_pdf(bytes) {
            return Err(BlattwerkError::InvalidMergeInput {
                index,
                reason: "missing PDF header or trailer marker".to_string(),
            });
        }
        let document =
            Document::load_mem(bytes).map_err(|err| BlattwerkError::InvalidMergeInput {
                index,
                reason: err.to_string(),
            })?;
        loaded.push(document);
    }

    let mut destination = loaded.remove(0);
    let mut destination_max_id = destination.max_id;
    let mut page_refs = page_references(&destination);

    info!(
        base_pages = page_refs.len(),
        additional_documents = loaded.len(),
        "Merging documents"
    );

    for source in loaded {
        let source_pages = page_references(&source);
        let id_offset = destination_max_id;

        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            destination
                .objects
                .insert(new_id, remap_references(object, id_offset));
        }

        for old_page in source_pages {
            page_refs.push((old_page.0 + id_offset, old_page.1));
        }

        destination_max_id = (source.max_id + id_offset).max(destination_max_id);
    }

    rebuild_page_tree(&mut destination, &page_refs)?;
    destination.max_id = destination_max_id;
    destination.compress();

    let merged = codec::serialize(&mut destination)?;
    debug!(
        total_pages = page_refs.len(),
        output_bytes = merged.len(),
        "Merge complete"
    );
    Ok(merged)
}

// -- Helpers ------------------------------------------------------------------

/// Page object IDs in page order.
fn page_references(document: &Document) -> Vec<ObjectId> {
    document.get_pages().values().copied().collect()
}

/// Recursively shift every `Object::Reference` inside `object` by `offset`.
fn remap_references(object: Object, offset: u32) -> Object {
    match object {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(array) => Object::Array(
            array
                .into_iter()
                .map(|item| remap_references(item, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_references(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_references(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the destination's /Pages node at the combined page list and fix up
/// every page's /Parent reference.
fn rebuild_page_tree(document: &mut Document, page_refs: &[ObjectId]) -> Result<()> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .map_err(|_| BlattwerkError::Pdf("merged document has no Root in trailer".to_string()))?
        .as_reference()
        .map_err(|_| BlattwerkError::Pdf("trailer Root is not a reference".to_string()))?;

    let pages_id = document
        .objects
        .get(&catalog_id)
        .ok_or_else(|| BlattwerkError::Pdf("catalog object not found".to_string()))?
        .as_dict()
        .map_err(|_| BlattwerkError::Pdf("catalog is not a dictionary".to_string()))?
        .get(b"Pages")
        .map_err(|_| BlattwerkError::Pdf("catalog has no /Pages entry".to_string()))?
        .as_reference()
        .map_err(|_| BlattwerkError::Pdf("/Pages is not a reference".to_string()))?;

    match document.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(pages_dict)) => {
            let kids: Vec<Object> = page_refs.iter().map(|&id| Object::Reference(id)).collect();
            pages_dict.set("Kids", Object::Array(kids));
            pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
        }
        _ => {
            return Err(BlattwerkError::Pdf(
                "/Pages does not resolve to a dictionary".to_string(),
            ));
        }
    }

    for &page_id in page_refs {
        if let Some(Object::Dictionary(page_dict)) = document.objects.get_mut(&page_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
    }

    Ok(())
}
