// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-document — Document transformations for the Blattwerk pipeline.
//
// Provides PDF operations (split, merge, lock, unlock, image recompression),
// page rasterisation to common image formats, and zip packaging of multi-buffer
// results.

pub mod archive;
pub mod pdf;
pub mod raster;

// Re-export the operation entry points so callers can use
// `blattwerk_document::split` etc.
pub use pdf::assemble::{merge, split};
pub use pdf::ranges::resolve;
pub use pdf::recompress::recompress;
pub use pdf::security::{lock, unlock};
pub use raster::rasterize;
