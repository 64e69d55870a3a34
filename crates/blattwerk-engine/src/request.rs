// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation requests and responses for the engine surface.

use blattwerk_core::types::RequestId;
use serde::{Deserialize, Serialize};

/// A single pipeline operation with its inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Remove password protection from a document.
    Unlock { file: Vec<u8>, password: String },
    /// Apply password protection to an unprotected document.
    Lock {
        file: Vec<u8>,
        password: String,
        #[serde(default)]
        owner_password: Option<String>,
    },
    /// Extract page ranges into standalone documents, packaged as a zip.
    Split { file: Vec<u8>, ranges: String },
    /// Combine two or more documents into one.
    Merge { files: Vec<Vec<u8>> },
    /// Render every page to an image, packaged as a zip.
    Rasterize {
        file: Vec<u8>,
        format: String,
        dpi: u32,
    },
    /// Re-encode embedded images as JPEG at the given quality.
    Recompress { file: Vec<u8>, quality: f32 },
}

impl Operation {
    /// Endpoint path for admission control.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Operation::Unlock { .. } => "/pdf/unlock",
            Operation::Lock { .. } => "/pdf/lock",
            Operation::Split { .. } => "/pdf/split",
            Operation::Merge { .. } => "/pdf/merge",
            Operation::Rasterize { .. } => "/pdf/rasterize",
            Operation::Recompress { .. } => "/pdf/recompress",
        }
    }

    /// Total input payload size in bytes.
    pub fn input_bytes(&self) -> usize {
        match self {
            Operation::Unlock { file, .. }
            | Operation::Lock { file, .. }
            | Operation::Split { file, .. }
            | Operation::Rasterize { file, .. }
            | Operation::Recompress { file, .. } => file.len(),
            Operation::Merge { files } => files.iter().map(Vec::len).sum(),
        }
    }
}

/// What kind of payload an operation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// A single PDF document.
    Pdf,
    /// A zip archive of multiple buffers.
    Archive,
}

/// Size and timing figures for one completed operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationMetrics {
    pub input_bytes: usize,
    pub output_bytes: usize,
    /// Number of logical buffers the operation produced (pages or parts);
    /// 1 for single-document outputs.
    pub buffer_count: usize,
    pub elapsed_ms: u64,
}

/// A completed operation: the payload plus its correlation ID and metrics.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutput {
    pub request_id: RequestId,
    pub kind: OutputKind,
    pub bytes: Vec<u8>,
    pub metrics: OperationMetrics,
}
