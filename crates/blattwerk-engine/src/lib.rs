// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-engine — The operation layer over the document pipeline.
//
// Accepts typed operation requests, runs admission control and input
// validation, dispatches to blattwerk-document, and packages the result
// (single PDFs as-is, multi-buffer outputs as zip archives).

pub mod request;
pub mod service;

pub use request::{Operation, OperationMetrics, OperationOutput, OutputKind};
pub use service::DocumentService;
