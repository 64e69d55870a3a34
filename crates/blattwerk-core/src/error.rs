// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Blattwerk.

use thiserror::Error;

/// Top-level error type for all Blattwerk operations.
#[derive(Debug, Error)]
pub enum BlattwerkError {
    // -- Validation errors --
    #[error("malformed page range token: '{0}'")]
    RangeParse(String),

    #[error("page range {start}-{end} out of bounds for a {total_pages}-page document")]
    RangeBounds {
        start: u32,
        end: u32,
        total_pages: u32,
    },

    #[error("DPI {0} outside the supported range 72-600")]
    DpiOutOfRange(u32),

    #[error("quality {0} outside the supported range 0.1-1.0")]
    QualityOutOfRange(f32),

    #[error("unsupported raster format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("merging requires at least 2 documents, got {0}")]
    InsufficientInputs(usize),

    #[error("merge input #{index} is not a valid document: {reason}")]
    InvalidMergeInput { index: usize, reason: String },

    // -- Credential errors --
    #[error("invalid password")]
    InvalidPassword,

    // -- State errors --
    #[error("document is already encrypted")]
    AlreadyEncrypted,

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    // -- Structural errors --
    #[error("failed to parse document: {0}")]
    Corrupt(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("archive packaging failed: {0}")]
    Archive(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    // -- Capacity errors --
    #[error("rate limit exceeded for {endpoint}")]
    RateLimited { endpoint: String },
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlattwerkError>;

/// Broad failure category, used by callers to decide how an error is
/// presented: validation problems are the caller's fault, credential
/// failures get a dedicated message, capacity rejections carry no detail
/// at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed parameters or payloads. Never retried.
    Validation,
    /// Wrong password. Distinct from corruption so callers can say so.
    Credential,
    /// The document is not in the state the operation assumes.
    State,
    /// The codec boundary could not make sense of the bytes.
    Structural,
    /// Rejected before any pipeline work began.
    Capacity,
}

impl BlattwerkError {
    /// Classify this error into its broad failure category.
    pub fn class(&self) -> ErrorClass {
        match self {
            BlattwerkError::RangeParse(_)
            | BlattwerkError::RangeBounds { .. }
            | BlattwerkError::DpiOutOfRange(_)
            | BlattwerkError::QualityOutOfRange(_)
            | BlattwerkError::UnsupportedFormat(_)
            | BlattwerkError::InvalidInput(_)
            | BlattwerkError::InsufficientInputs(_)
            | BlattwerkError::InvalidMergeInput { .. } => ErrorClass::Validation,

            BlattwerkError::InvalidPassword => ErrorClass::Credential,

            BlattwerkError::AlreadyEncrypted
            | BlattwerkError::InvariantViolation(_) => ErrorClass::State,

            BlattwerkError::Corrupt(_)
            | BlattwerkError::Pdf(_)
            | BlattwerkError::Render(_)
            | BlattwerkError::Image(_)
            | BlattwerkError::Archive(_)
            | BlattwerkError::Io(_) => ErrorClass::Structural,

            BlattwerkError::RateLimited { .. } => ErrorClass::Capacity,
        }
    }
}
