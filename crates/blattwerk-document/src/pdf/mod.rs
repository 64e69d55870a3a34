// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page-range resolution, split/merge assembly, password
// protection, and embedded-image recompression.

pub mod assemble;
pub mod codec;
pub mod ranges;
pub mod recompress;
pub mod security;

#[cfg(test)]
pub(crate) mod testdoc;
