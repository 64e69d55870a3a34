// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Blattwerk document engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BlattwerkError;

/// Unique identifier attached to every engine request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inclusive, 1-based span of pages.
///
/// Invariant (enforced by the resolver): `1 <= start <= end <= total_pages`.
/// A single page is represented as `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Single-page range.
    pub fn single(page: u32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    /// Number of pages covered by this range.
    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Output image formats accepted by the rasterizer.
///
/// Parsed case-insensitively; `canonical()` echoes the uppercase name
/// callers see in responses, `extension()` is the lowercase file suffix
/// used for archive entry names. `Jpg` is kept distinct from `Jpeg` so the
/// echoed name and extension match what the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Jpg,
    Gif,
    Bmp,
}

impl RasterFormat {
    /// Parse a user-supplied format name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self, BlattwerkError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "PNG" => Ok(Self::Png),
            "JPEG" => Ok(Self::Jpeg),
            "JPG" => Ok(Self::Jpg),
            "GIF" => Ok(Self::Gif),
            "BMP" => Ok(Self::Bmp),
            _ => Err(BlattwerkError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Canonical uppercase name, echoed back to callers.
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Jpg => "JPG",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
        }
    }

    /// Lowercase file extension for archive entry names.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Jpg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }
}

impl std::str::FromStr for RasterFormat {
    type Err = BlattwerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Permission flags applied when a document is locked.
///
/// Immutable once constructed for a lock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionProfile {
    pub can_print: bool,
    pub can_extract_content: bool,
    pub can_modify: bool,
    pub can_modify_annotations: bool,
    pub can_fill_form: bool,
    pub can_extract_for_accessibility: bool,
}

impl PermissionProfile {
    /// The standard profile used by the engine's lock operation: printing,
    /// content extraction, form filling, and accessibility extraction are
    /// allowed; modification of content and annotations is not.
    pub fn standard() -> Self {
        Self {
            can_print: true,
            can_extract_content: true,
            can_modify: false,
            can_modify_annotations: false,
            can_fill_form: true,
            can_extract_for_accessibility: true,
        }
    }
}

impl Default for PermissionProfile {
    fn default() -> Self {
        Self::standard()
    }
}

/// Entry-naming scheme for packaged multi-buffer results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveNaming {
    /// `split_page_{i}.pdf`
    SplitPdf,
    /// `page_{i}.{ext}`
    PageImage(RasterFormat),
}

impl ArchiveNaming {
    /// Archive entry name for the buffer at 1-based position `index`.
    pub fn entry_name(&self, index: usize) -> String {
        match self {
            Self::SplitPdf => format!("split_page_{index}.pdf"),
            Self::PageImage(format) => format!("page_{index}.{}", format.extension()),
        }
    }
}
