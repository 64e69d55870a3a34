// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range resolution — turns expressions such as "1-3,5,7-9" into
// validated, 1-indexed page ranges.

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_core::types::PageRange;

/// Resolve a comma-separated range expression against a document of
/// `total_pages` pages.
///
/// Each token is either a single page number (`"5"`) or an inclusive span
/// (`"7-9"`). Tokens keep their input order in the result; overlapping and
/// duplicate tokens are preserved, each producing its own range. Whitespace
/// around tokens and around the dash is tolerated.
pub fn resolve(expression: &str, total_pages: u32) -> Result<Vec<PageRange>> {
    let mut ranges = Vec::new();

    for token in expression.split(',') {
        let token = token.trim();

        let (start, end) = match token.split_once('-') {
            Some((start_text, end_text)) => {
                let start = parse_page_number(start_text, token)?;
                let end = parse_page_number(end_text, token)?;
                (start, end)
            }
            None => {
                let page = parse_page_number(token, token)?;
                (page, page)
            }
        };

        if start < 1 || end > total_pages || start > end {
            return Err(BlattwerkError::RangeBounds {
                start,
                end,
                total_pages,
            });
        }

        ranges.push(PageRange::new(start, end));
    }

    Ok(ranges)
}

fn parse_page_number(text: &str, token: &str) -> Result<u32> {
    text.trim()
        .parse()
        .map_err(|_| BlattwerkError::RangeParse(token.to_string()))
}
