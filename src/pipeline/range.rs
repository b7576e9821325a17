//! Page-range expressions: `"all"`, `"5"`, `"2-5,8"`, `"1, 1, 3-4"`.
//!
//! Tokens are 1-based and inclusive; the result is 0-based. Order and
//! repeats are preserved, since asking for a page twice is how callers
//! duplicate it in the output.

use crate::error::{PixelDriftError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)(?:-(\d+))?$").unwrap());

/// Resolve `expr` against a document of `page_count` pages.
///
/// # Errors
/// - [`PixelDriftError::InvalidPageRange`] for an empty or malformed token,
///   or a reversed `start-end` pair.
/// - [`PixelDriftError::PageOutOfRange`] naming the first page outside
///   `1..=page_count`.
pub fn parse_pages(expr: &str, page_count: usize) -> Result<Vec<usize>> {
    let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.eq_ignore_ascii_case("all") {
        return Ok((0..page_count).collect());
    }
    if compact.is_empty() {
        return Err(PixelDriftError::InvalidPageRange {
            token: expr.to_string(),
            reason: "expression is empty".into(),
        });
    }

    let mut indices = Vec::new();
    for token in compact.split(',') {
        let (start, end) = parse_token(token)?;
        if start > end {
            return Err(PixelDriftError::InvalidPageRange {
                token: token.to_string(),
                reason: format!("start {start} is after end {end}"),
            });
        }
        for page in [start, end] {
            if page == 0 || page > page_count {
                return Err(PixelDriftError::PageOutOfRange {
                    page,
                    total: page_count,
                });
            }
        }
        indices.extend((start - 1)..end);
    }
    Ok(indices)
}

fn parse_token(token: &str) -> Result<(usize, usize)> {
    let invalid = |reason: &str| PixelDriftError::InvalidPageRange {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    let caps = TOKEN
        .captures(token)
        .ok_or_else(|| invalid("expected N or N-M"))?;
    let number = |s: &str| s.parse::<usize>().map_err(|_| invalid("number too large"));

    let start = number(&caps[1])?;
    let end = match caps.get(2) {
        Some(m) => number(m.as_str())?,
        None => start,
    };
    Ok((start, end))
}
