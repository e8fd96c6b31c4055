//! JSON extraction from free-form model responses
//!
//! Candidates are tried in a fixed order of tiers and the first one that
//! decodes to an object carrying the expected discriminator key wins:
//! - the whole response
//! - fenced code blocks (```` ```json ```` first, then untyped fences)
//! - balanced `{...}` spans found by scanning the text

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Which tier produced an extracted record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    Direct,
    FencedBlock,
    BraceScan,
    Fallback,
}

impl fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionTier::Direct => "direct",
            ExtractionTier::FencedBlock => "fenced_block",
            ExtractionTier::BraceScan => "brace_scan",
            ExtractionTier::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Decode `candidate` into `T` if it is a JSON object holding `discriminator`
pub fn accept<T: DeserializeOwned>(candidate: &str, discriminator: &str) -> Option<T> {
    let value: Value = serde_json::from_str(candidate.trim()).ok()?;
    if !value.as_object()?.contains_key(discriminator) {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Tier 1: the whole response is the record
pub fn direct_decode<T: DeserializeOwned>(raw: &str, discriminator: &str) -> Option<T> {
    accept(raw, discriminator)
}

/// Tier 2: the first fenced block that holds the record
pub fn from_fenced_blocks<T: DeserializeOwned>(raw: &str, discriminator: &str) -> Option<T> {
    fenced_blocks(raw)
        .into_iter()
        .find_map(|block| accept(block, discriminator))
}

/// Tier 3: the first balanced brace span that holds the record
pub fn from_brace_scan<T: DeserializeOwned>(raw: &str, discriminator: &str) -> Option<T> {
    balanced_objects(raw)
        .into_iter()
        .find_map(|span| accept(span, discriminator))
}

/// Run tiers 1-3 in order, short-circuiting on the first hit.
///
/// `None` means the caller should build its fallback record.
pub fn extract_record<T: DeserializeOwned>(
    raw: &str,
    discriminator: &str,
) -> Option<(T, ExtractionTier)> {
    if let Some(record) = direct_decode(raw, discriminator) {
        return Some((record, ExtractionTier::Direct));
    }
    if let Some(record) = from_fenced_blocks(raw, discriminator) {
        return Some((record, ExtractionTier::FencedBlock));
    }
    from_brace_scan(raw, discriminator).map(|record| (record, ExtractionTier::BraceScan))
}

/// Bodies of fenced code blocks: `json`-tagged blocks first, then every
/// other block, each group in encounter order. An unterminated fence is
/// ignored.
pub fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut typed = Vec::new();
    let mut generic = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        let (tag, body_start) = match after_fence.find('\n') {
            Some(newline) => (after_fence[..newline].trim(), newline + 1),
            None => break,
        };
        let body_area = &after_fence[body_start..];
        let Some(close) = body_area.find("```") else {
            break;
        };

        let body = body_area[..close].trim();
        if tag.eq_ignore_ascii_case("json") {
            typed.push(body);
        } else {
            generic.push(body);
        }
        rest = &body_area[close + 3..];
    }

    typed.extend(generic);
    typed
}

/// Every maximal balanced `{...}` span, in encounter order.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count; quotes outside any object are prose and are ignored. An opening
/// brace that is never closed contributes no span, so well-formed objects
/// nested in a broken one are still found. Runs in a single pass.
pub fn balanced_objects(text: &str) -> Vec<&str> {
    let mut opens: Vec<usize> = Vec::new();
    let mut closed: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (index, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' if !opens.is_empty() => in_string = true,
            b'{' => opens.push(index),
            b'}' => {
                if let Some(open) = opens.pop() {
                    closed.push((open, index));
                }
            }
            _ => {}
        }
    }

    // Spans are nested or disjoint; keep the outermost ones
    closed.sort_unstable();
    let mut spans = Vec::new();
    let mut covered_to: Option<usize> = None;
    for (open, close) in closed {
        if covered_to.map_or(true, |end| open > end) {
            spans.push(&text[open..=close]);
            covered_to = Some(close);
        }
    }

    spans
}
