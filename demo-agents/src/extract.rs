//! Pull a JSON object out of free-form model output.
//!
//! Models wrap JSON in markdown fences, sometimes with a language tag,
//! sometimes with prose around it. The rules, in order:
//!
//! 1. exactly one ```` ```json ```` block: use its body
//! 2. otherwise the first fenced block of any kind (info string skipped)
//! 3. no fences at all: the whole text
//!
//! A fence only opens at the start of a line or when the rest of its line is
//! empty, and only closes at the start or end of a line. JSON string values
//! never contain raw newlines, so backticks inside them (a README embedded in
//! a file artifact, say) are not mistaken for fences.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::artifact::AgentOutput;

const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("found {count} ```json blocks, expected one")]
    AmbiguousFences { count: usize },
    #[error("code fence is never closed")]
    UnterminatedFence,
    #[error("no JSON found in output")]
    Empty,
    #[error("output is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("JSON does not have the expected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// A fenced region: its info string (`json`, `python`, or empty) and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block<'a> {
    info: &'a str,
    body: &'a str,
}

/// Locate the JSON text inside `raw` without parsing it.
pub fn locate_json(raw: &str) -> Result<&str, ExtractError> {
    let blocks = scan_blocks(raw)?;
    let json_blocks: Vec<&Block<'_>> = blocks
        .iter()
        .filter(|b| b.info.eq_ignore_ascii_case("json"))
        .collect();

    let candidate = match json_blocks.as_slice() {
        [] => blocks.first().map(|b| b.body).unwrap_or(raw),
        [only] => only.body,
        many => return Err(ExtractError::AmbiguousFences { count: many.len() }),
    };

    let candidate = candidate.trim();
    if candidate.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(candidate)
}

/// Extract and parse the embedded JSON value.
pub fn extract_json(raw: &str) -> Result<Value, ExtractError> {
    let text = locate_json(raw)?;
    serde_json::from_str(text).map_err(ExtractError::Parse)
}

/// Extract the embedded JSON and deserialize it into `T`.
pub fn extract_as<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let value = extract_json(raw)?;
    serde_json::from_value(value).map_err(ExtractError::Shape)
}

/// Extract the final pipeline output.
pub fn extract_agent_output(raw: &str) -> Result<AgentOutput, ExtractError> {
    let value = extract_json(raw)?;
    if !value.is_object() {
        return Err(ExtractError::Shape(serde::de::Error::custom(
            "expected a JSON object",
        )));
    }
    serde_json::from_value(value).map_err(ExtractError::Shape)
}

fn scan_blocks(raw: &str) -> Result<Vec<Block<'_>>, ExtractError> {
    let fences: Vec<usize> = raw.match_indices(FENCE).map(|(i, _)| i).collect();
    let mut blocks = Vec::new();
    let mut idx = 0;

    while idx < fences.len() {
        let open = fences[idx];
        let after = open + FENCE.len();
        let info_len = raw[after..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
            .unwrap_or(raw.len() - after);
        let body_start = after + info_len;

        if !(starts_line(raw, open) || ends_line(raw, body_start)) {
            idx += 1;
            continue;
        }

        let close = fences[idx + 1..]
            .iter()
            .position(|&f| f >= body_start && (starts_line(raw, f) || ends_line(raw, f + FENCE.len())))
            .map(|offset| idx + 1 + offset);

        match close {
            Some(close_idx) => {
                blocks.push(Block {
                    info: &raw[after..body_start],
                    body: &raw[body_start..fences[close_idx]],
                });
                idx = close_idx + 1;
            }
            // A stray fence in trailing prose doesn't spoil an earlier block.
            None if !blocks.is_empty() => break,
            None => return Err(ExtractError::UnterminatedFence),
        }
    }

    Ok(blocks)
}

/// Only whitespace between the previous newline and `pos`.
fn starts_line(raw: &str, pos: usize) -> bool {
    let line_start = raw[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    raw[line_start..pos].trim().is_empty()
}

/// Only whitespace between `pos` and the next newline.
fn ends_line(raw: &str, pos: usize) -> bool {
    let line_end = raw[pos..].find('\n').map(|i| pos + i).unwrap_or(raw.len());
    raw[pos..line_end].trim().is_empty()
}
