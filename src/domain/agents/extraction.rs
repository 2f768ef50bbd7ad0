//! Recovery of a typed result from free-form backend text.
//!
//! Models asked for "only JSON" still wrap it in prose or markdown fences,
//! and occasionally mention braces in the prose itself. Candidates are tried
//! in order and the first one that both deserializes and validates wins:
//!
//! 1. the whole reply, with any code fence removed
//! 2. every balanced top-level `{...}` span, left to right
//! 3. the balanced span opened by each `{`, so stray unmatched braces in
//!    the prose cannot hide a later object
//! 4. the span from the first `{` to the last `}`

use serde_json::Value;
use tracing::debug;

use crate::domain::schemas::StructuredOutput;

use super::errors::StepError;

/// Parses and validates `text` as `T` using the candidate order above.
///
/// # Errors
///
/// `ResponseFormat` carrying the last parse or validation failure and the
/// head of the raw text.
pub fn extract_structured<T: StructuredOutput>(text: &str) -> Result<T, StepError> {
    let candidates = json_candidates(text);
    if candidates.is_empty() {
        return Err(StepError::response_format("no JSON object found", text));
    }

    let schema = T::schema_name();
    let mut last_failure = String::new();
    for (index, candidate) in candidates.iter().enumerate() {
        match parse_candidate::<T>(candidate) {
            Ok(value) => {
                debug!(candidate = index, schema = %schema, "extracted structured output");
                return Ok(value);
            }
            Err(reason) => last_failure = reason,
        }
    }

    Err(StepError::response_format(
        format!("no candidate matched {}: {}", schema, last_failure),
        text,
    ))
}

/// Converts an already-parsed JSON value into `T` and validates it.
pub fn from_value<T: StructuredOutput>(value: Value) -> Result<T, String> {
    let parsed: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
    parsed.validate().map_err(|e| e.to_string())?;
    Ok(parsed)
}

fn parse_candidate<T: StructuredOutput>(candidate: &str) -> Result<T, String> {
    let parsed: T = serde_json::from_str(candidate).map_err(|e| e.to_string())?;
    parsed.validate().map_err(|e| e.to_string())?;
    Ok(parsed)
}

/// Every span worth trying, deduplicated, in priority order.
pub fn json_candidates(text: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |candidate: &str| {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !candidates.iter().any(|c| c == candidate) {
            candidates.push(candidate.to_string());
        }
    };

    let unfenced = strip_code_fence(text);
    if unfenced.starts_with('{') && unfenced.ends_with('}') {
        push(unfenced);
    }
    for candidate in balanced_objects(text) {
        push(candidate);
    }
    for candidate in anchored_objects(text) {
        push(candidate);
    }
    if let Some(span) = outer_brace_span(text) {
        push(span);
    }

    candidates
}

/// Removes a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Top-level balanced `{...}` spans. Braces inside string literals are ignored.
pub fn balanced_objects(text: &str) -> Vec<&str> {
    let mut objects = Vec::new();
    let mut depth: u32 = 0;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escape = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        objects.push(&text[s..=idx]);
                    }
                }
            }
            _ => {}
        }
    }

    objects
}

/// The balanced object opened at each `{`, in order of the opening brace.
pub fn anchored_objects(text: &str) -> Vec<&str> {
    text.char_indices()
        .filter(|(_, ch)| *ch == '{')
        .filter_map(|(start, _)| balanced_from(text, start))
        .collect()
}

/// Balanced `{...}` starting at byte `start`, which must hold a `{`.
fn balanced_from(text: &str, start: usize) -> Option<&str> {
    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escape = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Span from the first `{` to the last `}`, if both exist in that order.
pub fn outer_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
