//! Response parsing: isolate the JSON array in a model answer and turn each
//! object into a [`Record`].
//!
//! Even when asked for bare JSON, general-purpose models often wrap the array
//! in a ```` ```json ```` fence and surround it with prose ("Here are the
//! inventions…"). The rules, in order:
//!
//! 1. If the body contains a ```` ```json ```` fence, the payload is the text
//!    between it and the next ```` ``` ````. A fence the model never closed
//!    runs to the end of the body.
//! 2. Otherwise the whole body is the payload.
//! 3. The payload must parse as a JSON array of objects.
//! 4. Each object's `year` is stringified (numeric years are common) and its
//!    `title` normalised to sentence case before validation; the identifier
//!    is derived from the normalised title.
//!
//! No deduplication happens here: two pages may well yield the same id.

use crate::error::PageError;
use crate::record::{normalize_title, Record, BCE_SUFFIX};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Opening fence of a JSON code block.
const JSON_FENCE: &str = "```json";

/// Payload of the first ```` ```json ```` block, up to the closing fence.
static RE_JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```json(.*?)```").expect("JSON fence pattern is valid")
});

/// Cap on how much of an offending payload is echoed into logs and errors.
const RAW_EXCERPT_CHARS: usize = 2000;

/// Parse a model answer for page `page_num` into records.
pub fn parse_content(page_num: usize, content: &str) -> Result<Vec<Record>, PageError> {
    let payload = isolate_json(content).map_err(|detail| {
        warn!(
            "Page {}: could not isolate JSON ({}):\n{}",
            page_num,
            detail,
            excerpt(content)
        );
        PageError::Extraction {
            page: page_num,
            detail,
        }
    })?;

    parse_records(page_num, payload)
}

/// Locate the JSON payload inside a response body.
pub fn isolate_json(content: &str) -> Result<&str, String> {
    let payload = match content.split_once(JSON_FENCE) {
        Some((_, after_fence)) => RE_JSON_FENCE
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map_or(after_fence, |m| m.as_str()),
        None => content,
    };

    let payload = payload.trim();
    if payload.is_empty() {
        return Err("response contains no JSON".to_string());
    }
    Ok(payload)
}

/// Parse an isolated payload into records, in emission order.
pub fn parse_records(page_num: usize, payload: &str) -> Result<Vec<Record>, PageError> {
    let malformed = |detail: String| {
        warn!(
            "Page {}: error parsing extracted JSON ({}):\n{}",
            page_num,
            detail,
            excerpt(payload)
        );
        PageError::MalformedJson {
            page: page_num,
            detail,
            raw: excerpt(payload),
        }
    };

    let json: Value = serde_json::from_str(payload).map_err(|e| malformed(e.to_string()))?;
    let Value::Array(items) = json else {
        return Err(malformed("expected a JSON array".to_string()));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, mut item) in items.into_iter().enumerate() {
        normalize_object(&mut item);
        let record = Record::from_json(&item).map_err(|e| PageError::InvalidRecord {
            page: page_num,
            index,
            detail: e.to_string(),
        })?;
        debug!("Page {}: parsed '{}' ({})", page_num, record.identifier(), record.year());
        records.push(record);
    }

    Ok(records)
}

/// Stringify a numeric year and sentence-case the title, in place.
///
/// Negative numbers become `<n>BCE` so that they stay valid years.
fn normalize_object(item: &mut Value) {
    let Some(obj) = item.as_object_mut() else {
        return;
    };

    let numeric_year = match obj.get("year") {
        Some(Value::Number(n)) => Some(match n.as_i64() {
            Some(y) if y < 0 => format!("{}{}", y.unsigned_abs(), BCE_SUFFIX),
            _ => n.to_string(),
        }),
        _ => None,
    };
    if let Some(year) = numeric_year {
        obj.insert("year".to_string(), Value::String(year));
    }

    if let Some(Value::String(title)) = obj.get_mut("title") {
        *title = normalize_title(title);
    }
}

fn excerpt(text: &str) -> String {
    text.chars().take(RAW_EXCERPT_CHARS).collect()
}
