//! The catalog record: one invention or discovery.
//!
//! A [`Record`] can only be obtained through validation — either from a JSON
//! object emitted by the model ([`Record::from_json`]) or from a
//! [`RecordDraft`] assembled by the delimited-text codec. Its fields are
//! private so that the identifier/description defaulting done at construction
//! is the only mutation it ever sees.
//!
//! ## Years
//!
//! Years are kept as strings because the source material dates some entries
//! before the common era (`"450BCE"`). The string is stored as given; only
//! [`Record::year_as_number`] interprets it, and fails on anything that is not
//! a number with an optional `BCE` suffix (`"circa 1500"`). A record with such
//! a year is still a record: it can be listed, looked up and illustrated, it
//! just cannot take part in year-range filtering.

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Literal suffix marking a year before the common era.
pub const BCE_SUFFIX: &str = "BCE";

/// One validated invention/discovery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordDraft")]
pub struct Record {
    #[serde(rename = "id")]
    identifier: String,
    year: String,
    title: String,
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    inventor: String,
    location: String,
    field: String,
    related: String,
}

impl Record {
    /// Validate a loosely-shaped JSON object into a record.
    ///
    /// Every required field must be present and be a JSON string; `id` and
    /// `description` may be absent, `null` or a string. Nothing is coerced:
    /// callers that accept numeric years (the response parser) stringify them
    /// before calling this.
    pub fn from_json(value: &Value) -> Result<Self, RecordError> {
        let obj = value.as_object().ok_or_else(|| RecordError::NotAnObject {
            found: json_kind(value).to_string(),
        })?;

        RecordDraft {
            identifier: optional_str(obj, "id")?,
            year: required_str(obj, "year")?,
            title: required_str(obj, "title")?,
            summary: required_str(obj, "summary")?,
            description: optional_str(obj, "description")?,
            inventor: required_str(obj, "inventor")?,
            location: required_str(obj, "location")?,
            field: required_str(obj, "field")?,
            related: required_str(obj, "related")?,
        }
        .into_record()
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Full source text, `None` for legacy rows that never stored it.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn inventor(&self) -> &str {
        &self.inventor
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Top-level field, optionally followed by `: Sub-field`.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Comma-separated prior inventions; empty means none.
    pub fn related(&self) -> &str {
        &self.related
    }

    /// Signed year: `"1876"` → `1876`, `"450BCE"` → `-450`.
    ///
    /// # Errors
    /// [`RecordError::InvalidYear`] when the year has non-numeric residual text.
    pub fn year_as_number(&self) -> Result<i64, RecordError> {
        parse_year(&self.year)
    }
}

/// Unvalidated record fields, all plain strings.
///
/// The codec fills one of these positionally from a row; [`into_record`]
/// applies the defaulting rules and validates the year.
///
/// [`into_record`]: RecordDraft::into_record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    #[serde(rename = "id", default)]
    pub identifier: Option<String>,
    pub year: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub inventor: String,
    pub location: String,
    pub field: String,
    pub related: String,
}

impl RecordDraft {
    /// Validate and freeze the draft.
    ///
    /// - an absent or empty identifier is derived from the title with [`slug`]
    /// - an empty description collapses to `None`
    ///
    /// The year is not interpreted here; see [`Record::year_as_number`].
    pub fn into_record(self) -> Result<Record, RecordError> {
        let identifier = match self.identifier {
            Some(id) if !id.is_empty() => id,
            _ => slug(&self.title),
        };
        let description = self.description.filter(|d| !d.is_empty());

        Ok(Record {
            identifier,
            year: self.year,
            title: self.title,
            summary: self.summary,
            description,
            inventor: self.inventor,
            location: self.location,
            field: self.field,
            related: self.related,
        })
    }
}

impl TryFrom<RecordDraft> for Record {
    type Error = RecordError;

    fn try_from(draft: RecordDraft) -> Result<Self, Self::Error> {
        draft.into_record()
    }
}

/// Parse a year string into a signed number.
///
/// A value ending in [`BCE_SUFFIX`] is negated after the suffix is removed
/// (`"450BCE"` and `"450 BCE"` both give `-450`). Anything else must be a
/// plain non-negative integer.
pub fn parse_year(year: &str) -> Result<i64, RecordError> {
    let invalid = || RecordError::InvalidYear {
        year: year.to_string(),
    };

    let trimmed = year.trim();
    let (digits, before_common_era) = match trimmed.strip_suffix(BCE_SUFFIX) {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: i64 = digits.parse().map_err(|_| invalid())?;

    Ok(if before_common_era { -value } else { value })
}

/// Derive an identifier from a title.
///
/// Lower-cases, drops apostrophes (straight and typographic) and turns spaces
/// into hyphens: `"O'Brien's Law"` → `"obriens-law"`.
pub fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| c == '\'' || c == '\u{2019}', "")
        .replace(' ', "-")
}

/// Capitalise the first character and lower-case the rest.
///
/// Models tend to title-case every word ("Steam Engine"); the catalog keeps
/// sentence case ("Steam engine").
pub fn normalize_title(title: &str) -> String {
    let mut chars = title.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    }
}

fn required_str(obj: &Map<String, Value>, field: &'static str) -> Result<String, RecordError> {
    optional_str(obj, field)?.ok_or(RecordError::MissingField { field })
}

fn optional_str(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, RecordError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(RecordError::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
