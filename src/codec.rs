//! Nine-column tab-separated encoding of a [`Record`].
//!
//! Column order is fixed and shared by every catalog file ever written:
//!
//! ```text
//! 0 id  1 year  2 title  3 summary  4 inventor  5 location  6 related  7 field  8 description
//! ```
//!
//! Older catalogs predate the `field` column (7 cells) or the `description`
//! column (8 cells); both still decode. Values are written verbatim: a value
//! containing a tab or newline corrupts its row, and the encoder does not try
//! to hide that. A value that begins with `"` does not survive either: the
//! catalog reader takes it as a quoted cell and strips the quotes, so
//! a title written as `"Abacus"` loads back as `Abacus`.

use crate::error::RecordError;
use crate::record::{Record, RecordDraft};
use tracing::{debug, warn};

/// Number of columns written by [`encode_row`].
pub const COLUMN_COUNT: usize = 9;

/// Column names in storage order, used for the header row.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "id",
    "year",
    "title",
    "summary",
    "inventor",
    "location",
    "related",
    "field",
    "description",
];

/// `field` value given to legacy rows written before the column existed.
pub const UNKNOWN_FIELD: &str = "Unknown";

/// Cell count of a legacy row missing the `field` column.
const LEGACY_WIDTH: usize = 7;

/// Header row matching [`COLUMNS`], without a trailing newline.
pub fn header_row() -> String {
    COLUMNS.join("\t")
}

/// Encode a record as one tab-separated row (no trailing newline).
///
/// Empty cells are legal but usually mean the model skipped a field, so they
/// are reported with a warning naming their column indices.
pub fn encode_row(record: &Record) -> String {
    let cells = cells(record);

    let empty = empty_cells(&cells);
    if !empty.is_empty() {
        warn!(
            id = record.identifier(),
            empty_fields = ?empty,
            "Encoding row with empty fields"
        );
    }

    cells.join("\t")
}

/// Zero-based column indices that would be written empty for `record`.
pub fn empty_field_indices(record: &Record) -> Vec<usize> {
    empty_cells(&cells(record))
}

/// Decode the cells of one row into a record.
///
/// - 8 or 9 cells map positionally; an empty 9th cell means no description.
/// - 7 cells are a legacy row: `field` is filled with [`UNKNOWN_FIELD`].
/// - any other width is rejected with [`RecordError::RowWidth`].
///
/// Header rows are not recognised here; the catalog drops them.
pub fn decode_row<S: AsRef<str>>(cells: &[S]) -> Result<Record, RecordError> {
    let cell = |i: usize| cells[i].as_ref().to_string();

    let field = match cells.len() {
        LEGACY_WIDTH => {
            warn!(
                id = cells[0].as_ref(),
                "Short row: only {} fields found, field set to '{}'",
                LEGACY_WIDTH,
                UNKNOWN_FIELD
            );
            UNKNOWN_FIELD.to_string()
        }
        8 | COLUMN_COUNT => cell(7),
        found => return Err(RecordError::RowWidth { found }),
    };

    let description = cells.get(8).map(|d| d.as_ref().to_string());
    if description.is_none() {
        debug!(id = cells[0].as_ref(), "Row has no description column");
    }

    RecordDraft {
        identifier: Some(cell(0)),
        year: cell(1),
        title: cell(2),
        summary: cell(3),
        inventor: cell(4),
        location: cell(5),
        related: cell(6),
        field,
        description,
    }
    .into_record()
}

fn cells(record: &Record) -> [&str; COLUMN_COUNT] {
    [
        record.identifier(),
        record.year(),
        record.title(),
        record.summary(),
        record.inventor(),
        record.location(),
        record.related(),
        record.field(),
        record.description().unwrap_or(""),
    ]
}

fn empty_cells(cells: &[&str]) -> Vec<usize> {
    cells
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_empty())
        .map(|(i, _)| i)
        .collect()
}
