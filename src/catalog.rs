//! The catalog: every record of a tab-separated file, in row order.
//!
//! A catalog is loaded once and then only read. Filters hand back borrowed
//! views in original order, never a modified catalog; writing rows back out
//! is left to the caller via [`crate::codec::encode_row`].
//!
//! The first row of the file is always treated as the header and dropped
//! before decoding, whatever it contains. Identifier uniqueness is not
//! checked: when two rows share an id, [`Catalog::find`] returns the first.

use crate::codec::decode_row;
use crate::error::CardsError;
use crate::record::Record;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// An ordered, header-stripped collection of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<Record>,
}

impl Catalog {
    /// Wrap already-validated records.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CardsError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CardsError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => CardsError::CatalogRead {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })?;

        let catalog = Self::from_reader(file).map_err(|e| match e {
            CardsError::CatalogRead { detail, .. } => CardsError::CatalogRead {
                path: path.to_path_buf(),
                detail,
            },
            other => other,
        })?;
        info!("Loaded {} inventions from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Read tab-separated rows, `"` quoting, header first.
    ///
    /// Quoting is honoured so hand-edited cells may hold tabs. The encoder
    /// does not quote, so a value written with a leading `"` comes back
    /// without its quotes.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CardsError> {
        let mut rows = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quote(b'"')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in rows.records().enumerate() {
            let row = row.map_err(|e| CardsError::CatalogRead {
                path: Default::default(),
                detail: e.to_string(),
            })?;
            if index == 0 {
                debug!("Skipping header row ({} cells)", row.len());
                continue;
            }

            let line = row
                .position()
                .map(|p| p.line())
                .unwrap_or(index as u64 + 1);
            let cells: Vec<&str> = row.iter().collect();
            let record =
                decode_row(&cells).map_err(|source| CardsError::InvalidRow { line, source })?;
            records.push(record);
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// First record whose identifier matches exactly.
    pub fn find(&self, identifier: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.identifier() == identifier)
    }

    /// Like [`find`](Self::find), but a miss is a lookup error.
    pub fn require(&self, identifier: &str) -> Result<&Record, CardsError> {
        self.find(identifier)
            .ok_or_else(|| CardsError::IdentifierNotFound {
                id: identifier.to_string(),
            })
    }

    /// Records whose numeric year lies in `from..=to`; a missing bound is open.
    ///
    /// With at least one bound, a record whose year has no numeric reading is
    /// left out with a warning. With no bounds every record is kept and no
    /// year is parsed.
    pub fn in_years(&self, from: Option<i64>, to: Option<i64>) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| year_in_range(r, from, to))
            .collect()
    }

    /// Apply a [`CatalogQuery`].
    ///
    /// The identifier filter runs first and fails the whole query when it
    /// matches nothing; the year bounds then narrow whatever is left.
    pub fn select(&self, query: &CatalogQuery) -> Result<Vec<&Record>, CardsError> {
        let candidates: Vec<&Record> = match query.one.as_deref() {
            Some(id) => vec![self.require(id)?],
            None => self.records.iter().collect(),
        };

        Ok(candidates
            .into_iter()
            .filter(|r| year_in_range(r, query.from_year, query.to_year))
            .collect())
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Selection applied by the generation commands (`--one`, `--from_year`,
/// `--to_year`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Exact identifier.
    pub one: Option<String>,
    /// Inclusive lower bound on [`Record::year_as_number`].
    pub from_year: Option<i64>,
    /// Inclusive upper bound on [`Record::year_as_number`].
    pub to_year: Option<i64>,
}

fn year_in_range(record: &Record, from: Option<i64>, to: Option<i64>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    match record.year_as_number() {
        Ok(year) => from.is_none_or(|f| year >= f) && to.is_none_or(|t| year <= t),
        Err(e) => {
            warn!(id = record.identifier(), "Skipped by year filter: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordDraft;

    const TSV: &str = "id\tyear\ttitle\tsummary\tinventor\tlocation\trelated\tfield\tdescription\n\
wheel\t3500BCE\tWheel\tRolling.\tUnknown\tMesopotamia\t\tGeneral\tThe wheel.\n\
printing-press\t1440\tPrinting press\tBooks.\tJohannes Gutenberg\tGermany\tWheel\tCulture\t\n\
telephone\t1876\tTelephone\tVoices.\tAlexander Graham Bell\tUnited States\tTelegraph\tScience: Physics\tBell.\n\
telephone\t1877\tTelephone\tDuplicate.\tSomeone Else\tUnited States\t\tScience\t\n";

    fn catalog() -> Catalog {
        Catalog::from_reader(TSV.as_bytes()).expect("valid catalog")
    }

    #[test]
    fn header_is_dropped() {
        let c = catalog();
        assert_eq!(c.len(), 4);
        assert_eq!(c.records()[0].identifier(), "wheel");
    }

    #[test]
    fn header_dropped_whatever_it_contains() {
        let tsv = "wheel\t3500BCE\tWheel\ts\ti\tl\t\tGeneral\n\
                   kite\t500BCE\tKite\ts\ti\tChina\t\tGeneral\n";
        let c = Catalog::from_reader(tsv.as_bytes()).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.records()[0].identifier(), "kite");
    }

    #[test]
    fn find_returns_first_match() {
        let c = catalog();
        let t = c.find("telephone").expect("present");
        assert_eq!(t.year(), "1876");
        assert!(c.find("steam-engine").is_none());
    }

    #[test]
    fn require_reports_missing_id() {
        let err = catalog().require("steam-engine").unwrap_err();
        assert!(matches!(err, CardsError::IdentifierNotFound { ref id } if id == "steam-engine"));
    }

    #[test]
    fn year_range_is_inclusive_and_ordered() {
        let c = catalog();
        let ids: Vec<&str> = c
            .in_years(Some(1440), Some(1876))
            .iter()
            .map(|r| r.identifier())
            .collect();
        assert_eq!(ids, vec!["printing-press", "telephone"]);

        let before_ce: Vec<&str> = c
            .in_years(None, Some(0))
            .iter()
            .map(|r| r.identifier())
            .collect();
        assert_eq!(before_ce, vec!["wheel"]);
        assert_eq!(c.len(), 4, "filtering must not shrink the catalog");
    }

    #[test]
    fn select_combines_filters() {
        let c = catalog();
        let query = CatalogQuery {
            one: Some("telephone".into()),
            from_year: Some(1800),
            to_year: None,
        };
        let picked = c.select(&query).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].inventor(), "Alexander Graham Bell");

        let out_of_range = CatalogQuery {
            one: Some("wheel".into()),
            from_year: Some(0),
            to_year: None,
        };
        assert!(c.select(&out_of_range).unwrap().is_empty());

        let unknown = CatalogQuery {
            one: Some("kite".into()),
            ..Default::default()
        };
        assert!(c.select(&unknown).is_err());
    }

    #[test]
    fn quoted_cells_may_hold_tabs() {
        let tsv = "header\n\
                   loom\t1785\tPower loom\t\"Weaving,\tfaster.\"\tEdmund Cartwright\tEngland\t\tGeneral\n";
        let c = Catalog::from_reader(tsv.as_bytes()).unwrap();
        assert_eq!(c.records()[0].summary(), "Weaving,\tfaster.");
    }

    #[test]
    fn leading_quote_does_not_round_trip() {
        let record = RecordDraft {
            identifier: Some("abacus".into()),
            year: "2400BCE".into(),
            title: "\"Abacus\"".into(),
            summary: "Counting frame.".into(),
            description: None,
            inventor: "Unknown".into(),
            location: "Sumer".into(),
            field: "Mathematics".into(),
            related: "Writing".into(),
        }
        .into_record()
        .unwrap();
        let tsv = format!("{}\n{}\n", crate::codec::header_row(), crate::codec::encode_row(&record));

        let c = Catalog::from_reader(tsv.as_bytes()).unwrap();
        assert_eq!(c.records()[0].title(), "Abacus");
        assert_ne!(c.records()[0], record);
    }

    #[test]
    fn bad_row_reports_line() {
        let tsv = "header\nwheel\t3500BCE\tWheel\n";
        let err = Catalog::from_reader(tsv.as_bytes()).unwrap_err();
        match err {
            CardsError::InvalidRow { line, source } => {
                assert_eq!(line, 2);
                assert_eq!(source, crate::error::RecordError::RowWidth { found: 3 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_is_empty_catalog() {
        let c = Catalog::from_reader("".as_bytes()).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn unparsable_year_loads_and_is_skipped_only_by_year_filters() {
        let tsv = "header\n\
                   abacus\tcirca 2400BCE\tAbacus\ts\ti\tSumer\t\tGeneral\t\n\
                   kite\t500BCE\tKite\ts\ti\tChina\t\tGeneral\t\n";
        let c = Catalog::from_reader(tsv.as_bytes()).expect("year text is not validated on load");
        assert_eq!(c.len(), 2);

        let abacus = c.require("abacus").unwrap();
        assert!(matches!(
            abacus.year_as_number(),
            Err(crate::error::RecordError::InvalidYear { .. })
        ));

        let by_id = CatalogQuery {
            one: Some("abacus".into()),
            ..Default::default()
        };
        assert_eq!(c.select(&by_id).unwrap().len(), 1);

        let ids: Vec<&str> = c
            .in_years(None, Some(0))
            .iter()
            .map(|r| r.identifier())
            .collect();
        assert_eq!(ids, vec!["kite"]);
    }
}
