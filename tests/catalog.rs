//! Integration tests over catalogs on disk.

use invention_cards::codec::{encode_row, header_row};
use invention_cards::{Catalog, CatalogQuery, CardsError, Record, RecordDraft, RecordError};
use std::io::Write;
use tempfile::NamedTempFile;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn record(title: &str, year: &str, description: Option<&str>) -> Record {
    RecordDraft {
        identifier: None,
        year: year.into(),
        title: title.into(),
        summary: format!("{title} changes things."),
        description: description.map(str::to_string),
        inventor: "Unknown".into(),
        location: "Earth".into(),
        field: "General".into(),
        related: String::new(),
    }
    .into_record()
    .unwrap()
}

fn write_catalog(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn sample() -> Vec<Record> {
    vec![
        record("Wheel", "3500BCE", Some("Solid wooden discs.")),
        record("Writing", "3200 BCE", None),
        record("Printing press", "1440", Some("Movable type.")),
        record("Telephone", "1876", None),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn extracted_rows_load_back_unchanged() {
    let records = sample();
    let mut lines = vec![header_row()];
    lines.extend(records.iter().map(encode_row));
    let file = write_catalog(&lines);

    let catalog = Catalog::load(file.path()).unwrap();
    assert_eq!(catalog.records(), records.as_slice());
    assert_eq!(catalog.require("writing").unwrap().year_as_number(), Ok(-3200));
}

#[test]
fn year_filters_span_the_era_boundary() {
    let file = write_catalog(
        &std::iter::once(header_row())
            .chain(sample().iter().map(encode_row))
            .collect::<Vec<_>>(),
    );
    let catalog = Catalog::load(file.path()).unwrap();

    let ancient = catalog
        .select(&CatalogQuery {
            to_year: Some(0),
            ..Default::default()
        })
        .unwrap();
    let ids: Vec<&str> = ancient.iter().map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["wheel", "writing"]);

    let middle = catalog.in_years(Some(-3300), Some(1500));
    let ids: Vec<&str> = middle.iter().map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["writing", "printing-press"]);
}

#[test]
fn one_and_year_bounds_combine() {
    let file = write_catalog(
        &std::iter::once(header_row())
            .chain(sample().iter().map(encode_row))
            .collect::<Vec<_>>(),
    );
    let catalog = Catalog::load(file.path()).unwrap();

    let hit = catalog
        .select(&CatalogQuery {
            one: Some("telephone".into()),
            from_year: Some(1800),
            to_year: None,
        })
        .unwrap();
    assert_eq!(hit.len(), 1);

    let filtered_out = catalog
        .select(&CatalogQuery {
            one: Some("telephone".into()),
            from_year: Some(1900),
            to_year: None,
        })
        .unwrap();
    assert!(filtered_out.is_empty());

    assert!(matches!(
        catalog.select(&CatalogQuery {
            one: Some("time-machine".into()),
            ..Default::default()
        }),
        Err(CardsError::IdentifierNotFound { .. })
    ));
}

#[test]
fn legacy_seven_column_rows_get_unknown_field() {
    let file = write_catalog(&[
        header_row(),
        "abacus\t2400BCE\tAbacus\tCounting.\tUnknown\tSumer\tWriting".to_string(),
    ]);
    let catalog = Catalog::load(file.path()).unwrap();
    let abacus = catalog.require("abacus").unwrap();
    assert_eq!(abacus.field(), "Unknown");
    assert_eq!(abacus.description(), None);
}

#[test]
fn bad_row_width_reports_its_line() {
    let file = write_catalog(&[
        header_row(),
        encode_row(&record("Wheel", "3500BCE", None)),
        "lever\t250BCE\tLever\tLifting.\tArchimedes".to_string(),
    ]);
    let err = Catalog::load(file.path()).unwrap_err();
    match err {
        CardsError::InvalidRow { line, source } => {
            assert_eq!(line, 3);
            assert_eq!(source, RecordError::RowWidth { found: 5 });
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn circa_year_row_still_serves_lookups() {
    let file = write_catalog(&[
        header_row(),
        encode_row(&record("Wheel", "3500BCE", None)),
        "lever\tcirca 250BCE\tLever\tLifting.\tArchimedes\tSyracuse\t\tScience\t".to_string(),
    ]);
    let catalog = Catalog::load(file.path()).unwrap();

    let lever = catalog.require("lever").unwrap();
    assert_eq!(lever.year(), "circa 250BCE");
    assert!(matches!(
        lever.year_as_number(),
        Err(RecordError::InvalidYear { .. })
    ));

    let ancient = catalog
        .select(&CatalogQuery {
            to_year: Some(0),
            ..Default::default()
        })
        .unwrap();
    let ids: Vec<&str> = ancient.iter().map(|r| r.identifier()).collect();
    assert_eq!(ids, vec!["wheel"]);
}

#[test]
fn missing_catalog_is_file_not_found() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Catalog::load(dir.path().join("inventions.tsv")),
        Err(CardsError::FileNotFound { .. })
    ));
}
