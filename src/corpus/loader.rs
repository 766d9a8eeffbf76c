// CSV loading for the corpus, price series, and merged output.
//
// The corpus is one normalized CSV (entity,date,title,body). Price series
// live one file per entity in a directory; the file is found by name.
// Rows that fail to parse are skipped with a warning — scraped corpora are
// expected to be partially dirty.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{Reader, Writer};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{parse_date, PricePoint, TextRecord};
use crate::buzz::merge::MergedSeries;
use crate::error::AnalysisError;

#[derive(Debug, Deserialize)]
struct CorpusRow {
    entity: String,
    date: String,
    title: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
}

/// Load the normalized text corpus.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<TextRecord>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open corpus: {}", path.display()))?;
    let records = read_corpus(file)?;
    info!(
        path = %path.display(),
        records = records.len(),
        "Loaded text corpus"
    );
    Ok(records)
}

/// Parse corpus rows from any reader. Split out from `load_corpus` so it can
/// be fed in-memory data.
pub fn read_corpus<R: std::io::Read>(input: R) -> Result<Vec<TextRecord>> {
    let mut reader = Reader::from_reader(input);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in reader.deserialize::<CorpusRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(line = line + 2, error = %e, "Skipping malformed corpus row");
                skipped += 1;
                continue;
            }
        };

        let Some(date) = parse_date(&row.date) else {
            warn!(line = line + 2, date = %row.date, "Skipping corpus row with bad date");
            skipped += 1;
            continue;
        };

        records.push(TextRecord {
            entity: row.entity.trim().to_string(),
            date,
            title: row.title,
            body: row.body,
        });
    }

    if skipped > 0 {
        debug!(skipped, "Corpus rows skipped");
    }

    Ok(records)
}

/// Find the price CSV for an entity: the first `.csv` file (by sorted name)
/// whose file name contains the entity name.
pub fn find_price_file(dir: &Path, entity: &str) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read price directory: {}", dir.display()))?;

    let mut matches: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(entity) && n.ends_with(".csv"))
        })
        .collect();
    matches.sort();

    Ok(matches.into_iter().next())
}

/// Load the price series for an entity from the price directory, sorted by date.
///
/// A missing file is a `MissingPriceData` error rather than an empty series.
pub fn load_price_series(dir: &Path, entity: &str) -> Result<Vec<PricePoint>> {
    let path = find_price_file(dir, entity)?.ok_or_else(|| AnalysisError::MissingPriceData {
        entity: entity.to_string(),
    })?;

    let file =
        File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    let prices = read_prices(file)?;

    info!(
        entity,
        path = %path.display(),
        rows = prices.len(),
        "Loaded price series"
    );
    Ok(prices)
}

/// Parse price rows from any reader, sorted by date.
pub fn read_prices<R: std::io::Read>(input: R) -> Result<Vec<PricePoint>> {
    let mut reader = Reader::from_reader(input);
    let mut prices = Vec::new();

    for result in reader.deserialize::<PriceRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Skipping malformed price row");
                continue;
            }
        };
        let Some(date) = parse_date(&row.date) else {
            warn!(date = %row.date, "Skipping price row with bad date");
            continue;
        };
        prices.push(PricePoint {
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    prices.sort_by_key(|p| p.date);
    Ok(prices)
}

/// Write a merged series as `date,close,total_mentions` for charting.
pub fn write_merged<P: AsRef<Path>>(merged: &MergedSeries, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["date", "close", "total_mentions"])?;
    for row in &merged.rows {
        writer.write_record([
            row.price.date.format("%Y-%m-%d").to_string(),
            row.price.close.to_string(),
            row.total_mentions.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_read_corpus_skips_bad_rows() {
        let data = "entity,date,title,body\n\
                    코나아이,2022-03-01,제목,본문\n\
                    코나아이,not-a-date,제목,본문\n\
                    안랩,2022-03-02 10:00:00,,본문만\n";
        let records = read_corpus(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entity, "코나아이");
        assert_eq!(records[1].date, d("2022-03-02"));
        assert_eq!(records[1].title, None);
        assert_eq!(records[1].body.as_deref(), Some("본문만"));
    }

    #[test]
    fn test_read_prices_sorts_and_ignores_extra_columns() {
        let data = "Date,Open,High,Low,Close,Volume,Change\n\
                    2022-03-02,1,2,0.5,101,1000,0.01\n\
                    2022-03-01,1,2,0.5,100,900,0.02\n";
        let prices = read_prices(data.as_bytes()).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].date, d("2022-03-01"));
        assert!((prices[0].close - 100.0).abs() < f64::EPSILON);
        assert_eq!(prices[1].volume, Some(1000.0));
    }

    #[test]
    fn test_read_prices_close_only() {
        let data = "Date,Close\n2022-03-01,100\n";
        let prices = read_prices(data.as_bytes()).unwrap();
        assert_eq!(prices, vec![PricePoint::close_only(d("2022-03-01"), 100.0)]);
    }

    #[test]
    fn test_find_price_file_by_entity_name() {
        let dir = std::env::temp_dir().join("themebuzz-price-lookup-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("안랩_주가.csv"), b"Date,Close\n").unwrap();
        std::fs::write(dir.join("덕성_주가.csv"), b"Date,Close\n").unwrap();
        std::fs::write(dir.join("안랩_메모.txt"), b"").unwrap();

        let found = find_price_file(&dir, "안랩").unwrap().unwrap();
        assert!(found.ends_with("안랩_주가.csv"));
        assert!(find_price_file(&dir, "써니전자").unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_price_series_missing_file_is_typed_error() {
        let dir = std::env::temp_dir().join("themebuzz-price-missing-test");
        std::fs::create_dir_all(&dir).unwrap();

        let err = load_price_series(&dir, "평화산업").unwrap_err();
        let typed = err.downcast_ref::<AnalysisError>().unwrap();
        assert!(matches!(typed, AnalysisError::MissingPriceData { .. }));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
