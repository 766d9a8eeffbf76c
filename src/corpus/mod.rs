// Corpus types — the normalized text records and price rows the pipeline reads.
//
// Upstream scrapers (news, stock community boards) are unioned elsewhere into
// one shape: entity, date, title, body. Prices arrive as one date-ordered
// series per entity.

pub mod loader;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single article or community post about an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    pub entity: String,
    pub date: NaiveDate,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl TextRecord {
    pub fn new(entity: &str, date: NaiveDate, title: &str, body: &str) -> Self {
        Self {
            entity: entity.to_string(),
            date,
            title: Some(title.to_string()),
            body: Some(body.to_string()),
        }
    }

    /// Title and body joined by a single space. Missing fields become empty.
    pub fn full_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or(""),
            self.body.as_deref().unwrap_or("")
        )
    }
}

/// One trading day of a price series. Only `close` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PricePoint {
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// Inclusive date range; either side may be unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// The window covering every date.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Parse a corpus date. Accepts `YYYY-MM-DD` and anything that starts with
/// it (e.g. `2022-03-01 09:30:00`, `2022-03-01T09:30:00`).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
