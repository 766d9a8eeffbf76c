// Price merge — left-join the sparse buzz series onto the daily price series.
//
// The price series drives the join: every price row survives, and dates
// with no buzz get zero mentions. The window filter runs on the merged rows
// and is independent of any window used during aggregation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::BuzzSeries;
use crate::corpus::{DateWindow, PricePoint};
use crate::error::AnalysisError;

/// One price row extended with that date's keyword mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRow {
    pub price: PricePoint,
    pub total_mentions: u64,
}

/// Price series with a mentions column, in price order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedSeries {
    pub entity: String,
    pub rows: Vec<MergedRow>,
}

impl MergedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (date, close, total_mentions) triples for charting.
    pub fn triples(&self) -> Vec<(chrono::NaiveDate, f64, u64)> {
        self.rows
            .iter()
            .map(|r| (r.price.date, r.price.close, r.total_mentions))
            .collect()
    }

    pub fn total_mentions(&self) -> u64 {
        self.rows.iter().map(|r| r.total_mentions).sum()
    }
}

/// Merge buzz onto prices for one entity.
///
/// An empty price series is `MissingPriceData`.
pub fn merge_with_prices(
    entity: &str,
    prices: &[PricePoint],
    buzz: &BuzzSeries,
    window: &DateWindow,
) -> Result<MergedSeries, AnalysisError> {
    if prices.is_empty() {
        return Err(AnalysisError::MissingPriceData {
            entity: entity.to_string(),
        });
    }

    let rows: Vec<MergedRow> = prices
        .iter()
        .map(|p| MergedRow {
            price: p.clone(),
            total_mentions: buzz.total_on(p.date).unwrap_or(0),
        })
        .filter(|row| window.contains(row.price.date))
        .collect();

    debug!(
        entity,
        price_rows = prices.len(),
        merged_rows = rows.len(),
        buzz_dates = buzz.len(),
        "Merged buzz with prices"
    );

    Ok(MergedSeries {
        entity: entity.to_string(),
        rows,
    })
}
