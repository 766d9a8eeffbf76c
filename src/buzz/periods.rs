// Quiet-period summary for a merged series.
//
// Long stretches of zero-mention days make a daily table hard to scan.
// Consecutive zero rows collapse into one period; every day with mentions
// stays its own row. Output is most recent first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::merge::MergedSeries;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mentions: u64,
}

impl QuietPeriod {
    /// `YYYY-MM-DD` for a single day, `YYYY-MM-DD ~ YYYY-MM-DD` for a run.
    pub fn label(&self) -> String {
        if self.start == self.end {
            self.start.format("%Y-%m-%d").to_string()
        } else {
            format!(
                "{} ~ {}",
                self.start.format("%Y-%m-%d"),
                self.end.format("%Y-%m-%d")
            )
        }
    }
}

/// Collapse runs of zero-mention rows. Rows are visited in date order
/// regardless of the input order.
pub fn summarize(merged: &MergedSeries) -> Vec<QuietPeriod> {
    let mut rows: Vec<(NaiveDate, u64)> = merged
        .rows
        .iter()
        .map(|r| (r.price.date, r.total_mentions))
        .collect();
    rows.sort_by_key(|&(date, _)| date);

    let mut periods = Vec::new();
    let mut zero_run: Option<(NaiveDate, NaiveDate)> = None;

    for (date, mentions) in rows {
        if mentions == 0 {
            zero_run = Some(match zero_run {
                Some((start, _)) => (start, date),
                None => (date, date),
            });
            continue;
        }
        if let Some((start, end)) = zero_run.take() {
            periods.push(QuietPeriod {
                start,
                end,
                mentions: 0,
            });
        }
        periods.push(QuietPeriod {
            start: date,
            end: date,
            mentions,
        });
    }

    if let Some((start, end)) = zero_run {
        periods.push(QuietPeriod {
            start,
            end,
            mentions: 0,
        });
    }

    periods.reverse();
    periods
}
