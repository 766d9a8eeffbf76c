// Buzz aggregation — count keyword mentions per calendar date.
//
// Matching is a literal, case-sensitive substring search that allows
// overlapping hits. It is deliberately not word-boundary aware: "코나" also
// matches inside "코나아이". Historical buzz counts depend on this, so it is
// kept as-is.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corpus::{DateWindow, TextRecord};
use crate::error::AnalysisError;
use crate::keywords::profile::ProfileSet;

/// Total keyword mentions on one date, with the per-keyword breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzPoint {
    pub date: NaiveDate,
    pub total_mentions: u64,
    pub by_keyword: BTreeMap<String, u64>,
}

/// Date-ordered mention totals. Sparse: dates with no mentions are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzSeries {
    pub entity: String,
    pub points: Vec<BuzzPoint>,
}

impl BuzzSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// (date, total) pairs in date order.
    pub fn totals(&self) -> Vec<(NaiveDate, u64)> {
        self.points
            .iter()
            .map(|p| (p.date, p.total_mentions))
            .collect()
    }

    pub fn total_on(&self, date: NaiveDate) -> Option<u64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].total_mentions)
    }
}

/// Count occurrences of `needle` in `haystack`, overlapping hits included.
/// An empty needle counts as zero.
pub fn count_occurrences(haystack: &str, needle: &str) -> u64 {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        let hit = start + pos;
        // Step past the first character of the hit so overlaps are found.
        let step = haystack[hit..].chars().next().map_or(1, char::len_utf8);
        start = hit + step;
    }
    count
}

/// Build the buzz series for one entity.
///
/// Only records for `entity` dated inside `window` count. The entity must
/// have a keyword profile; a missing profile is `MissingKeywordData`, never
/// an empty series.
pub fn aggregate(
    entity: &str,
    profiles: &ProfileSet,
    records: &[TextRecord],
    window: &DateWindow,
) -> Result<BuzzSeries, AnalysisError> {
    let profile = profiles.require(entity)?;
    let keywords: Vec<&str> = profile.keywords().filter(|k| !k.is_empty()).collect();

    let mut by_date: BTreeMap<NaiveDate, BTreeMap<String, u64>> = BTreeMap::new();
    let mut scanned = 0usize;

    for record in records
        .iter()
        .filter(|r| r.entity == entity && window.contains(r.date))
    {
        scanned += 1;
        let text = record.full_text();
        for &keyword in &keywords {
            let hits = count_occurrences(&text, keyword);
            if hits > 0 {
                *by_date
                    .entry(record.date)
                    .or_default()
                    .entry(keyword.to_string())
                    .or_insert(0) += hits;
            }
        }
    }

    let points: Vec<BuzzPoint> = by_date
        .into_iter()
        .map(|(date, by_keyword)| BuzzPoint {
            date,
            total_mentions: by_keyword.values().sum(),
            by_keyword,
        })
        .collect();

    debug!(
        entity,
        records_scanned = scanned,
        keywords = keywords.len(),
        dates_with_buzz = points.len(),
        "Aggregated keyword buzz"
    );

    Ok(BuzzSeries {
        entity: entity.to_string(),
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_simple() {
        assert_eq!(count_occurrences("코나 코나 코나", "코나"), 3);
        assert_eq!(count_occurrences("코나아이", "코나"), 1);
        assert_eq!(count_occurrences("abc", "x"), 0);
    }

    #[test]
    fn test_count_overlapping() {
        assert_eq!(count_occurrences("ㅋㅋㅋ", "ㅋㅋ"), 2);
        assert_eq!(count_occurrences("aaaa", "aa"), 3);
    }

    #[test]
    fn test_count_case_sensitive() {
        assert_eq!(count_occurrences("AhnLab ahnlab", "AhnLab"), 1);
    }

    #[test]
    fn test_count_empty_needle() {
        assert_eq!(count_occurrences("anything", ""), 0);
    }
}
