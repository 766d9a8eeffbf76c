// Colored terminal output for keyword profiles and buzz tables.
//
// This module handles all terminal-specific formatting. The main.rs command
// handlers delegate here.

use colored::Colorize;

use crate::buzz::merge::MergedSeries;
use crate::buzz::periods::QuietPeriod;
use crate::db::models::ExtractionRun;
use crate::keywords::profile::KeywordProfile;

/// Display a profile's keywords as a frequency bar chart, highest first.
///
/// Shows at most `top_n` keywords; the rest are counted in a footer line.
pub fn display_profile(profile: &KeywordProfile, top_n: usize) {
    let title = match &profile.candidate {
        Some(candidate) => format!("=== {} keywords ({}) ===", profile.entity, candidate),
        None => format!("=== {} keywords ===", profile.entity),
    };
    println!("\n{}", title.bold());
    println!();

    if profile.is_empty() {
        println!("  No keywords.");
        return;
    }

    let entries = profile.by_frequency();
    let max_freq = entries.first().map(|e| e.frequency).unwrap_or(1).max(1);
    let bar_width: usize = 20;

    for (i, entry) in entries.iter().take(top_n).enumerate() {
        let ratio = entry.frequency as f64 / max_freq as f64;
        let filled = (ratio * bar_width as f64).round() as usize;
        let bar = format!(
            "[{}{}]",
            "=".repeat(filled),
            " ".repeat(bar_width.saturating_sub(filled))
        );

        let colored_bar = if ratio >= 0.66 {
            bar.bright_green()
        } else if ratio >= 0.33 {
            bar.bright_yellow()
        } else {
            bar.bright_blue()
        };

        println!(
            "  {:>2}. {:<24} {} {}",
            i + 1,
            entry.keyword.bold(),
            colored_bar,
            entry.frequency
        );
    }

    let hidden = entries.len().saturating_sub(top_n);
    if hidden > 0 {
        println!(
            "\n  {}",
            format!("... and {hidden} more (use --top {} to show all)", entries.len()).dimmed()
        );
    }
    println!();
}

/// One line per stored profile: entity, candidate, keyword count, top keyword.
pub fn display_profile_list(profiles: &[KeywordProfile]) {
    if profiles.is_empty() {
        println!("No keyword profiles stored. Run `themebuzz extract` first.");
        return;
    }

    println!(
        "\n  {:<20} {:<12} {:>8}  {}",
        "Entity".dimmed(),
        "Candidate".dimmed(),
        "Keywords".dimmed(),
        "Top (by frequency)".dimmed()
    );
    println!("  {}", "-".repeat(64).dimmed());

    for profile in profiles {
        let top = profile
            .by_frequency()
            .first()
            .map(|e| format!("{} ({})", e.keyword, e.frequency))
            .unwrap_or_default();
        println!(
            "  {:<20} {:<12} {:>8}  {}",
            profile.entity,
            profile.candidate.as_deref().unwrap_or("-"),
            profile.len(),
            top
        );
    }
    println!();
}

/// Daily close vs. mentions table.
pub fn display_merged(merged: &MergedSeries) {
    println!(
        "\n{}",
        format!(
            "=== {} — close vs. keyword mentions ({} days, {} mentions) ===",
            merged.entity,
            merged.len(),
            merged.total_mentions()
        )
        .bold()
    );
    println!();
    println!(
        "  {:<12} {:>12} {:>10}",
        "Date".dimmed(),
        "Close".dimmed(),
        "Mentions".dimmed()
    );
    println!("  {}", "-".repeat(36).dimmed());

    for (date, close, mentions) in merged.triples() {
        let mentions_str = format!("{mentions:>10}");
        let mentions_str = if mentions > 0 {
            mentions_str.bright_red().to_string()
        } else {
            mentions_str.dimmed().to_string()
        };
        println!(
            "  {:<12} {:>12.2} {}",
            date.format("%Y-%m-%d"),
            close,
            mentions_str
        );
    }
    println!();
}

/// Quiet-period summary, most recent first.
pub fn display_quiet_periods(periods: &[QuietPeriod]) {
    println!("{}", "Mentions by period (zero-mention runs collapsed):".bold());
    for period in periods {
        let line = format!("  {:<26} {:>8}", period.label(), period.mentions);
        if period.mentions == 0 {
            println!("{}", line.dimmed());
        } else {
            println!("{line}");
        }
    }
    println!();
}

/// Summary of the last extraction run.
pub fn display_run(run: &ExtractionRun) {
    println!(
        "Last extraction: {} ({} embedder, top_k={}, min_freq={}) — {} records → {} profiles{}",
        run.ran_at,
        run.embedder,
        run.top_k,
        run.min_freq,
        run.records,
        run.profiles,
        run.candidate
            .as_deref()
            .map(|c| format!(", candidate {c}"))
            .unwrap_or_default()
    );
}
