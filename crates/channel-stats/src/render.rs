//! Plain-text rendering of a [`DashboardView`] and an [`IngestReport`].

use std::fmt::{self, Write};

use stats_core::formatting::{format_compact, format_count, percentage};
use stats_data::aggregator::ChannelRow;
use stats_data::analysis::{DashboardView, NoDataReason, ViewStatus};
use stats_data::ingest::IngestReport;

const RULE: &str = "────────────────────────────────────────────────────────────";

pub fn render_view(view: &DashboardView) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_view(&mut out, view)?;
    Ok(out)
}

pub fn render_ingest(report: &IngestReport) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_ingest(&mut out, report)?;
    Ok(out)
}

fn write_view(out: &mut String, view: &DashboardView) -> fmt::Result {
    if let ViewStatus::NoData(reason) = &view.status {
        return writeln!(out, "No data available: {}", describe(reason));
    }

    section(out, "Top channels by subscribers")?;
    channel_table(out, &view.top_channels)?;

    section(out, "Video views by country")?;
    let total_views = view.summary.total_views;
    for total in &view.country_totals {
        writeln!(
            out,
            "  {:<28} {:>10} {:>6.1}%",
            total.country,
            format_compact(total.views),
            percentage(total.views, total_views, 1)
        )?;
    }

    section(out, "Countries")?;
    for country in &view.countries {
        let marker = if view.selected_country.as_deref() == Some(country.as_str()) {
            '*'
        } else {
            ' '
        };
        writeln!(out, "  {marker} {country}")?;
    }

    if let Some(country) = &view.selected_country {
        section(out, &format!("Leaderboard: {country}"))?;
        channel_table(out, &view.leaderboard)?;
    }

    section(out, "Summary")?;
    let summary = &view.summary;
    writeln!(out, "  Channels:          {}", format_count(summary.total_channels as f64))?;
    writeln!(out, "  Total subscribers: {}", format_count(summary.total_subscribers))?;
    writeln!(out, "  Total views:       {}", format_count(summary.total_views))?;
    writeln!(out, "  Mean subscribers:  {}", format_count(summary.mean_subscribers as f64))?;

    if view.metadata.rows_valid < view.metadata.rows_loaded {
        writeln!(
            out,
            "\n{} of {} stored rows skipped",
            view.metadata.rows_loaded - view.metadata.rows_valid,
            view.metadata.rows_loaded
        )?;
    }

    Ok(())
}

fn write_ingest(out: &mut String, report: &IngestReport) -> fmt::Result {
    writeln!(
        out,
        "Data loaded into {} (table: {})",
        report.destination.display(),
        report.table
    )?;
    writeln!(
        out,
        "  {} rows read, {} stored, {} dropped",
        report.rows_read, report.rows_stored, report.rows_dropped
    )?;
    if !report.unmapped_columns.is_empty() {
        writeln!(out, "  Ignored columns: {}", report.unmapped_columns.join(", "))?;
    }
    if let Some(reason) = &report.malformed {
        writeln!(out, "  Source was malformed and loaded as empty: {reason}")?;
    }
    Ok(())
}

fn describe(reason: &NoDataReason) -> String {
    match reason {
        NoDataReason::TableMissing => "nothing has been ingested yet".to_string(),
        NoDataReason::LoadFailed(e) => format!("the stored table could not be read ({e})"),
        NoDataReason::EmptyTable => "the stored table is empty".to_string(),
        NoDataReason::NoValidRows => "no stored row has all required fields".to_string(),
    }
}

fn section(out: &mut String, title: &str) -> fmt::Result {
    if !out.is_empty() {
        out.push('\n');
    }
    writeln!(out, "{title}\n{RULE}")
}

fn channel_table(out: &mut String, rows: &[ChannelRow]) -> fmt::Result {
    for row in rows {
        writeln!(
            out,
            "  {:>3}. {:<32} {:>8} subs {:>8} views  {}",
            row.rank,
            row.channel_name,
            format_compact(row.subscribers),
            format_compact(row.views),
            row.country
        )?;
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
