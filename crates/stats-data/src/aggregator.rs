//! Rankings, per-country totals and summary statistics over canonical records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stats_core::models::CanonicalRecord;

// ── Output rows ───────────────────────────────────────────────────────────────

/// One ranked channel, flat and ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRow {
    /// 1-based position in the ranking it belongs to.
    pub rank: usize,
    pub channel_name: String,
    pub subscribers: f64,
    pub views: f64,
    pub country: String,
}

/// Summed views for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTotal {
    pub country: String,
    pub views: f64,
}

/// Totals across all valid rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_channels: usize,
    pub total_subscribers: f64,
    pub total_views: f64,
    /// Mean subscriber count, truncated toward zero.
    pub mean_subscribers: u64,
}

// ── ChannelAggregator ─────────────────────────────────────────────────────────

/// Stateless helper computing the dashboard aggregates.
pub struct ChannelAggregator;

impl ChannelAggregator {
    /// The `n` records with the most subscribers.
    ///
    /// Ties keep source order.
    pub fn top_channels(records: &[CanonicalRecord], n: usize) -> Vec<ChannelRow> {
        Self::rank_by_subscribers(records.iter(), n)
    }

    /// Views summed per country, the `m` largest first.
    ///
    /// Ties are ordered by country label.
    pub fn country_totals(records: &[CanonicalRecord], m: usize) -> Vec<CountryTotal> {
        let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
        for record in records {
            *sums.entry(record.country.as_str()).or_default() += record.views;
        }

        // BTreeMap iterates in label order; the stable sort keeps it for ties.
        let mut totals: Vec<CountryTotal> = sums
            .into_iter()
            .map(|(country, views)| CountryTotal {
                country: country.to_string(),
                views,
            })
            .collect();
        totals.sort_by(|a, b| b.views.total_cmp(&a.views));
        totals.truncate(m);
        totals
    }

    /// Distinct countries, sorted.
    pub fn country_roster(records: &[CanonicalRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// The requested country when it is in `roster`, otherwise the first
    /// roster entry. `None` only when the roster is empty.
    pub fn select_country(roster: &[String], requested: Option<&str>) -> Option<String> {
        requested
            .and_then(|wanted| roster.iter().find(|c| c.as_str() == wanted))
            .or_else(|| roster.first())
            .cloned()
    }

    /// The `size` channels with the most subscribers in `country`.
    pub fn leaderboard(records: &[CanonicalRecord], country: &str, size: usize) -> Vec<ChannelRow> {
        Self::rank_by_subscribers(records.iter().filter(|r| r.country == country), size)
    }

    pub fn summarize(records: &[CanonicalRecord]) -> SummaryStats {
        if records.is_empty() {
            return SummaryStats::default();
        }

        let total_subscribers: f64 = records.iter().map(|r| r.subscribers).sum();
        let total_views: f64 = records.iter().map(|r| r.views).sum();
        let mean = total_subscribers / records.len() as f64;

        SummaryStats {
            total_channels: records.len(),
            total_subscribers,
            total_views,
            mean_subscribers: mean.trunc() as u64,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn rank_by_subscribers<'r>(
        records: impl Iterator<Item = &'r CanonicalRecord>,
        limit: usize,
    ) -> Vec<ChannelRow> {
        let mut ranked: Vec<&CanonicalRecord> = records.collect();
        // `sort_by` is stable, so equal counts keep source order.
        ranked.sort_by(|a, b| b.subscribers.total_cmp(&a.subscribers));

        ranked
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(idx, r)| ChannelRow {
                rank: idx + 1,
                channel_name: r.channel_name.clone(),
                subscribers: r.subscribers,
                views: r.views,
                country: r.country.clone(),
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
