//! The aggregation engine: persisted table in, render-ready dashboard out.
//!
//! Every request reloads the table, re-runs normalization over it and
//! recomputes all views. Nothing is cached between calls. Any storage
//! failure becomes a [`ViewStatus::NoData`] view rather than an error.

use serde::{Deserialize, Serialize};
use stats_core::error::Result;
use stats_core::models::{CanonicalRecord, RawTable, TABLE_NAME};
use stats_core::normalize::TableNormalizer;
use stats_core::query::{QueryParams, ResolvedQuery, RowLimits};
use tracing::{debug, warn};

use crate::aggregator::{ChannelAggregator, ChannelRow, CountryTotal, SummaryStats};
use crate::store::SqliteStore;

// ── Public types ──────────────────────────────────────────────────────────────

/// Why a view came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum NoDataReason {
    /// The table has never been written.
    TableMissing,
    /// The table exists but could not be read.
    LoadFailed(String),
    /// The table has no rows.
    EmptyTable,
    /// Every row lacked a required field.
    NoValidRows,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewStatus {
    Ready,
    NoData(NoDataReason),
}

/// Row counts behind a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMetadata {
    pub rows_loaded: usize,
    pub rows_valid: usize,
    pub unmapped_columns: Vec<String>,
}

/// Everything the presentation layer renders for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub status: ViewStatus,
    /// Top channels by subscribers.
    pub top_channels: Vec<ChannelRow>,
    /// Countries by summed views, largest first.
    pub country_totals: Vec<CountryTotal>,
    /// Every distinct country, sorted.
    pub countries: Vec<String>,
    pub selected_country: Option<String>,
    /// Top channels within `selected_country`.
    pub leaderboard: Vec<ChannelRow>,
    pub summary: SummaryStats,
    pub metadata: ViewMetadata,
}

impl DashboardView {
    /// The degenerate view: empty lists, zero counts.
    pub fn empty(reason: NoDataReason) -> Self {
        Self {
            status: ViewStatus::NoData(reason),
            top_channels: Vec::new(),
            country_totals: Vec::new(),
            countries: Vec::new(),
            selected_country: None,
            leaderboard: Vec::new(),
            summary: SummaryStats::default(),
            metadata: ViewMetadata::default(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ViewStatus::Ready
    }

    /// Country labels of [`Self::country_totals`], for chart axes.
    pub fn country_labels(&self) -> Vec<String> {
        self.country_totals.iter().map(|t| t.country.clone()).collect()
    }

    /// Summed views of [`Self::country_totals`], aligned with the labels.
    pub fn country_values(&self) -> Vec<f64> {
        self.country_totals.iter().map(|t| t.views).collect()
    }
}

// ── AggregationEngine ─────────────────────────────────────────────────────────

/// Computes [`DashboardView`]s from the table held by a [`SqliteStore`].
pub struct AggregationEngine<'a> {
    store: &'a SqliteStore,
    limits: RowLimits,
    table: String,
}

impl<'a> AggregationEngine<'a> {
    pub fn new(store: &'a SqliteStore, limits: RowLimits) -> Self {
        Self {
            store,
            limits,
            table: TABLE_NAME.to_string(),
        }
    }

    /// Read from a different table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Load the table and compute every view for `params`.
    ///
    /// Never fails: storage problems produce a [`ViewStatus::NoData`] view.
    pub fn compute_views(&self, params: &QueryParams) -> DashboardView {
        let table_available = match self.store.table_exists(&self.table) {
            Ok(found) => found,
            Err(e) => {
                warn!("Could not inspect {}: {}", self.store.path().display(), e);
                return DashboardView::empty(NoDataReason::LoadFailed(e.to_string()));
            }
        };
        compute_views(
            table_available,
            || self.store.load_table(&self.table),
            params,
            &self.limits,
        )
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Compute the dashboard given whether the table exists and how to load it.
///
/// `load` is only called when `table_available` is `true`.
pub fn compute_views<F>(
    table_available: bool,
    load: F,
    params: &QueryParams,
    limits: &RowLimits,
) -> DashboardView
where
    F: FnOnce() -> Result<RawTable>,
{
    if !table_available {
        debug!("No stored table; returning empty view");
        return DashboardView::empty(NoDataReason::TableMissing);
    }

    match load() {
        Ok(raw) => build_view(&raw, params, limits),
        Err(e) => {
            warn!("Failed to load stored table: {}", e);
            DashboardView::empty(NoDataReason::LoadFailed(e.to_string()))
        }
    }
}

/// Normalize a loaded table and compute every view over its valid rows.
pub fn build_view(raw: &RawTable, params: &QueryParams, limits: &RowLimits) -> DashboardView {
    if raw.is_empty() {
        return DashboardView::empty(NoDataReason::EmptyTable);
    }

    let normalized = TableNormalizer::normalize(raw);
    let records = normalized.valid_records();
    let metadata = ViewMetadata {
        rows_loaded: normalized.row_count(),
        rows_valid: records.len(),
        unmapped_columns: normalized.unmapped_columns,
    };
    debug!(
        "{} of {} stored rows valid",
        metadata.rows_valid, metadata.rows_loaded
    );

    if records.is_empty() {
        return DashboardView {
            metadata,
            ..DashboardView::empty(NoDataReason::NoValidRows)
        };
    }

    let query = ResolvedQuery::new(params, limits);
    DashboardView {
        metadata,
        ..aggregate(&records, &query)
    }
}

fn aggregate(records: &[CanonicalRecord], query: &ResolvedQuery) -> DashboardView {
    let countries = ChannelAggregator::country_roster(records);
    let selected_country = ChannelAggregator::select_country(&countries, query.country.as_deref());
    let leaderboard = selected_country
        .as_deref()
        .map(|c| ChannelAggregator::leaderboard(records, c, query.leaderboard_size))
        .unwrap_or_default();

    DashboardView {
        status: ViewStatus::Ready,
        top_channels: ChannelAggregator::top_channels(records, query.num_channels),
        country_totals: ChannelAggregator::country_totals(records, query.num_countries),
        countries,
        selected_country,
        leaderboard,
        summary: ChannelAggregator::summarize(records),
        metadata: ViewMetadata::default(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
