//! Per-request parameters for the aggregation engine and the ranges they are
//! clamped to.

use serde::{Deserialize, Serialize};

// ── RowLimit ──────────────────────────────────────────────────────────────────

/// An inclusive range plus the value used when the caller supplies nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLimit {
    pub min: usize,
    pub max: usize,
    pub default: usize,
}

impl RowLimit {
    pub const fn new(min: usize, max: usize, default: usize) -> Self {
        Self { min, max, default }
    }

    /// Resolve a caller-supplied count: `None` takes the default, anything
    /// else (zero and negatives included) is clamped into `[min, max]`.
    pub fn resolve(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.default,
            Some(n) if n < 0 => self.min,
            // Must not panic when a hand-edited config has min > max.
            Some(n) => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .max(self.min)
                .min(self.max),
        }
    }

    /// `true` when `min <= default <= max`.
    pub fn is_consistent(&self) -> bool {
        self.min <= self.default && self.default <= self.max
    }
}

// ── RowLimits ─────────────────────────────────────────────────────────────────

/// Configured ranges for every caller-sized view.
///
/// Fields left out of a config file keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowLimits {
    /// Top-N channel ranking.
    pub channels: RowLimit,
    /// Top-M country view totals.
    pub countries: RowLimit,
    /// Rows shown in the per-country leaderboard.
    pub leaderboard_size: usize,
}

impl Default for RowLimits {
    fn default() -> Self {
        Self {
            channels: RowLimit::new(3, 50, 10),
            countries: RowLimit::new(3, 20, 5),
            leaderboard_size: 5,
        }
    }
}

// ── QueryParams ───────────────────────────────────────────────────────────────

/// Recognised request parameters. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pub num_channels: Option<i64>,
    pub num_countries: Option<i64>,
    pub country: Option<String>,
}

impl QueryParams {
    /// Build params from loosely-typed key/value pairs such as a decoded
    /// query string.
    ///
    /// Unknown keys are ignored. A row count that is not an integer is
    /// treated as absent, so it falls back to the default. An empty
    /// `country` is treated as absent.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut params = QueryParams::default();
        for (key, value) in pairs {
            match key {
                "num_channels" => params.num_channels = value.trim().parse().ok(),
                "num_countries" => params.num_countries = value.trim().parse().ok(),
                "country" => {
                    params.country = Some(value.to_string()).filter(|c| !c.trim().is_empty())
                }
                _ => {}
            }
        }
        params
    }
}

/// [`QueryParams`] after clamping against [`RowLimits`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub num_channels: usize,
    pub num_countries: usize,
    pub leaderboard_size: usize,
    pub country: Option<String>,
}

impl ResolvedQuery {
    pub fn new(params: &QueryParams, limits: &RowLimits) -> Self {
        Self {
            num_channels: limits.channels.resolve(params.num_channels),
            num_countries: limits.countries.resolve(params.num_countries),
            leaderboard_size: limits.leaderboard_size,
            country: params.country.clone(),
        }
    }
}
