use serde::{Deserialize, Serialize};

/// Fixed name of the persisted canonical table.
pub const TABLE_NAME: &str = "youtube_stats";

// ── CellValue ─────────────────────────────────────────────────────────────────

/// One untyped cell of a [`RawTable`].
///
/// CSV sources only ever produce `Text` and `Missing`; cells loaded back from
/// storage may already be numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Missing,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Build a text cell, collapsing empty or whitespace-only input to `Missing`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            CellValue::Missing
        } else {
            CellValue::Text(s)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

// ── RawTable ──────────────────────────────────────────────────────────────────

/// A loosely-structured table: free-form headers and untyped rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Create a table with the given headers and no rows.
    pub fn with_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with `Missing` or truncating so its width
    /// always matches the header.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len(), CellValue::Missing);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// ── CanonicalField ────────────────────────────────────────────────────────────

/// The four fields every canonical record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ChannelName,
    Subscribers,
    Views,
    Country,
}

impl CanonicalField {
    /// All fields in storage column order.
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::ChannelName,
        CanonicalField::Subscribers,
        CanonicalField::Views,
        CanonicalField::Country,
    ];

    /// Column name used in storage and in normalized headers.
    pub fn column_name(self) -> &'static str {
        match self {
            CanonicalField::ChannelName => "channel_name",
            CanonicalField::Subscribers => "subscribers",
            CanonicalField::Views => "views",
            CanonicalField::Country => "country",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// A row after normalization but before validation: any field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCandidate {
    pub channel_name: Option<String>,
    pub subscribers: Option<f64>,
    pub views: Option<f64>,
    pub country: Option<String>,
}

impl RecordCandidate {
    /// Promote to a [`CanonicalRecord`] when all four fields are present.
    pub fn validate(&self) -> Option<CanonicalRecord> {
        Some(CanonicalRecord {
            channel_name: self.channel_name.clone()?,
            subscribers: self.subscribers?,
            views: self.views?,
            country: self.country.clone()?,
        })
    }
}

/// The normalized unit of truth persisted in [`TABLE_NAME`].
///
/// Numeric fields are always finite and non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub channel_name: String,
    pub subscribers: f64,
    pub views: f64,
    pub country: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_text_blank_is_missing() {
        assert_eq!(CellValue::text(""), CellValue::Missing);
        assert_eq!(CellValue::text("   "), CellValue::Missing);
        assert_eq!(CellValue::text("US"), CellValue::Text("US".to_string()));
    }

    #[test]
    fn test_raw_table_push_row_pads_and_truncates() {
        let mut table = RawTable::with_headers(["a", "b", "c"]);
        table.push_row(vec![CellValue::text("1")]);
        table.push_row(vec![
            CellValue::text("1"),
            CellValue::text("2"),
            CellValue::text("3"),
            CellValue::text("4"),
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].len(), 3);
        assert!(table.rows[0][2].is_missing());
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_canonical_field_column_names() {
        let names: Vec<&str> = CanonicalField::ALL.iter().map(|f| f.column_name()).collect();
        assert_eq!(names, vec!["channel_name", "subscribers", "views", "country"]);
    }

    #[test]
    fn test_candidate_validate_requires_all_fields() {
        let complete = RecordCandidate {
            channel_name: Some("T-Series".to_string()),
            subscribers: Some(245_000_000.0),
            views: Some(228_000_000_000.0),
            country: Some("India".to_string()),
        };
        let record = complete.validate().unwrap();
        assert_eq!(record.channel_name, "T-Series");
        assert_eq!(record.country, "India");

        let missing_views = RecordCandidate {
            views: None,
            ..complete
        };
        assert!(missing_views.validate().is_none());
        assert!(RecordCandidate::default().validate().is_none());
    }
}
