//! Header normalization, alias resolution and numeric coercion.
//!
//! The same three steps run at ingestion time and again when the aggregation
//! engine loads the persisted table, so every step is idempotent on data that
//! is already canonical.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::{CanonicalField, CanonicalRecord, CellValue, RawTable, RecordCandidate};

// ── HeaderNormalizer ──────────────────────────────────────────────────────────

/// Turns free-form column headers into lower snake_case candidate keys.
pub struct HeaderNormalizer;

impl HeaderNormalizer {
    /// Trim, lower-case, and replace each space, hyphen and forward slash
    /// with an underscore.
    ///
    /// `"Country/Region"` becomes `"country_region"`, `" Video Views "`
    /// becomes `"video_views"`.
    pub fn normalize(header: &str) -> String {
        header
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' | '/' => '_',
                other => other,
            })
            .collect::<String>()
            .to_lowercase()
    }
}

// ── AliasResolver ─────────────────────────────────────────────────────────────

/// Known header variants, already in normalized form, and the canonical field
/// each maps to.
const ALIASES: &[(&str, CanonicalField)] = &[
    ("youtuber", CanonicalField::ChannelName),
    ("channel", CanonicalField::ChannelName),
    ("channelname", CanonicalField::ChannelName),
    ("channel_name", CanonicalField::ChannelName),
    ("subscriber", CanonicalField::Subscribers),
    ("subs", CanonicalField::Subscribers),
    ("subscriber_count", CanonicalField::Subscribers),
    ("subscribers", CanonicalField::Subscribers),
    ("video_views", CanonicalField::Views),
    ("view", CanonicalField::Views),
    ("total_views", CanonicalField::Views),
    ("views", CanonicalField::Views),
    ("region", CanonicalField::Country),
    ("nation", CanonicalField::Country),
    ("country", CanonicalField::Country),
];

/// Maps normalized header keys to canonical fields via [`ALIASES`].
pub struct AliasResolver;

impl AliasResolver {
    /// Resolve an already-normalized key. Unknown keys return `None` and are
    /// passed through untouched by the table normalizer.
    pub fn resolve(normalized: &str) -> Option<CanonicalField> {
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, field)| *field)
    }

    /// Normalize a raw header and resolve it in one step.
    pub fn resolve_header(header: &str) -> Option<CanonicalField> {
        Self::resolve(&HeaderNormalizer::normalize(header))
    }
}

// ── NumericCoercer ────────────────────────────────────────────────────────────

fn shorthand_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]*)(?:\.([0-9]*))?([KMB])?$").expect("regex is valid"))
}

/// Parses subscriber and view counts written in human shorthand.
pub struct NumericCoercer;

impl NumericCoercer {
    /// Coerce a cell to a non-negative finite number.
    ///
    /// Numbers pass through. Text is trimmed, upper-cased and stripped of
    /// `,` separators, then read as a plain decimal with an optional `K`,
    /// `M` or `B` suffix. Anything else, including signs and exponents,
    /// yields `None`.
    pub fn coerce(cell: &CellValue) -> Option<f64> {
        match cell {
            CellValue::Missing => None,
            CellValue::Number(n) => Self::accept(*n),
            CellValue::Text(s) => Self::parse_str(s),
        }
    }

    /// Parse a shorthand string such as `"1,234"`, `"2.3M"` or `"120K"`.
    pub fn parse_str(s: &str) -> Option<f64> {
        let cleaned = s.trim().to_uppercase().replace(',', "");
        let caps = shorthand_regex().captures(&cleaned)?;

        let int_part = caps.get(1).map_or("", |m| m.as_str());
        let frac_part = caps.get(2).map_or("", |m| m.as_str());
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let exponent: i32 = match caps.get(3).map(|m| m.as_str()) {
            Some("K") => 3,
            Some("M") => 6,
            Some("B") => 9,
            _ => 0,
        };

        // Shift the decimal point on the digit string so "2.3M" is exactly
        // 23e5 rather than 2.3 * 1e6.
        let shift = exponent - i32::try_from(frac_part.len()).ok()?;
        let scaled = format!("{}{}e{}", int_part, frac_part, shift);
        scaled.parse::<f64>().ok().and_then(Self::accept)
    }

    fn accept(n: f64) -> Option<f64> {
        (n.is_finite() && n >= 0.0).then_some(n)
    }
}

// ── TableNormalizer ───────────────────────────────────────────────────────────

/// Output of [`TableNormalizer::normalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    /// One candidate per source row, in source order.
    pub candidates: Vec<RecordCandidate>,
    /// Normalized names of columns that matched no alias.
    pub unmapped_columns: Vec<String>,
    /// Canonical fields with at least one source column.
    pub resolved_fields: Vec<CanonicalField>,
}

impl NormalizedTable {
    /// Rows carrying all four canonical fields, in source order.
    pub fn valid_records(&self) -> Vec<CanonicalRecord> {
        self.candidates
            .iter()
            .filter_map(RecordCandidate::validate)
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.candidates.len()
    }
}

/// Runs header normalization, alias resolution and numeric coercion over a
/// whole [`RawTable`].
pub struct TableNormalizer;

impl TableNormalizer {
    pub fn normalize(raw: &RawTable) -> NormalizedTable {
        // Source column indices per canonical field, left to right.
        let mut sources: [Vec<usize>; 4] = Default::default();
        let mut unmapped_columns = Vec::new();

        for (idx, header) in raw.headers.iter().enumerate() {
            let key = HeaderNormalizer::normalize(header);
            match AliasResolver::resolve(&key) {
                Some(field) => sources[field_slot(field)].push(idx),
                None => unmapped_columns.push(key),
            }
        }

        for field in CanonicalField::ALL {
            let count = sources[field_slot(field)].len();
            if count > 1 {
                debug!("{} source columns resolve to {}", count, field);
            }
        }

        let cols = |field: CanonicalField| &sources[field_slot(field)];
        let candidates = raw
            .rows
            .iter()
            .map(|row| RecordCandidate {
                channel_name: first_present(row, cols(CanonicalField::ChannelName), text_value),
                subscribers: first_present(row, cols(CanonicalField::Subscribers), NumericCoercer::coerce),
                views: first_present(row, cols(CanonicalField::Views), NumericCoercer::coerce),
                country: first_present(row, cols(CanonicalField::Country), text_value),
            })
            .collect();

        let resolved_fields = CanonicalField::ALL
            .into_iter()
            .filter(|f| !cols(*f).is_empty())
            .collect();

        NormalizedTable {
            candidates,
            unmapped_columns,
            resolved_fields,
        }
    }
}

fn field_slot(field: CanonicalField) -> usize {
    match field {
        CanonicalField::ChannelName => 0,
        CanonicalField::Subscribers => 1,
        CanonicalField::Views => 2,
        CanonicalField::Country => 3,
    }
}

/// First non-missing converted value among `cols`.
fn first_present<T>(
    row: &[CellValue],
    cols: &[usize],
    convert: impl Fn(&CellValue) -> Option<T>,
) -> Option<T> {
    cols.iter()
        .filter_map(|&idx| row.get(idx))
        .find_map(convert)
}

fn text_value(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Missing => None,
        CellValue::Text(s) if s.trim().is_empty() => None,
        CellValue::Text(s) => Some(s.clone()),
        CellValue::Number(n) if n.is_finite() => Some(if n.fract() == 0.0 {
            format!("{:.0}", n)
        } else {
            n.to_string()
        }),
        CellValue::Number(_) => None,
    }
}

/// Rebuild a [`RawTable`] with canonical headers from validated records.
pub fn records_to_table(records: &[CanonicalRecord]) -> RawTable {
    let mut table = RawTable::with_headers(CanonicalField::ALL.map(CanonicalField::column_name));
    for record in records {
        table.push_row(vec![
            CellValue::Text(record.channel_name.clone()),
            CellValue::Number(record.subscribers),
            CellValue::Number(record.views),
            CellValue::Text(record.country.clone()),
        ]);
    }
    table
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::text(*c)).collect()
    }

    // ── HeaderNormalizer ──────────────────────────────────────────────────────

    #[test]
    fn test_normalize_header_basic() {
        assert_eq!(HeaderNormalizer::normalize("  Video Views "), "video_views");
        assert_eq!(HeaderNormalizer::normalize("Subscriber-Count"), "subscriber_count");
        assert_eq!(HeaderNormalizer::normalize("Country/Region"), "country_region");
        assert_eq!(HeaderNormalizer::normalize("channel_name"), "channel_name");
    }

    #[test]
    fn test_normalize_header_idempotent() {
        for h in ["Total Views", "SUBS", "Channel-Name", "a/b c-d"] {
            let once = HeaderNormalizer::normalize(h);
            assert_eq!(HeaderNormalizer::normalize(&once), once);
        }
    }

    // ── AliasResolver ─────────────────────────────────────────────────────────

    #[test]
    fn test_alias_groups_resolve_to_same_field() {
        let groups: Vec<(Vec<&str>, CanonicalField)> = vec![
            (
                vec!["Youtuber", "CHANNEL", "ChannelName", "Channel Name", "channel-name"],
                CanonicalField::ChannelName,
            ),
            (
                vec!["Subs", "subscriber_count", "SUBSCRIBERS", "Subscriber", "Subscriber Count"],
                CanonicalField::Subscribers,
            ),
            (
                vec!["Video Views", "view", "Total-Views", "VIEWS"],
                CanonicalField::Views,
            ),
            (vec!["Region", "nation", " Country "], CanonicalField::Country),
        ];

        for (variants, expected) in &groups {
            for v in variants {
                assert_eq!(AliasResolver::resolve_header(v), Some(*expected), "{v}");
            }
        }
    }

    #[test]
    fn test_alias_unknown_passes_through() {
        assert_eq!(AliasResolver::resolve_header("Country/Region"), None);
        assert_eq!(AliasResolver::resolve_header("rank"), None);
        assert_eq!(AliasResolver::resolve_header("uploads"), None);
    }

    // ── NumericCoercer ────────────────────────────────────────────────────────

    #[test]
    fn test_coerce_documented_forms() {
        assert_eq!(NumericCoercer::parse_str("1,234"), Some(1234.0));
        assert_eq!(NumericCoercer::parse_str("2.3M"), Some(2_300_000.0));
        assert_eq!(NumericCoercer::parse_str("120K"), Some(120_000.0));
        assert_eq!(NumericCoercer::parse_str("1.5B"), Some(1_500_000_000.0));
        assert_eq!(NumericCoercer::parse_str(" 42 "), Some(42.0));
        assert_eq!(NumericCoercer::parse_str("12.75"), Some(12.75));
        assert_eq!(NumericCoercer::parse_str("3.2k"), Some(3200.0));
        assert_eq!(NumericCoercer::parse_str(".5"), Some(0.5));
    }

    #[test]
    fn test_coerce_rejects_other_forms() {
        for s in ["abc", "", "K", ".", "-5", "1e6", "$100", "1.2.3", "10KM", "nan", "inf"] {
            assert_eq!(NumericCoercer::parse_str(s), None, "{s:?}");
        }
    }

    #[test]
    fn test_coerce_numbers_pass_through() {
        assert_eq!(NumericCoercer::coerce(&CellValue::Number(17.0)), Some(17.0));
        assert_eq!(NumericCoercer::coerce(&CellValue::Number(-1.0)), None);
        assert_eq!(NumericCoercer::coerce(&CellValue::Number(f64::NAN)), None);
        assert_eq!(NumericCoercer::coerce(&CellValue::Missing), None);
    }

    // ── TableNormalizer ───────────────────────────────────────────────────────

    #[test]
    fn test_table_normalizer_maps_variants() {
        let mut raw = RawTable::with_headers(["Youtuber", "Subs", "Video Views", "Nation", "Rank"]);
        raw.push_row(text_row(&["MrBeast", "166M", "28,368,841,870", "United States", "2"]));
        raw.push_row(text_row(&["Cocomelon", "162M", "164B", "", "3"]));

        let table = TableNormalizer::normalize(&raw);

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.unmapped_columns, vec!["rank".to_string()]);
        assert_eq!(table.resolved_fields.len(), 4);

        let valid = table.valid_records();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].channel_name, "MrBeast");
        assert_eq!(valid[0].subscribers, 166_000_000.0);
        assert_eq!(valid[0].views, 28_368_841_870.0);
        assert_eq!(valid[0].country, "United States");
    }

    #[test]
    fn test_table_normalizer_duplicate_columns_coalesce() {
        let mut raw = RawTable::with_headers(["channel", "Subs", "subscribers", "views", "country"]);
        raw.push_row(text_row(&["A", "", "10K", "5", "US"]));
        raw.push_row(text_row(&["B", "2K", "9K", "5", "US"]));

        let valid = TableNormalizer::normalize(&raw).valid_records();
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].subscribers, 10_000.0);
        assert_eq!(valid[1].subscribers, 2_000.0);
    }

    #[test]
    fn test_table_normalizer_missing_column_invalidates_all() {
        let mut raw = RawTable::with_headers(["channel", "subscribers", "views"]);
        raw.push_row(text_row(&["A", "1", "2"]));
        let table = TableNormalizer::normalize(&raw);
        assert_eq!(table.row_count(), 1);
        assert!(table.valid_records().is_empty());
    }

    #[test]
    fn test_table_normalizer_idempotent() {
        let mut raw = RawTable::with_headers(["Channel Name", "Subscriber Count", "Total Views", "Region"]);
        raw.push_row(text_row(&["A", "1.2M", "300K", "US"]));
        raw.push_row(text_row(&["B", "bad", "1", "UK"]));
        raw.push_row(text_row(&["C", "900", "2,000", "UK"]));

        let once = TableNormalizer::normalize(&raw).valid_records();
        let twice = TableNormalizer::normalize(&records_to_table(&once)).valid_records();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_text_value_from_number_cell() {
        let mut raw = RawTable::with_headers(["channel_name", "subscribers", "views", "country"]);
        raw.push_row(vec![
            CellValue::Number(1234.0),
            CellValue::Number(1.0),
            CellValue::Number(2.0),
            CellValue::Text("US".to_string()),
        ]);
        let valid = TableNormalizer::normalize(&raw).valid_records();
        assert_eq!(valid[0].channel_name, "1234");
    }
}
