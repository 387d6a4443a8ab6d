//! Filter, sort, and display-cap stages over the occurrence dataset.
//!
//! All three stages are pure functions over a LazyFrame: the caller owns the
//! dataset and decides when to collect. The match count reported to the user
//! is always derived from the filtered frame, never from the capped one.

use polars::prelude::*;
use std::fmt;

use crate::occurrence;

/// Maximum number of rows handed to the table renderer. The true match count
/// is reported separately and may exceed this.
pub const DISPLAY_ROW_CAP: usize = 1000;

/// Inclusive collection-year range. `min <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    min: i32,
    max: i32,
}

impl YearRange {
    /// Default full domain of the dataset's collection years.
    pub const FULL_DOMAIN: YearRange = YearRange {
        min: 1850,
        max: 2023,
    };

    pub fn new(min: i32, max: i32) -> color_eyre::Result<Self> {
        if min > max {
            return Err(color_eyre::eyre::eyre!(
                "invalid year range: {} > {}",
                min,
                max
            ));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::FULL_DOMAIN
    }
}

/// The active filter constraints. Empty strings impose no constraint; the
/// year range imposes none while it equals the session's full domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// Case-insensitive substring match against `occurrenceID`.
    pub identifier: String,
    /// Case-insensitive substring match against `genus`.
    pub genus: String,
    /// Inclusive collection-year range.
    pub years: YearRange,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            genus: String::new(),
            years: YearRange::FULL_DOMAIN,
        }
    }
}

impl FilterSpec {
    /// True when no constraint is active relative to the given full domain.
    pub fn is_unconstrained(&self, full_domain: &YearRange) -> bool {
        self.identifier.trim().is_empty()
            && self.genus.trim().is_empty()
            && self.years == *full_domain
    }
}

/// Case-insensitive literal (non-regex, unanchored) containment predicate.
fn contains_ci(column: &str, query: &str) -> Expr {
    col(column)
        .str()
        .to_lowercase()
        .str()
        .contains_literal(lit(query.trim().to_lowercase()))
}

/// Apply the filter spec to the dataset. Constraints compose by AND; rows
/// with a null value in a queried column are excluded by that predicate.
///
/// The year predicate is skipped while the requested range equals
/// `full_domain`, so null-year records survive the default state.
pub fn apply_filter(lf: LazyFrame, spec: &FilterSpec, full_domain: &YearRange) -> LazyFrame {
    let mut combined: Option<Expr> = None;
    let mut and_push = |e: Expr| {
        combined = Some(match combined.take() {
            Some(current) => current.and(e),
            None => e,
        });
    };

    if !spec.identifier.trim().is_empty() {
        and_push(contains_ci(occurrence::OCCURRENCE_ID, &spec.identifier));
    }
    if !spec.genus.trim().is_empty() {
        and_push(contains_ci(occurrence::GENUS, &spec.genus));
    }
    if spec.years != *full_domain {
        let year = col(occurrence::YEAR_COLLECTED);
        and_push(
            year.clone()
                .gt_eq(lit(spec.years.min))
                .and(year.lt_eq(lit(spec.years.max))),
        );
    }

    match combined {
        Some(expr) => lf.filter(expr),
        None => lf,
    }
}

/// Error for a sort/visualization selector that names no known column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColumnError {
    pub name: String,
}

impl fmt::Display for InvalidColumnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a sortable column (expected one of: {})",
            self.name,
            SortColumn::ALL
                .iter()
                .map(|c| c.column_name())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for InvalidColumnError {}

/// The closed set of sortable columns. `occurrenceRemarks` is free text and
/// excluded by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    OccurrenceId,
    CatalogNumber,
    Genus,
    SpecificEpithet,
    YearCollected,
}

impl SortColumn {
    pub const ALL: [Self; 5] = [
        Self::OccurrenceId,
        Self::CatalogNumber,
        Self::Genus,
        Self::SpecificEpithet,
        Self::YearCollected,
    ];

    /// Dataset column this selector resolves to.
    pub fn column_name(self) -> &'static str {
        match self {
            Self::OccurrenceId => occurrence::OCCURRENCE_ID,
            Self::CatalogNumber => occurrence::CATALOG_NUMBER,
            Self::Genus => occurrence::GENUS,
            Self::SpecificEpithet => occurrence::SPECIFIC_EPITHET,
            Self::YearCollected => occurrence::YEAR_COLLECTED,
        }
    }

    /// Short label for the sidebar.
    pub fn label(self) -> &'static str {
        match self {
            Self::OccurrenceId => "Identifier",
            Self::CatalogNumber => "Accession",
            Self::Genus => "Genus",
            Self::SpecificEpithet => "Epithet",
            Self::YearCollected => "Year",
        }
    }

    /// Resolve a column name to a selector. Unknown names fail; there is no
    /// silent fallback to a default column.
    pub fn parse(name: &str) -> Result<Self, InvalidColumnError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.column_name() == name)
            .ok_or_else(|| InvalidColumnError {
                name: name.to_string(),
            })
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
        }
    }
}

/// One sortable column plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: SortColumn::OccurrenceId,
            direction: SortDirection::Ascending,
        }
    }
}

/// Stable sort by one column. String columns compare on their stored casing;
/// the year column compares numerically. Null years go to the end in both
/// directions so flipping direction reverses only the non-null order.
pub fn apply_sort(lf: LazyFrame, spec: &SortSpec) -> LazyFrame {
    let options = SortMultipleOptions {
        descending: vec![spec.direction == SortDirection::Descending],
        nulls_last: vec![true],
        maintain_order: true,
        ..Default::default()
    };
    lf.sort_by_exprs(vec![col(spec.column.column_name())], options)
}

/// Prefix-take of at most [`DISPLAY_ROW_CAP`] rows. Purely a view truncation;
/// never confused with the true-count path.
pub fn limit_for_display(df: &DataFrame) -> DataFrame {
    df.head(Some(DISPLAY_ROW_CAP))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence;

    fn sample() -> LazyFrame {
        df!(
            occurrence::OCCURRENCE_ID => &["MYCO-001", "MYCO-002", "barn-003", "MYCO-004"],
            occurrence::CATALOG_NUMBER => &["A1", "A2", "B1", "B2"],
            occurrence::GENUS => &["Boletus", "Ascomycetes", "Boletus", "Amanita"],
            occurrence::SPECIFIC_EPITHET => &["edulis", "sp.", "badius", "muscaria"],
            occurrence::YEAR_COLLECTED => &[Some(1901), Some(1955), None, Some(2001)],
            occurrence::OCCURRENCE_REMARKS => &["", "on bark", "", "near trail"],
        )
        .unwrap()
        .lazy()
    }

    fn ids(df: &DataFrame) -> Vec<String> {
        df.column(occurrence::OCCURRENCE_ID)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .iter()
            .map(|v| v.unwrap().to_string())
            .collect()
    }

    #[test]
    fn empty_spec_filters_nothing() {
        let spec = FilterSpec::default();
        let out = apply_filter(sample(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn identifier_substring_is_case_insensitive() {
        let spec = FilterSpec {
            identifier: "myco".into(),
            ..Default::default()
        };
        let out = apply_filter(sample(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        assert_eq!(out.height(), 3);
        assert!(!ids(&out).contains(&"barn-003".to_string()));
    }

    #[test]
    fn genus_substring_is_case_insensitive() {
        let spec = FilterSpec {
            genus: "asco".into(),
            ..Default::default()
        };
        let out = apply_filter(sample(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(ids(&out), vec!["MYCO-002"]);
    }

    #[test]
    fn narrowed_year_range_excludes_null_years() {
        let spec = FilterSpec {
            years: YearRange::new(1900, 2023).unwrap(),
            ..Default::default()
        };
        let out = apply_filter(sample(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        // barn-003 has no year and must be excluded
        assert_eq!(out.height(), 3);
        let years = out
            .column(occurrence::YEAR_COLLECTED)
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap();
        for y in years.iter().flatten() {
            assert!((1900..=2023).contains(&y));
        }
    }

    #[test]
    fn default_full_domain_keeps_null_years() {
        let spec = FilterSpec {
            years: YearRange::FULL_DOMAIN,
            ..Default::default()
        };
        let out = apply_filter(sample(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn constraints_compose_by_and() {
        let spec = FilterSpec {
            genus: "boletus".into(),
            years: YearRange::new(1900, 1950).unwrap(),
            ..Default::default()
        };
        let out = apply_filter(sample(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        assert_eq!(ids(&out), vec!["MYCO-001"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let spec = FilterSpec {
            genus: "bol".into(),
            ..Default::default()
        };
        let once = apply_filter(sample(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        let twice = apply_filter(once.clone().lazy(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn zero_matches_is_valid() {
        let spec = FilterSpec {
            genus: "no-such-genus".into(),
            ..Default::default()
        };
        let out = apply_filter(sample(), &spec, &YearRange::FULL_DOMAIN)
            .collect()
            .unwrap();
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn sort_ascending_then_descending_reverses() {
        // epithets are all distinct, so descending is the exact reverse
        let asc = apply_sort(
            sample(),
            &SortSpec {
                column: SortColumn::SpecificEpithet,
                direction: SortDirection::Ascending,
            },
        )
        .collect()
        .unwrap();
        let desc = apply_sort(
            sample(),
            &SortSpec {
                column: SortColumn::SpecificEpithet,
                direction: SortDirection::Descending,
            },
        )
        .collect()
        .unwrap();
        let mut asc_ids = ids(&asc);
        asc_ids.reverse();
        assert_eq!(asc_ids, ids(&desc));
    }

    #[test]
    fn sort_is_stable_and_idempotent() {
        let spec = SortSpec {
            column: SortColumn::Genus,
            direction: SortDirection::Ascending,
        };
        let once = apply_sort(sample(), &spec).collect().unwrap();
        let twice = apply_sort(once.clone().lazy(), &spec).collect().unwrap();
        assert_eq!(ids(&once), ids(&twice));
        // ties keep first-appearance order: MYCO-001 before barn-003
        let order = ids(&once);
        let a = order.iter().position(|s| s == "MYCO-001").unwrap();
        let b = order.iter().position(|s| s == "barn-003").unwrap();
        assert!(a < b);
    }

    #[test]
    fn null_years_sort_last_in_both_directions() {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let out = apply_sort(
                sample(),
                &SortSpec {
                    column: SortColumn::YearCollected,
                    direction,
                },
            )
            .collect()
            .unwrap();
            assert_eq!(ids(&out).last().unwrap(), "barn-003");
        }
    }

    #[test]
    fn invalid_sort_column_is_rejected() {
        let err = SortColumn::parse(occurrence::OCCURRENCE_REMARKS).unwrap_err();
        assert!(err.to_string().contains("occurrenceRemarks"));
        assert!(SortColumn::parse("genus").is_ok());
    }

    #[test]
    fn year_range_rejects_inverted_bounds() {
        assert!(YearRange::new(2000, 1900).is_err());
        assert!(YearRange::new(1900, 1900).is_ok());
    }

    #[test]
    fn display_limit_is_a_prefix_take() {
        let n = 1500u32;
        let df = df!(
            occurrence::OCCURRENCE_ID =>
                (0..n).map(|i| format!("OCC-{i:05}")).collect::<Vec<_>>(),
        )
        .unwrap();
        let capped = limit_for_display(&df);
        assert_eq!(capped.height(), DISPLAY_ROW_CAP);
        assert_eq!(
            ids(&capped)[0..3],
            ["OCC-00000", "OCC-00001", "OCC-00002"]
        );
        // the original frame is untouched
        assert_eq!(df.height(), 1500);
    }
}
