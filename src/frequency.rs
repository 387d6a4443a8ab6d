//! Value-frequency aggregation over a filtered view.
//!
//! Feeds both visualizations: the word cloud consumes the full table, the
//! bar chart consumes the top-N truncation. Counting always happens on the
//! filtered (pre-sort, pre-cap) frame so the result reflects every match,
//! not just the displayed rows.

use polars::prelude::*;
use std::collections::HashMap;
use std::fmt;

use crate::occurrence;
use crate::query::InvalidColumnError;

/// Number of entries the bar chart consumes. The word cloud is uncapped.
pub const BAR_CHART_TOP_N: usize = 10;

/// Columns exposed for visualization. A deliberate subset of the sortable
/// columns: identifier and accession are near-unique, remarks are free text,
/// and both would produce degenerate high-cardinality tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizColumn {
    Genus,
    SpecificEpithet,
    YearCollected,
}

impl VizColumn {
    pub const ALL: [Self; 3] = [Self::Genus, Self::SpecificEpithet, Self::YearCollected];

    pub fn column_name(self) -> &'static str {
        match self {
            Self::Genus => occurrence::GENUS,
            Self::SpecificEpithet => occurrence::SPECIFIC_EPITHET,
            Self::YearCollected => occurrence::YEAR_COLLECTED,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Genus => "Genus",
            Self::SpecificEpithet => "Epithet",
            Self::YearCollected => "Year",
        }
    }

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
}

impl Default for VizColumn {
    fn default() -> Self {
        Self::Genus
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: u32,
}

/// Distinct value → occurrence count, in first-seen order of the aggregated
/// view. That order is the tie-break for [`FrequencyTable::top_n`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    pub fn entries(&self) -> &[FrequencyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, value: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.count)
    }

    pub fn max_count(&self) -> u32 {
        self.entries.iter().map(|e| e.count).max().unwrap_or(0)
    }

    /// Top `n` entries by count descending. The sort is stable, so equal
    /// counts keep their first-seen order.
    pub fn top_n(&self, n: usize) -> FrequencyTable {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries.truncate(n);
        FrequencyTable { entries }
    }
}

impl fmt::Display for FrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            writeln!(f, "{}: {}", e.value, e.count)?;
        }
        Ok(())
    }
}

/// Count distinct values of `column` over the given (filtered) frame.
///
/// Groups by exact value equality; nulls are skipped. Entry order is the
/// first appearance of each value in the frame. Year values are rendered
/// through their display form so both visualizations see plain strings.
pub fn aggregate(df: &DataFrame, column: VizColumn) -> color_eyre::Result<FrequencyTable> {
    let series = df.column(column.column_name())?.as_materialized_series();

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<FrequencyEntry> = Vec::new();

    for i in 0..series.len() {
        let value = series.get(i)?;
        if matches!(value, AnyValue::Null) {
            continue;
        }
        let key = value.str_value().to_string();
        match index.get(&key) {
            Some(&at) => entries[at].count += 1,
            None => {
                index.insert(key.clone(), entries.len());
                entries.push(FrequencyEntry {
                    value: key,
                    count: 1,
                });
            }
        }
    }

    Ok(FrequencyTable { entries })
}
