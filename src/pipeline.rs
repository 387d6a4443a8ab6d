//! Session-scoped, memoized pipeline: filter → {sort → cap, aggregate}.
//!
//! Each stage is a pure function of its declared inputs and is cached
//! against the input signature it was computed from. Changing the sort spec
//! never re-runs the filter or the aggregation; changing the filter makes
//! every downstream signature stale, and stale stages recompute on the next
//! read. The true match count always comes from the filtered stage.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;

use crate::frequency::{self, FrequencyTable, VizColumn, BAR_CHART_TOP_N};
use crate::query::{self, FilterSpec, SortSpec, YearRange};

/// Per-stage recomputation counts. Shown in the debug line and asserted on
/// in tests to keep the memoization honest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounters {
    pub filter_passes: u32,
    pub sort_passes: u32,
    pub aggregate_passes: u32,
}

/// Owner of the loaded dataset and the memoized pipeline stages for one
/// user session. Created on first need, dropped with the session; never
/// shared across sessions.
pub struct SessionView {
    dataset: DataFrame,
    full_domain: YearRange,

    filter: FilterSpec,
    sort: SortSpec,
    viz_column: VizColumn,

    filtered: Option<(FilterSpec, DataFrame)>,
    display: Option<(FilterSpec, SortSpec, DataFrame)>,
    frequencies: Option<(FilterSpec, VizColumn, FrequencyTable)>,

    pub counters: StageCounters,
}

impl SessionView {
    pub fn new(dataset: DataFrame, full_domain: YearRange) -> Self {
        Self {
            dataset,
            full_domain,
            filter: FilterSpec {
                years: full_domain,
                ..FilterSpec::default()
            },
            sort: SortSpec::default(),
            viz_column: VizColumn::default(),
            filtered: None,
            display: None,
            frequencies: None,
            counters: StageCounters::default(),
        }
    }

    pub fn dataset(&self) -> &DataFrame {
        &self.dataset
    }

    pub fn full_domain(&self) -> YearRange {
        self.full_domain
    }

    pub fn filter_spec(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort_spec(&self) -> SortSpec {
        self.sort
    }

    pub fn viz_column(&self) -> VizColumn {
        self.viz_column
    }

    pub fn set_filter(&mut self, spec: FilterSpec) {
        self.filter = spec;
    }

    pub fn set_sort(&mut self, spec: SortSpec) {
        self.sort = spec;
    }

    pub fn set_viz_column(&mut self, column: VizColumn) {
        self.viz_column = column;
    }

    /// Reset filter and sort to the unconstrained defaults.
    pub fn reset(&mut self) {
        self.filter = FilterSpec {
            years: self.full_domain,
            ..FilterSpec::default()
        };
        self.sort = SortSpec::default();
    }

    fn ensure_filtered(&mut self) -> Result<()> {
        let stale = match &self.filtered {
            Some((spec, _)) => spec != &self.filter,
            None => true,
        };
        if stale {
            let df = query::apply_filter(
                self.dataset.clone().lazy(),
                &self.filter,
                &self.full_domain,
            )
            .collect()?;
            self.counters.filter_passes += 1;
            self.filtered = Some((self.filter.clone(), df));
        }
        Ok(())
    }

    /// The filtered view (pre-sort, pre-cap).
    pub fn filtered(&mut self) -> Result<&DataFrame> {
        self.ensure_filtered()?;
        match &self.filtered {
            Some((_, df)) => Ok(df),
            None => Err(eyre!("filtered view unavailable")),
        }
    }

    /// True number of matching records, independent of the display cap.
    pub fn matched_count(&mut self) -> Result<usize> {
        Ok(self.filtered()?.height())
    }

    /// The sorted, display-capped view handed to the table renderer.
    pub fn display_rows(&mut self) -> Result<&DataFrame> {
        self.ensure_filtered()?;
        let stale = match &self.display {
            Some((f, s, _)) => f != &self.filter || *s != self.sort,
            None => true,
        };
        if stale {
            let filtered = match &self.filtered {
                Some((_, df)) => df.clone(),
                None => return Err(eyre!("filtered view unavailable")),
            };
            let sorted = query::apply_sort(filtered.lazy(), &self.sort).collect()?;
            self.counters.sort_passes += 1;
            let capped = query::limit_for_display(&sorted);
            self.display = Some((self.filter.clone(), self.sort, capped));
        }
        match &self.display {
            Some((_, _, df)) => Ok(df),
            None => Err(eyre!("display view unavailable")),
        }
    }

    /// Frequency table over the filtered view for the active viz column.
    /// Computed before sorting and capping so every match is counted.
    pub fn frequencies(&mut self) -> Result<&FrequencyTable> {
        self.ensure_filtered()?;
        let stale = match &self.frequencies {
            Some((f, c, _)) => f != &self.filter || *c != self.viz_column,
            None => true,
        };
        if stale {
            let table = match &self.filtered {
                Some((_, df)) => frequency::aggregate(df, self.viz_column)?,
                None => return Err(eyre!("filtered view unavailable")),
            };
            self.counters.aggregate_passes += 1;
            self.frequencies = Some((self.filter.clone(), self.viz_column, table));
        }
        match &self.frequencies {
            Some((_, _, table)) => Ok(table),
            None => Err(eyre!("frequency table unavailable")),
        }
    }

    /// The bar-chart input: top entries of the current frequency table.
    pub fn bar_chart_table(&mut self) -> Result<FrequencyTable> {
        Ok(self.frequencies()?.top_n(BAR_CHART_TOP_N))
    }
}
