// CarScope - app/state.rs
//
// Analysis session state. Holds the cleaned table, the active filter and
// the rows it selects, plus the report from the last cleaning run.

use crate::app::cache::ListingCache;
use crate::app::loader::Store;
use crate::core::clean::{self, CleaningReport, CleaningRules};
use crate::core::filter::{self, FilterState};
use crate::core::model::{Listing, ListingTable};
use crate::util::error::Result;

/// Top-level session state.
#[derive(Debug)]
pub struct AppState {
    /// Rules applied on every (re)load.
    pub rules: CleaningRules,

    /// Rows read from the store before cleaning.
    pub raw_rows: usize,

    /// Output of the cleaning pipeline.
    pub cleaned: ListingTable,

    /// Report from the most recent cleaning run.
    pub report: Option<CleaningReport>,

    /// Current filter configuration.
    pub filter_state: FilterState,

    /// Indices of cleaned rows matching the current filter.
    pub filtered_indices: Vec<usize>,

    /// Status line for the CLI summary.
    pub status_message: String,

    /// Non-fatal warnings accumulated at startup.
    pub warnings: Vec<String>,
}

impl AppState {
    pub fn new(rules: CleaningRules) -> Self {
        Self {
            rules,
            raw_rows: 0,
            cleaned: ListingTable::with_stored_columns(Vec::new()),
            report: None,
            filter_state: FilterState::default(),
            filtered_indices: Vec::new(),
            status_message: "Ready.".to_string(),
            warnings: Vec::new(),
        }
    }

    /// Load the store through the cache, clean it and select every row.
    ///
    /// On error the previous cleaned table is left untouched.
    pub fn load(&mut self, cache: &mut ListingCache, store: &dyn Store) -> Result<()> {
        let raw = cache.get_or_load(store)?;
        let outcome = clean::clean(&raw, &self.rules)?;

        self.raw_rows = raw.len();
        self.status_message = format!(
            "{} of {} listings kept after cleaning.",
            outcome.table.len(),
            raw.len()
        );
        self.cleaned = outcome.table;
        self.report = Some(outcome.report);
        self.filter_state = FilterState::default();
        self.apply_filters();
        Ok(())
    }

    /// Replace the filter and recompute the selection.
    pub fn set_filter(&mut self, filter_state: FilterState) {
        self.filter_state = filter_state;
        self.apply_filters();
    }

    /// Recompute filtered indices from the cleaned table and filter state.
    pub fn apply_filters(&mut self) {
        self.filtered_indices = filter::apply_filters(&self.cleaned, &self.filter_state);
    }

    /// Selected rows as a table with the cleaned column set.
    pub fn filtered(&self) -> ListingTable {
        self.cleaned.select(&self.filtered_indices)
    }

    pub fn filtered_rows(&self) -> impl Iterator<Item = &Listing> + '_ {
        self.filtered_indices
            .iter()
            .filter_map(|&i| self.cleaned.rows.get(i))
    }

    /// Clear loaded data and reset to the initial state.
    pub fn clear(&mut self) {
        self.raw_rows = 0;
        self.cleaned = ListingTable::with_stored_columns(Vec::new());
        self.report = None;
        self.filter_state = FilterState::default();
        self.filtered_indices.clear();
        self.warnings.clear();
        self.status_message = "Ready.".to_string();
    }
}
