// CarScope - core/filter.rs
//
// Composable filter engine for cleaned listings.
// All active filters are AND-combined and only ever remove rows, so any
// invariant the cleaner established still holds on the filtered view.
// Core layer: pure logic, no I/O.

use crate::core::model::{Column, Listing, ListingTable};
use crate::core::stats;
use crate::util::constants;
use chrono::{Months, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Complete filter state. All fields are AND-combined when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    /// Start of post-date range (inclusive). None = no lower bound.
    pub date_from: Option<NaiveDate>,

    /// End of post-date range (inclusive). None = no upper bound.
    pub date_to: Option<NaiveDate>,

    /// Price range (inclusive).
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,

    /// Mileage range (inclusive).
    pub mileage_min: Option<i64>,
    pub mileage_max: Option<i64>,

    /// Brands to include (empty = all).
    pub brands: BTreeSet<String>,

    /// Models to include (empty = all).
    pub models: BTreeSet<String>,

    /// Model years to include (empty = all).
    pub years: BTreeSet<i32>,

    /// Fuels to include (empty = all).
    pub fuels: BTreeSet<String>,

    /// Gearboxes to include (empty = all).
    pub gearboxes: BTreeSet<String>,

    /// Engines to include (empty = all).
    pub engines: BTreeSet<String>,
}

impl FilterState {
    /// Returns true if no filters are active.
    pub fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
            && self.mileage_min.is_none()
            && self.mileage_max.is_none()
            && self.brands.is_empty()
            && self.models.is_empty()
            && self.years.is_empty()
            && self.fuels.is_empty()
            && self.gearboxes.is_empty()
            && self.engines.is_empty()
    }

    /// Date window covering the last `months` months of the table, ending on
    /// its latest post date. Clamped to the earliest post date.
    ///
    /// An empty or undated table yields no date restriction.
    pub fn last_months(table: &ListingTable, months: u32) -> Self {
        let Some(latest) = table.latest_date() else {
            return Self::default();
        };
        let start = latest
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        let start = table.earliest_date().map_or(start, |e| start.max(e));
        Self {
            date_from: Some(start),
            date_to: Some(latest),
            ..Default::default()
        }
    }
}

/// Apply filters to a table, returning indices of matching rows.
///
/// Returns indices into `table.rows`; use `ListingTable::select` to
/// materialise the subset.
pub fn apply_filters(table: &ListingTable, filter: &FilterState) -> Vec<usize> {
    if filter.is_empty() {
        return (0..table.len()).collect();
    }

    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| matches_all(row, filter))
        .map(|(idx, _)| idx)
        .collect()
}

/// Check if a single row matches all active filters.
fn matches_all(row: &Listing, filter: &FilterState) -> bool {
    // Date range. Undated rows are excluded from any date restriction.
    if filter.date_from.is_some() || filter.date_to.is_some() {
        match row.posted_on {
            Some(day) => {
                if filter.date_from.is_some_and(|from| day < from)
                    || filter.date_to.is_some_and(|to| day > to)
                {
                    return false;
                }
            }
            None => return false,
        }
    }

    if !in_range(row.price, filter.price_min, filter.price_max) {
        return false;
    }
    if !in_range(row.mileage, filter.mileage_min, filter.mileage_max) {
        return false;
    }

    if !filter.years.is_empty() && !row.year.is_some_and(|y| filter.years.contains(&y)) {
        return false;
    }

    let selections = [
        (Column::Brand, &filter.brands),
        (Column::Model, &filter.models),
        (Column::Fuel, &filter.fuels),
        (Column::Gearbox, &filter.gearboxes),
        (Column::Engine, &filter.engines),
    ];
    selections.iter().all(|(column, selected)| {
        selected.is_empty() || row.text(*column).is_some_and(|v| selected.contains(v))
    })
}

fn in_range(value: Option<i64>, min: Option<i64>, max: Option<i64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    match value {
        Some(v) => min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m),
        None => false,
    }
}

/// Keep the rows at `indices` whose price and mileage both lie inside the
/// Tukey fences `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` computed over those rows.
///
/// Rows missing either value are dropped. Used for the price-vs-mileage
/// scatter view.
pub fn iqr_inliers(table: &ListingTable, indices: &[usize]) -> Vec<usize> {
    let column_values = |column: Column| -> Vec<f64> {
        indices
            .iter()
            .filter_map(|&i| table.rows.get(i))
            .filter_map(|r| r.number(column))
            .map(|v| v as f64)
            .collect()
    };

    let (Some(price_fence), Some(mileage_fence)) = (
        stats::tukey_fences(&column_values(Column::Price), constants::IQR_FENCE_FACTOR),
        stats::tukey_fences(&column_values(Column::Mileage), constants::IQR_FENCE_FACTOR),
    ) else {
        return Vec::new();
    };

    let inside = |value: Option<i64>, (low, high): (f64, f64)| {
        value.is_some_and(|v| (low..=high).contains(&(v as f64)))
    };

    indices
        .iter()
        .copied()
        .filter(|&i| {
            table.rows.get(i).is_some_and(|row| {
                inside(row.price, price_fence) && inside(row.mileage, mileage_fence)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_row(brand: &str, model: &str, price: i64, mileage: i64, posted: NaiveDate) -> Listing {
        Listing {
            brand: Some(brand.to_string()),
            model: Some(model.to_string()),
            price: Some(price),
            mileage: Some(mileage),
            year: Some(2019),
            fuel: Some("Essence".to_string()),
            gearbox: Some("Manuelle".to_string()),
            engine: Some("1.2".to_string()),
            posted_on: Some(posted),
            ..Default::default()
        }
    }

    fn sample() -> ListingTable {
        ListingTable::with_stored_columns(vec![
            make_row("Renault", "CLIO", 150, 90_000, day(2025, 1, 10)),
            make_row("Renault", "MEGANE", 210, 120_000, day(2025, 2, 10)),
            make_row("Kia", "PICANTO", 120, 40_000, day(2025, 3, 10)),
            make_row("Kia", "RIO", 180, 60_000, day(2025, 3, 20)),
        ])
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_returns_all() {
        let table = sample();
        let result = apply_filters(&table, &FilterState::default());
        assert_eq!(result, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_date_range_inclusive() {
        let table = sample();
        let filter = FilterState {
            date_from: Some(day(2025, 2, 10)),
            date_to: Some(day(2025, 3, 10)),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &filter), vec![1, 2]);
    }

    #[test]
    fn test_undated_rows_excluded_by_date_filter() {
        let mut table = sample();
        table.rows[0].posted_on = None;
        let filter = FilterState {
            date_to: Some(day(2030, 1, 1)),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &filter), vec![1, 2, 3]);
    }

    #[test]
    fn test_price_and_mileage_ranges() {
        let table = sample();
        let filter = FilterState {
            price_min: Some(150),
            price_max: Some(200),
            mileage_max: Some(90_000),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &filter), vec![0, 3]);
    }

    #[test]
    fn test_multi_select_combined() {
        let table = sample();
        let filter = FilterState {
            brands: set(&["Kia", "Renault"]),
            models: set(&["RIO", "CLIO"]),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &filter), vec![0, 3]);

        let filter = FilterState {
            fuels: set(&["Diesel"]),
            ..Default::default()
        };
        assert!(apply_filters(&table, &filter).is_empty());
    }

    #[test]
    fn test_years_filter() {
        let mut table = sample();
        table.rows[2].year = Some(2021);
        let filter = FilterState {
            years: [2021].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(apply_filters(&table, &filter), vec![2]);
    }

    #[test]
    fn test_last_months_window() {
        let table = sample();
        let filter = FilterState::last_months(&table, 1);
        assert_eq!(filter.date_from, Some(day(2025, 2, 20)));
        assert_eq!(filter.date_to, Some(day(2025, 3, 20)));
        assert_eq!(apply_filters(&table, &filter), vec![2, 3]);

        // Window longer than the data is clamped to the first post date.
        let wide = FilterState::last_months(&table, 24);
        assert_eq!(wide.date_from, Some(day(2025, 1, 10)));

        assert!(FilterState::last_months(&ListingTable::default(), 3).is_empty());
    }

    #[test]
    fn test_filtering_is_monotonic() {
        let table = sample();
        let loose = FilterState {
            price_min: Some(130),
            ..Default::default()
        };
        let strict = FilterState {
            brands: set(&["Renault"]),
            ..loose.clone()
        };
        let loose_rows = apply_filters(&table, &loose);
        for idx in apply_filters(&table, &strict) {
            assert!(loose_rows.contains(&idx));
        }
    }

    #[test]
    fn test_iqr_inliers_drop_outliers() {
        let mut rows: Vec<Listing> = (0..10)
            .map(|i| make_row("Kia", "RIO", 100 + i, 50_000 + i * 1_000, day(2025, 1, 1)))
            .collect();
        rows.push(make_row("Kia", "RIO", 5_000, 55_000, day(2025, 1, 1)));
        rows.push(make_row("Kia", "RIO", 105, 2_000_000, day(2025, 1, 1)));
        let table = ListingTable::with_stored_columns(rows);
        let all: Vec<usize> = (0..table.len()).collect();

        let kept = iqr_inliers(&table, &all);
        assert_eq!(kept, (0..10).collect::<Vec<_>>());
        assert!(iqr_inliers(&table, &[]).is_empty());
    }
}
