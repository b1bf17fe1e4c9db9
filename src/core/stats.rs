// CarScope - core/stats.rs
//
// Summary statistics over a listing table: describe tables, per-group
// counts and average prices, box-plot five-number summaries, histograms.
// These are the numbers the charts and summary tables are drawn from.
// Core layer: pure functions, no I/O.

use crate::core::model::{Column, Listing, ListingTable};
use crate::util::constants;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Numeric columns covered by `describe_numeric`.
pub const NUMERIC_COLUMNS: &[Column] = &[
    Column::Price,
    Column::Mileage,
    Column::Year,
    Column::DateInt,
];

/// Categorical columns covered by `describe_categorical`. `link` and `paper`
/// are left out: every link is unique and paper is near-constant.
pub const CATEGORICAL_COLUMNS: &[Column] = &[
    Column::Title,
    Column::Engine,
    Column::Fuel,
    Column::Color,
    Column::Gearbox,
    Column::Brand,
    Column::Model,
    Column::Finition,
    Column::Location,
    Column::Wilaya,
];

// =============================================================================
// Quantiles
// =============================================================================

/// Quantile `q` (0.0-1.0) of already-sorted values, interpolating linearly
/// between the two nearest ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// `[Q1 - k*IQR, Q3 + k*IQR]` over `values` (any order).
pub fn tukey_fences(values: &[f64], k: f64) -> Option<(f64, f64)> {
    let sorted = sorted_copy(values);
    let q1 = quantile(&sorted, 0.25)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - k * iqr, q3 + k * iqr))
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

// =============================================================================
// Describe
// =============================================================================

/// count / mean / std / min / quartiles / max of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: Column,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); `None` below two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    pub fn of(column: Column, values: &[f64]) -> Self {
        let sorted = sorted_copy(values);
        let count = sorted.len();
        let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|m| {
            let ss: f64 = sorted.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });
        Self {
            column,
            count,
            mean,
            std,
            min: sorted.first().copied(),
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// count / unique / most frequent value / its frequency of one text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalSummary {
    pub column: Column,
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: usize,
}

/// Non-null values of a numeric column as floats.
pub fn numeric_values(table: &ListingTable, column: Column) -> Vec<f64> {
    table
        .rows
        .iter()
        .filter_map(|r| r.number(column))
        .map(|v| v as f64)
        .collect()
}

/// Describe every numeric column the table carries.
pub fn describe_numeric(table: &ListingTable) -> Vec<NumericSummary> {
    NUMERIC_COLUMNS
        .iter()
        .filter(|c| table.has_column(**c))
        .map(|&c| NumericSummary::of(c, &numeric_values(table, c)))
        .collect()
}

/// Describe every categorical column the table carries.
pub fn describe_categorical(table: &ListingTable) -> Vec<CategoricalSummary> {
    CATEGORICAL_COLUMNS
        .iter()
        .filter(|c| table.has_column(**c))
        .map(|&column| {
            let counts = value_counts(table, column);
            CategoricalSummary {
                column,
                count: counts.iter().map(|(_, n)| n).sum(),
                unique: counts.len(),
                top: counts.first().map(|(v, _)| v.clone()),
                freq: counts.first().map_or(0, |(_, n)| *n),
            }
        })
        .collect()
}

// =============================================================================
// Grouping
// =============================================================================

/// Occurrences of each value of `column`, most frequent first (ties by value).
pub fn value_counts(table: &ListingTable, column: Column) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in &table.rows {
        if let Some(key) = group_key(row, column) {
            *counts.entry(key.1).or_default() += 1;
        }
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

/// The `n` most frequent values of `column`.
pub fn top_values(table: &ListingTable, column: Column, n: usize) -> Vec<String> {
    value_counts(table, column)
        .into_iter()
        .take(n)
        .map(|(v, _)| v)
        .collect()
}

/// Sorted distinct values of `column` (numbers sort numerically).
pub fn distinct_values(table: &ListingTable, column: Column) -> Vec<String> {
    let keys: BTreeSet<(i64, String)> =
        table.rows.iter().filter_map(|r| group_key(r, column)).collect();
    keys.into_iter().map(|(_, v)| v).collect()
}

/// Count and average price of one brand or model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub count: usize,
    pub average_price: Option<f64>,
}

/// Per-group row count merged with average price, most frequent first.
pub fn group_summary(table: &ListingTable, column: Column) -> Vec<GroupSummary> {
    // Totals are i128 so large scraped prices cannot overflow the sum.
    let mut prices: HashMap<String, (usize, i128, usize)> = HashMap::new();
    for row in &table.rows {
        if let Some((_, key)) = group_key(row, column) {
            let entry = prices.entry(key).or_default();
            entry.0 += 1;
            if let Some(price) = row.price {
                entry.1 += i128::from(price);
                entry.2 += 1;
            }
        }
    }
    let mut groups: Vec<GroupSummary> = prices
        .into_iter()
        .map(|(key, (count, total, priced))| GroupSummary {
            key,
            count,
            average_price: (priced > 0).then(|| total as f64 / priced as f64),
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    groups
}

/// Sort key plus display text of a row's value in `column`. Numeric columns
/// sort by value, text columns by text.
fn group_key(row: &Listing, column: Column) -> Option<(i64, String)> {
    if column.is_numeric() {
        row.number(column).map(|n| (n, n.to_string()))
    } else {
        row.text(column).map(|s| (0, s.to_string()))
    }
}

// =============================================================================
// Box plots
// =============================================================================

/// Five-number summary of `metric` within one group, with 1.5 IQR whiskers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub key: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Smallest value inside the lower fence.
    pub lower_whisker: f64,
    /// Largest value inside the upper fence.
    pub upper_whisker: f64,
    /// Values beyond either fence.
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn of(key: String, values: &[f64]) -> Option<Self> {
        let sorted = sorted_copy(values);
        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let (low, high) = tukey_fences(&sorted, constants::IQR_FENCE_FACTOR)?;
        let inside: Vec<f64> = sorted
            .iter()
            .copied()
            .filter(|v| (low..=high).contains(v))
            .collect();
        Some(Self {
            key,
            count: sorted.len(),
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_whisker: inside.first().copied().unwrap_or(q1),
            upper_whisker: inside.last().copied().unwrap_or(q3),
            outliers: sorted
                .iter()
                .copied()
                .filter(|v| !(low..=high).contains(v))
                .collect(),
        })
    }
}

/// One box per distinct value of `group` (ordered by that value), over the
/// numeric `metric`.
pub fn box_stats(table: &ListingTable, group: Column, metric: Column) -> Vec<BoxStats> {
    let mut groups: BTreeMap<(i64, String), Vec<f64>> = BTreeMap::new();
    for row in &table.rows {
        if let (Some(key), Some(value)) = (group_key(row, group), row.number(metric)) {
            groups.entry(key).or_default().push(value as f64);
        }
    }
    groups
        .into_iter()
        .filter_map(|((_, key), values)| BoxStats::of(key, &values))
        .collect()
}

// =============================================================================
// Histograms
// =============================================================================

/// One histogram bar: `[start, end)`, except the last bar which includes `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram of `values` spanning their min and max.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let sorted = sorted_copy(values);
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if min == max {
        return vec![Bin {
            start: min,
            end: max,
            count: sorted.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in sorted {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}
