// CarScope - core/clean.rs
//
// Listing cleaning pipeline: an ordered sequence of row filters and
// corrections that turns a raw scrape into a table safe to group and chart.
// Core layer: pure function over `ListingTable`, no I/O.
//
// Every threshold comes from `CleaningRules`. Rows never produce errors:
// a malformed row is excluded (and counted in `CleaningReport`) or corrected.
// The only error is structural, when the input lacks a column the
// pipeline reads.

use crate::core::model::{Column, Listing, ListingTable};
use crate::util::constants;
use crate::util::error::CleanError;
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// Columns the pipeline reads. All of them must be present in the input.
pub const REQUIRED_COLUMNS: &[Column] = &[
    Column::Brand,
    Column::Model,
    Column::Price,
    Column::Mileage,
    Column::Date,
    Column::Year,
];

/// `num_days_from_ce()` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

// =============================================================================
// Rules
// =============================================================================

/// Thresholds and switches for every cleaning rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleaningRules {
    /// Brand and model groups smaller than this are dropped.
    pub min_group_size: usize,

    /// Listings posted on or before this date are dropped, as are listings
    /// with no date. `None` keeps every date.
    pub date_floor: Option<NaiveDate>,

    /// Prices at or below this value are dropped.
    pub min_price: i64,

    /// Placeholder prices that are dropped whatever their magnitude.
    pub price_denylist: BTreeSet<i64>,

    /// Mileage strictly below this is taken to be in thousands...
    pub mileage_rescale_below: i64,

    /// ...and is multiplied by this factor.
    pub mileage_rescale_factor: i64,

    /// Mileage above the cap is divided by 10 until it fits. Must be at
    /// least ten times `mileage_rescale_below` for the pipeline to be a
    /// fixed point.
    pub mileage_cap: Option<i64>,

    /// Drop listings with no model year.
    pub drop_missing_year: bool,

    /// Listings of this model year keep a low mileage as-is (a new car
    /// genuinely has a few hundred km on it).
    pub reference_year: i32,
}

impl CleaningRules {
    /// Default rules with an explicit reference year.
    pub fn for_year(reference_year: i32) -> Self {
        Self {
            min_group_size: constants::DEFAULT_MIN_GROUP_SIZE,
            date_floor: NaiveDate::parse_from_str(constants::DEFAULT_DATE_FLOOR, "%Y-%m-%d").ok(),
            min_price: constants::DEFAULT_MIN_PRICE,
            price_denylist: constants::DEFAULT_PRICE_DENYLIST.iter().copied().collect(),
            mileage_rescale_below: constants::DEFAULT_MILEAGE_RESCALE_BELOW,
            mileage_rescale_factor: constants::DEFAULT_MILEAGE_RESCALE_FACTOR,
            mileage_cap: None,
            drop_missing_year: true,
            reference_year,
        }
    }

    /// True when `price` passes the minimum and the denylist.
    pub fn accepts_price(&self, price: i64) -> bool {
        price > self.min_price && !self.price_denylist.contains(&price)
    }

    /// Corrected mileage for a listing of the given model year.
    pub fn corrected_mileage(&self, mileage: i64, year: Option<i32>) -> i64 {
        let mut corrected = mileage;
        if corrected < self.mileage_rescale_below && year != Some(self.reference_year) {
            corrected = corrected.saturating_mul(self.mileage_rescale_factor);
        }
        if let Some(cap) = self.mileage_cap.filter(|&c| c > 0) {
            while corrected > cap {
                corrected /= constants::MILEAGE_CAP_DIVISOR;
            }
        }
        corrected
    }

    /// True when correcting an already corrected mileage is a no-op: a
    /// rescaled value lands at or above the threshold, and the cap leaves
    /// room for ten times the threshold.
    pub fn mileage_rules_are_stable(&self) -> bool {
        let factor_ok = self.mileage_rescale_factor == 1
            || self.mileage_rescale_factor >= self.mileage_rescale_below;
        let cap_ok = self.mileage_cap.map_or(true, |cap| {
            cap >= self
                .mileage_rescale_below
                .saturating_mul(constants::MILEAGE_CAP_DIVISOR)
        });
        factor_ok && cap_ok
    }
}

impl Default for CleaningRules {
    /// Default rules with the current calendar year as reference.
    fn default() -> Self {
        Self::for_year(Local::now().year())
    }
}

// =============================================================================
// Report
// =============================================================================

/// Per-step accounting of a pipeline run. Excluded rows are never surfaced,
/// only counted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub missing_brand_or_model: usize,
    pub rare_model: usize,
    pub rare_brand: usize,
    pub unparseable_date: usize,
    pub before_date_floor: usize,
    pub price_rejected: usize,
    pub mileage_rejected: usize,
    pub missing_year: usize,
    /// Rows dropped because later steps shrank their group below the minimum.
    pub settled: usize,
    /// Rows whose mileage was corrected (not removed).
    pub mileage_rescaled: usize,
    pub output_rows: usize,
}

impl CleaningReport {
    pub fn total_removed(&self) -> usize {
        self.input_rows - self.output_rows
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOutcome {
    pub table: ListingTable,
    pub report: CleaningReport,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Run the cleaning pipeline over `table`.
///
/// Steps, in order (each feeds the next):
///  1. drop rows with a null or blank brand or model
///  2. drop model groups smaller than `min_group_size`
///  3. drop brand groups smaller than `min_group_size`
///  4. parse `date`; rows whose non-blank date does not parse are dropped
///  5. drop rows on or before `date_floor` (when set)
///  6. drop rows failing the price minimum or denylist
///  7. drop rows with missing or negative mileage (and missing year)
///  8. correct mileage recorded in thousands
///  9. uppercase the model
/// 10. derive `date_int`
/// 11. repeat steps 2-3 until nothing more is removed
///
/// The output is a fixed point: cleaning it again returns it unchanged.
pub fn clean(table: &ListingTable, rules: &CleaningRules) -> Result<CleanOutcome, CleanError> {
    for column in REQUIRED_COLUMNS {
        if !table.has_column(*column) {
            return Err(CleanError::MissingRequiredColumn {
                column: column.name(),
            });
        }
    }

    if !rules.mileage_rules_are_stable() {
        tracing::warn!(
            rescale_below = rules.mileage_rescale_below,
            rescale_factor = rules.mileage_rescale_factor,
            cap = ?rules.mileage_cap,
            "Mileage rules are not stable; cleaning twice will change mileages"
        );
    }

    let mut report = CleaningReport {
        input_rows: table.len(),
        ..Default::default()
    };

    let mut rows: Vec<Listing> = table
        .rows
        .iter()
        .filter(|r| is_present(r.brand.as_deref()) && is_present(r.model.as_deref()))
        .cloned()
        .collect();
    report.missing_brand_or_model = table.len() - rows.len();

    report.rare_model = retain_common(&mut rows, Column::Model, rules.min_group_size);
    report.rare_brand = retain_common(&mut rows, Column::Brand, rules.min_group_size);

    let before_dates = rows.len();
    rows = rows.into_iter().filter_map(with_parsed_date).collect();
    report.unparseable_date = before_dates - rows.len();

    if let Some(floor) = rules.date_floor {
        report.before_date_floor =
            retain_counting(&mut rows, |r| r.posted_on.is_some_and(|day| day > floor));
    }

    report.price_rejected = retain_counting(&mut rows, |r| {
        r.price.is_some_and(|price| rules.accepts_price(price))
    });

    report.mileage_rejected =
        retain_counting(&mut rows, |r| r.mileage.is_some_and(|mileage| mileage >= 0));

    if rules.drop_missing_year {
        report.missing_year = retain_counting(&mut rows, |r| r.year.is_some());
    }

    let mut rescaled = 0;
    let mut rows: Vec<Listing> = rows
        .into_iter()
        .map(|row| {
            let (row, changed) = normalise(row, rules);
            rescaled += usize::from(changed);
            row
        })
        .collect();
    report.mileage_rescaled = rescaled;

    loop {
        let removed = retain_common(&mut rows, Column::Model, rules.min_group_size)
            + retain_common(&mut rows, Column::Brand, rules.min_group_size);
        if removed == 0 {
            break;
        }
        report.settled += removed;
    }

    report.output_rows = rows.len();

    tracing::info!(
        input = report.input_rows,
        output = report.output_rows,
        rare_model = report.rare_model,
        rare_brand = report.rare_brand,
        unparseable_date = report.unparseable_date,
        price_rejected = report.price_rejected,
        mileage_rescaled = report.mileage_rescaled,
        "Cleaning complete"
    );

    let mut cleaned = table.with_rows(rows);
    if !cleaned.has_column(Column::DateInt) {
        cleaned.columns.push(Column::DateInt);
    }

    Ok(CleanOutcome {
        table: cleaned,
        report,
    })
}

/// Parse a stored post date.
///
/// Accepts plain dates, date-times with or without fractional seconds and
/// UTC offset (the form the scraper's ORM writes), and RFC 3339. The date is
/// taken as written; offsets are not converted.
pub fn parse_listing_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    for format in constants::DATE_FORMATS {
        if let Ok(day) = NaiveDate::parse_from_str(s, format) {
            return Some(day);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }

    for format in constants::DATETIME_FORMATS {
        if format.contains("%:z") {
            if let Ok(ts) = DateTime::parse_from_str(s, format) {
                return Some(ts.date_naive());
            }
        } else if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts.date());
        }
    }

    None
}

/// Whole days between 1970-01-01 and `day` (negative before the epoch).
pub fn days_since_epoch(day: NaiveDate) -> i64 {
    i64::from(day.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

/// Step 4 for one row: `None` drops it.
fn with_parsed_date(mut row: Listing) -> Option<Listing> {
    match row.date.as_deref() {
        Some(raw) if !raw.trim().is_empty() => match parse_listing_date(raw) {
            Some(day) => {
                row.posted_on = Some(day);
                Some(row)
            }
            None => {
                tracing::debug!(date = raw, "Dropping listing with unparseable date");
                None
            }
        },
        _ => {
            row.posted_on = None;
            Some(row)
        }
    }
}

/// Steps 8-10 for one row. The flag is true when the mileage changed.
fn normalise(mut row: Listing, rules: &CleaningRules) -> (Listing, bool) {
    let mut changed = false;
    if let Some(mileage) = row.mileage {
        let corrected = rules.corrected_mileage(mileage, row.year);
        changed = corrected != mileage;
        row.mileage = Some(corrected);
    }
    row.model = row.model.map(|m| m.to_uppercase());
    row.date_int = row.posted_on.map(days_since_epoch);
    (row, changed)
}

/// Keep rows matching `keep`, returning how many were removed.
fn retain_counting(rows: &mut Vec<Listing>, keep: impl FnMut(&Listing) -> bool) -> usize {
    let before = rows.len();
    rows.retain(keep);
    before - rows.len()
}

/// Drop rows whose `column` value occurs fewer than `min` times among `rows`.
fn retain_common(rows: &mut Vec<Listing>, column: Column, min: usize) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in rows.iter() {
        if let Some(value) = row.text(column) {
            *counts.entry(value.to_string()).or_default() += 1;
        }
    }
    retain_counting(rows, |row| {
        row.text(column)
            .and_then(|value| counts.get(value))
            .is_some_and(|&n| n >= min)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2025;

    fn rules() -> CleaningRules {
        CleaningRules::for_year(YEAR)
    }

    fn listing(brand: &str, model: &str, price: i64, mileage: i64, date: &str) -> Listing {
        Listing {
            brand: Some(brand.to_string()),
            model: Some(model.to_string()),
            price: Some(price),
            mileage: Some(mileage),
            year: Some(2018),
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn group(n: usize, brand: &str, model: &str) -> Vec<Listing> {
        (0..n)
            .map(|i| listing(brand, model, 1_500 + i as i64, 90_000, "2024-06-01"))
            .collect()
    }

    fn run(rows: Vec<Listing>) -> CleanOutcome {
        clean(&ListingTable::with_stored_columns(rows), &rules()).unwrap()
    }

    #[test]
    fn test_missing_required_column() {
        let mut table = ListingTable::with_stored_columns(group(25, "Renault", "Clio"));
        table.columns.retain(|c| *c != Column::Mileage);
        let err = clean(&table, &rules()).unwrap_err();
        assert_eq!(
            err,
            CleanError::MissingRequiredColumn { column: "mileage" }
        );
    }

    #[test]
    fn test_blank_brand_or_model_dropped() {
        let mut rows = group(20, "Renault", "Clio");
        rows.push(listing("   ", "Clio", 2_000, 1_000, "2024-06-01"));
        let mut no_model = listing("Renault", "Clio", 2_000, 1_000, "2024-06-01");
        no_model.model = None;
        rows.push(no_model);

        let out = run(rows);
        assert_eq!(out.table.len(), 20);
        assert_eq!(out.report.missing_brand_or_model, 2);
    }

    #[test]
    fn test_rare_groups_use_surviving_population() {
        // Brand A: 20 x M1. Brand B: 15 x M1 + 10 x Q.
        // Q is rare, so B is left with 15 rows and is dropped as a brand.
        let mut rows = group(20, "A", "M1");
        rows.extend(group(15, "B", "M1"));
        rows.extend(group(10, "B", "Q"));

        let out = run(rows);
        assert_eq!(out.report.rare_model, 10);
        assert_eq!(out.report.rare_brand, 15);
        assert_eq!(out.table.len(), 20);
        assert!(out.table.rows.iter().all(|r| r.brand.as_deref() == Some("A")));
    }

    #[test]
    fn test_group_of_nineteen_dropped() {
        let mut rows = group(20, "Renault", "Clio");
        rows.extend(group(19, "Renault", "Megane"));
        let out = run(rows);
        assert_eq!(out.table.len(), 20);
        assert_eq!(out.report.rare_model, 19);
    }

    #[test]
    fn test_denylisted_price_removed_from_group_of_21() {
        let mut rows = group(20, "Peugeot", "208");
        rows.push(listing("Peugeot", "208", 1_111, 50_000, "2024-06-01"));

        let out = run(rows);
        assert_eq!(out.table.len(), 20);
        assert_eq!(out.report.price_rejected, 1);
        assert!(out.table.rows.iter().all(|r| r.price != Some(1_111)));
    }

    #[test]
    fn test_group_shrunk_below_minimum_is_settled() {
        let mut rows = group(19, "Peugeot", "208");
        rows.push(listing("Peugeot", "208", 40, 50_000, "2024-06-01"));
        rows.extend(group(20, "Kia", "Picanto"));

        let out = run(rows);
        assert_eq!(out.report.price_rejected, 1);
        assert_eq!(out.report.settled, 19);
        assert!(out
            .table
            .rows
            .iter()
            .all(|r| r.model.as_deref() == Some("PICANTO")));
    }

    #[test]
    fn test_price_threshold_is_exclusive() {
        let mut rows = group(20, "Kia", "Rio");
        rows.push(listing("Kia", "Rio", 49, 50_000, "2024-06-01"));
        rows.push(listing("Kia", "Rio", 50, 50_000, "2024-06-01"));
        let mut missing = listing("Kia", "Rio", 0, 50_000, "2024-06-01");
        missing.price = None;
        rows.push(missing);

        let out = run(rows);
        assert_eq!(out.table.len(), 21);
        assert_eq!(out.report.price_rejected, 2);
    }

    #[test]
    fn test_date_floor_boundary() {
        let mut rows = group(20, "Kia", "Rio");
        rows.push(listing("Kia", "Rio", 2_000, 50_000, "2020-01-01"));
        rows.push(listing("Kia", "Rio", 2_001, 50_000, "2020-01-02"));

        let out = run(rows);
        assert_eq!(out.report.before_date_floor, 1);
        assert!(out.table.rows.iter().any(|r| r.price == Some(2_001)));
        assert!(out.table.rows.iter().all(|r| r.price != Some(2_000)));
    }

    #[test]
    fn test_without_floor_null_dates_survive() {
        let mut rows = group(20, "Kia", "Rio");
        let mut undated = listing("Kia", "Rio", 2_000, 50_000, "");
        undated.date = None;
        rows.push(undated);
        rows.push(listing("Kia", "Rio", 2_000, 50_000, "2019-05-01"));

        let rules = CleaningRules {
            date_floor: None,
            ..rules()
        };
        let out = clean(&ListingTable::with_stored_columns(rows), &rules).unwrap();
        assert_eq!(out.table.len(), 22);
        assert_eq!(out.table.rows.iter().filter(|r| r.date_int.is_none()).count(), 1);
    }

    #[test]
    fn test_unparseable_dates_excluded_and_counted() {
        let mut rows = group(20, "Kia", "Rio");
        rows.push(listing("Kia", "Rio", 2_000, 50_000, "il y a 3 jours"));
        rows.push(listing("Kia", "Rio", 2_000, 50_000, "2024-02-30"));

        let out = run(rows);
        assert_eq!(out.table.len(), 20);
        assert_eq!(out.report.unparseable_date, 2);
    }

    #[test]
    fn test_negative_mileage_dropped() {
        let mut rows = group(20, "Kia", "Rio");
        rows.push(listing("Kia", "Rio", 2_000, -5, "2024-06-01"));
        let out = run(rows);
        assert_eq!(out.report.mileage_rejected, 1);
        assert!(out.table.rows.iter().all(|r| r.mileage.unwrap() >= 0));
    }

    #[test]
    fn test_mileage_rescale_respects_reference_year() {
        let mut rows = group(20, "Kia", "Rio");
        let mut last_year = listing("Kia", "Rio", 7_001, 50, "2024-06-01");
        last_year.year = Some(YEAR - 1);
        let mut this_year = listing("Kia", "Rio", 7_002, 50, "2024-06-01");
        this_year.year = Some(YEAR);
        rows.push(last_year);
        rows.push(this_year);

        let out = run(rows);
        let mileage_for = |price| {
            out.table
                .rows
                .iter()
                .find(|r| r.price == Some(price))
                .and_then(|r| r.mileage)
        };
        assert_eq!(mileage_for(7_001), Some(50_000));
        assert_eq!(mileage_for(7_002), Some(50));
        assert_eq!(out.report.mileage_rescaled, 1);
    }

    #[test]
    fn test_mileage_cap_divides_until_within() {
        let rules = CleaningRules {
            mileage_cap: Some(600_000),
            ..rules()
        };
        assert_eq!(rules.corrected_mileage(1_500_000, Some(2015)), 150_000);
        assert_eq!(rules.corrected_mileage(90_000_000, Some(2015)), 90_000);
        assert_eq!(rules.corrected_mileage(599, Some(2015)), 599_000);
        assert_eq!(rules.corrected_mileage(600_000, Some(2015)), 600_000);
    }

    #[test]
    fn test_mileage_rules_stability() {
        assert!(rules().mileage_rules_are_stable());
        let with = |below, factor, cap| CleaningRules {
            mileage_rescale_below: below,
            mileage_rescale_factor: factor,
            mileage_cap: cap,
            ..rules()
        };
        assert!(with(600, 1, None).mileage_rules_are_stable());
        assert!(with(600, 600, Some(6_000)).mileage_rules_are_stable());
        assert!(!with(600, 2, None).mileage_rules_are_stable());
        assert!(!with(5_000, 1_000, None).mileage_rules_are_stable());
        assert!(!with(600, 1_000, Some(5_999)).mileage_rules_are_stable());
    }

    #[test]
    fn test_factor_below_threshold_rescales_twice() {
        let rules = CleaningRules {
            mileage_rescale_factor: 2,
            ..rules()
        };
        let once = rules.corrected_mileage(100, Some(2018));
        assert_eq!(once, 200);
        assert_ne!(rules.corrected_mileage(once, Some(2018)), once);

        let stable = CleaningRules {
            mileage_rescale_factor: 600,
            ..rules
        };
        let once = stable.corrected_mileage(100, Some(2018));
        assert_eq!(stable.corrected_mileage(once, Some(2018)), once);
    }

    #[test]
    fn test_model_uppercased_and_date_int_derived() {
        let mut rows = group(20, "Kia", "Rio");
        rows.push(listing("Kia", "Rio", 2_000, 50_000, "2021-01-01"));
        let out = run(rows);
        assert!(out.table.rows.iter().all(|r| r.model.as_deref() == Some("RIO")));
        let dated = out
            .table
            .rows
            .iter()
            .find(|r| r.date.as_deref() == Some("2021-01-01"))
            .unwrap();
        assert_eq!(dated.date_int, Some(18_628));
    }

    #[test]
    fn test_days_since_epoch() {
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(days_since_epoch(day(1970, 1, 1)), 0);
        assert_eq!(days_since_epoch(day(2021, 1, 1)), 18_628);
        assert_eq!(days_since_epoch(day(1969, 12, 31)), -1);
    }

    #[test]
    fn test_parse_listing_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 29);
        assert_eq!(parse_listing_date("2025-09-29"), expected);
        assert_eq!(parse_listing_date(" 2025/09/29 "), expected);
        assert_eq!(parse_listing_date("2025-09-29 00:00:00.000 +00:00"), expected);
        assert_eq!(parse_listing_date("2025-09-29 13:45:10"), expected);
        assert_eq!(parse_listing_date("2025-09-29T13:45:10Z"), expected);
        assert_eq!(parse_listing_date("2025-09-29T13:45:10.5"), expected);
        assert_eq!(parse_listing_date("29 sept"), None);
    }

    #[test]
    fn test_clean_is_a_fixed_point() {
        let mut rows = group(25, "Renault", "Clio");
        rows.extend(group(22, "Renault", "clio"));
        rows.extend(group(30, "Hyundai", "Accent"));
        rows.extend(group(5, "Fiat", "Tipo"));
        rows.push(listing("Hyundai", "Accent", 22_222, 10, "2024-06-01"));
        rows.push(listing("Hyundai", "Accent", 900, 10, "2024-06-01"));
        rows.push(listing("Hyundai", "Accent", 900, 0, "2023-01-01"));
        rows.push(listing("Hyundai", "Accent", 900, 300, "not a date"));
        let mut current = listing("Hyundai", "Accent", 900, 120, "2024-07-01");
        current.year = Some(YEAR);
        rows.push(current);
        let mut undated_year = listing("Renault", "Clio", 950, 100_000, "2024-07-02");
        undated_year.year = None;
        rows.push(undated_year);

        let once = run(rows);
        let twice = clean(&once.table, &rules()).unwrap();
        assert_eq!(twice.table, once.table);
        assert_eq!(twice.report.total_removed(), 0);
        assert_eq!(twice.report.mileage_rescaled, 0);
    }

    #[test]
    fn test_output_invariants_hold() {
        let mut rows = group(25, "Renault", "Clio");
        rows.extend(group(21, "Dacia", "Logan"));
        rows.push(listing("Dacia", "Logan", 1_111, 10, "2024-06-01"));
        rows.push(listing("Dacia", "Logan", 5_000, -1, "2024-06-01"));
        rows.push(listing("", "Logan", 5_000, 1, "2024-06-01"));

        let rules = rules();
        let out = clean(&ListingTable::with_stored_columns(rows), &rules).unwrap();

        let mut models: HashMap<&str, usize> = HashMap::new();
        let mut brands: HashMap<&str, usize> = HashMap::new();
        for row in &out.table.rows {
            let brand = row.brand.as_deref().unwrap();
            let model = row.model.as_deref().unwrap();
            assert!(!brand.trim().is_empty() && !model.trim().is_empty());
            assert_eq!(model, model.to_uppercase());
            assert!(rules.accepts_price(row.price.unwrap()));
            assert!(row.mileage.unwrap() >= 0);
            *models.entry(model).or_default() += 1;
            *brands.entry(brand).or_default() += 1;
        }
        assert!(models.values().all(|&n| n >= rules.min_group_size));
        assert!(brands.values().all(|&n| n >= rules.min_group_size));
    }
}
