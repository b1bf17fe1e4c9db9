// CarScope - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Cleaning thresholds defined here are only defaults: the pipeline always
// receives them through `CleaningRules`, never reads them directly.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "CarScope";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "CarScope";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Listings store
// =============================================================================

/// Default SQLite file, resolved against the working directory.
pub const DEFAULT_STORE_FILE: &str = "cars_db.sqlite";

/// Relation holding one row per listing.
pub const LISTINGS_TABLE: &str = "cars";

// =============================================================================
// Cleaning defaults
// =============================================================================

/// Minimum number of surviving rows a brand or model group needs to be kept.
pub const DEFAULT_MIN_GROUP_SIZE: usize = 20;

/// Smallest accepted `min_group_size` (1 disables rare-category suppression).
pub const MIN_MIN_GROUP_SIZE: usize = 1;

/// Largest accepted `min_group_size`.
pub const MAX_MIN_GROUP_SIZE: usize = 10_000;

/// Listings posted on or before this date are dropped (`YYYY-MM-DD`).
pub const DEFAULT_DATE_FLOOR: &str = "2020-01-01";

/// Prices at or below this value are treated as placeholders.
pub const DEFAULT_MIN_PRICE: i64 = 49;

/// Prices sellers type when they do not want to publish a real one.
pub const DEFAULT_PRICE_DENYLIST: &[i64] = &[
    123, 1_111, 2_222, 11_111, 22_222, 111_111, 123_456, 999_999, 1_234_567, 9_999_999,
];

/// Mileage below this value is assumed to be recorded in thousands.
pub const DEFAULT_MILEAGE_RESCALE_BELOW: i64 = 600;

/// Multiplier applied to mileage recorded in thousands.
pub const DEFAULT_MILEAGE_RESCALE_FACTOR: i64 = 1_000;

/// Divisor applied while mileage exceeds the configured cap.
pub const MILEAGE_CAP_DIVISOR: i64 = 10;

/// Date formats accepted for the `date` column, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Date-time formats accepted for the `date` column (the date part is kept).
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

// =============================================================================
// Analysis defaults
// =============================================================================

/// Default number of months shown by the date-range filter.
pub const DEFAULT_RECENT_MONTHS: u32 = 1;

/// Default number of months shown on the per-model drill-down.
pub const DEFAULT_MODEL_RECENT_MONTHS: u32 = 3;

/// Number of most frequent groups pre-selected for box plots.
pub const DEFAULT_TOP_GROUPS: usize = 5;

/// Number of groups shown in the price-band bar charts.
pub const DEFAULT_TOP_BARS: usize = 10;

/// Interquartile-range multiplier for scatter-plot outlier removal.
pub const IQR_FENCE_FACTOR: f64 = 1.5;

/// Default histogram bin count.
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Export
// =============================================================================

/// Worksheet name used for spreadsheet exports.
pub const EXPORT_SHEET_NAME: &str = "Car Data";

/// Default download name for the spreadsheet export.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "cleaned_car_data.xlsx";

/// Hard limit imposed by the xlsx format (1,048,576 rows minus the header).
pub const MAX_EXPORT_ROWS: usize = 1_048_575;

/// Longest string an xlsx cell can hold, in characters.
pub const XLSX_MAX_CELL_CHARS: usize = 32_767;

/// Number of rows above which an export warning is logged.
pub const DEFAULT_LARGE_EXPORT_THRESHOLD: usize = 100_000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
