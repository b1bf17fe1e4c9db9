// CarScope - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::clean::CleaningRules;
use crate::util::constants;
use crate::util::error::ConfigError;
use chrono::NaiveDate;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for CarScope configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/carscope/ or %APPDATA%\CarScope\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Location of config.toml inside the config directory.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still works
/// with an older binary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub store: StoreSection,
    pub cleaning: CleaningSection,
    pub export: ExportSection,
    pub logging: LoggingSection,
}

/// `[store]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Path to the SQLite listings file.
    pub path: Option<String>,
}

/// `[cleaning]` config section. Every key is optional.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CleaningSection {
    pub min_group_size: Option<usize>,
    /// `YYYY-MM-DD`, or `"none"` / empty to keep every date.
    pub date_floor: Option<String>,
    pub min_price: Option<i64>,
    pub price_denylist: Option<Vec<i64>>,
    pub mileage_rescale_below: Option<i64>,
    pub mileage_rescale_factor: Option<i64>,
    pub mileage_cap: Option<i64>,
    pub drop_missing_year: Option<bool>,
}

/// `[export]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ExportSection {
    /// Warn before exporting this many rows.
    pub large_export_warning_threshold: Option<usize>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite listings file.
    pub store_path: PathBuf,

    /// Rules handed to the cleaning pipeline.
    pub cleaning: CleaningRules,

    /// Exports larger than this are logged at warn level.
    pub large_export_threshold: usize,

    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(constants::DEFAULT_STORE_FILE),
            cleaning: CleaningRules::default(),
            large_export_threshold: constants::DEFAULT_LARGE_EXPORT_THRESHOLD,
            log_level: None,
        }
    }
}

/// Read and parse a config file without validating values.
pub fn read_raw_config(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load and validate the config file at `path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with a warning
/// so the tool still starts but the user is informed.
pub fn load_config(path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let raw = match read_raw_config(path) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %path.display(), "Loaded config.toml");
    let config = validate(raw, &mut warnings);

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

/// Validate each field, accumulating every problem rather than stopping at
/// the first one.
pub fn validate(raw: RawConfig, warnings: &mut Vec<String>) -> AppConfig {
    let mut config = AppConfig::default();
    let mut out_of_range = |field: &str, value: String, expected: String| {
        warnings.push(format!(
            "{}. Using default.",
            ConfigError::ValueOutOfRange {
                field: field.to_string(),
                value,
                expected,
            }
        ));
    };

    // -- Store --
    if let Some(path) = raw.store.path.filter(|p| !p.trim().is_empty()) {
        config.store_path = PathBuf::from(path);
    }

    // -- Cleaning: min_group_size --
    let rules = &mut config.cleaning;
    if let Some(size) = raw.cleaning.min_group_size {
        if (constants::MIN_MIN_GROUP_SIZE..=constants::MAX_MIN_GROUP_SIZE).contains(&size) {
            rules.min_group_size = size;
        } else {
            out_of_range(
                "cleaning.min_group_size",
                size.to_string(),
                format!(
                    "{}-{}",
                    constants::MIN_MIN_GROUP_SIZE,
                    constants::MAX_MIN_GROUP_SIZE
                ),
            );
        }
    }

    // -- Cleaning: date_floor --
    if let Some(ref floor) = raw.cleaning.date_floor {
        let trimmed = floor.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            rules.date_floor = None;
        } else {
            match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                Ok(day) => rules.date_floor = Some(day),
                Err(_) => out_of_range(
                    "cleaning.date_floor",
                    floor.clone(),
                    "a YYYY-MM-DD date or \"none\"".to_string(),
                ),
            }
        }
    }

    // -- Cleaning: prices --
    if let Some(price) = raw.cleaning.min_price {
        if price >= 0 {
            rules.min_price = price;
        } else {
            out_of_range(
                "cleaning.min_price",
                price.to_string(),
                "0 or more".to_string(),
            );
        }
    }
    if let Some(list) = raw.cleaning.price_denylist {
        rules.price_denylist = list.into_iter().collect();
    }

    // -- Cleaning: mileage --
    if let Some(below) = raw.cleaning.mileage_rescale_below {
        if below >= 0 {
            rules.mileage_rescale_below = below;
        } else {
            out_of_range(
                "cleaning.mileage_rescale_below",
                below.to_string(),
                "0 or more".to_string(),
            );
        }
    }
    if let Some(factor) = raw.cleaning.mileage_rescale_factor {
        if factor >= 1 {
            rules.mileage_rescale_factor = factor;
        } else {
            out_of_range(
                "cleaning.mileage_rescale_factor",
                factor.to_string(),
                "1 or more".to_string(),
            );
        }
    }
    // A factor between 1 and the threshold leaves a rescaled value under the
    // threshold, so a second pass would rescale it again.
    if !rules.mileage_rules_are_stable() {
        out_of_range(
            "cleaning.mileage_rescale_factor",
            rules.mileage_rescale_factor.to_string(),
            format!(
                "1, or at least mileage_rescale_below ({})",
                rules.mileage_rescale_below
            ),
        );
        rules.mileage_rescale_below = constants::DEFAULT_MILEAGE_RESCALE_BELOW;
        rules.mileage_rescale_factor = constants::DEFAULT_MILEAGE_RESCALE_FACTOR;
    }
    if let Some(cap) = raw.cleaning.mileage_cap {
        // A cap below ten times the rescale threshold would let a rescaled
        // value be divided back under the threshold on a second pass.
        let floor = rules
            .mileage_rescale_below
            .saturating_mul(constants::MILEAGE_CAP_DIVISOR);
        let candidate = CleaningRules {
            mileage_cap: Some(cap),
            ..rules.clone()
        };
        if cap > 0 && candidate.mileage_rules_are_stable() {
            rules.mileage_cap = Some(cap);
        } else {
            out_of_range(
                "cleaning.mileage_cap",
                cap.to_string(),
                format!("at least {floor} (10x mileage_rescale_below)"),
            );
        }
    }
    if let Some(drop) = raw.cleaning.drop_missing_year {
        rules.drop_missing_year = drop;
    }

    // -- Export --
    if let Some(threshold) = raw.export.large_export_warning_threshold {
        if (1..=constants::MAX_EXPORT_ROWS).contains(&threshold) {
            config.large_export_threshold = threshold;
        } else {
            out_of_range(
                "export.large_export_warning_threshold",
                threshold.to_string(),
                format!("1-{}", constants::MAX_EXPORT_ROWS),
            );
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    config
}
