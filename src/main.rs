// CarScope - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation
// 3. Store load and cleaning
// 4. The selected analysis or export command

mod report;

use carscope::app::cache::ListingCache;
use carscope::app::loader::SqliteStore;
use carscope::app::state::AppState;
use carscope::core::export;
use carscope::core::filter::{self, FilterState};
use carscope::core::model::{Column, ListingTable};
use carscope::core::stats::{self, Bin, BoxStats};
use carscope::platform::config::{self, AppConfig, PlatformPaths};
use carscope::util::constants;
use carscope::util::error::{CarScopeError, Result};
use carscope::util::logging;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// CarScope - used-car listings analyser.
///
/// Loads scraped listings from a SQLite file, cleans them, and prints
/// market summaries or exports the cleaned data.
#[derive(Parser, Debug)]
#[command(name = "carscope", version, about)]
struct Cli {
    /// SQLite listings file (overrides the config file).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Market overview: describe tables and brand/model counts.
    Overview {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Drill down into one brand and model.
    Models {
        /// Brand, as listed.
        brand: String,

        /// Model (matched case-insensitively).
        model: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Maximum listings to print.
        #[arg(long, default_value_t = 50)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Price-band analysis: most listed brands and models in a price range.
    Prices {
        #[command(flatten)]
        filters: FilterArgs,

        /// Number of brands and models to rank.
        #[arg(long, default_value_t = constants::DEFAULT_TOP_BARS)]
        top: usize,

        #[arg(long)]
        json: bool,
    },

    /// Export the cleaned (and optionally filtered) listings.
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,

        /// Output file (defaults to cleaned_car_data.xlsx / .csv).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    /// Months of recent data shown when no dates are given. Price bands and
    /// exports cover every date.
    fn default_window(&self) -> Option<u32> {
        match self {
            Command::Overview { .. } => Some(constants::DEFAULT_RECENT_MONTHS),
            Command::Models { .. } => Some(constants::DEFAULT_MODEL_RECENT_MONTHS),
            Command::Prices { .. } | Command::Export { .. } => None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Xlsx,
    Csv,
}

/// Row filters shared by every command.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// First post date to include (YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last post date to include (YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Ignore the default recent-months window.
    #[arg(long)]
    all_dates: bool,

    #[arg(long)]
    price_min: Option<i64>,

    #[arg(long)]
    price_max: Option<i64>,

    #[arg(long)]
    mileage_min: Option<i64>,

    #[arg(long)]
    mileage_max: Option<i64>,

    /// Brand to include (repeatable).
    #[arg(long = "brand")]
    brands: Vec<String>,

    /// Model to include (repeatable).
    #[arg(long = "model")]
    models: Vec<String>,

    /// Model year to include (repeatable).
    #[arg(long = "year")]
    years: Vec<i32>,

    #[arg(long = "fuel")]
    fuels: Vec<String>,

    #[arg(long = "gearbox")]
    gearboxes: Vec<String>,

    #[arg(long = "engine")]
    engines: Vec<String>,
}

impl FilterArgs {
    /// Build a filter. Without explicit dates, `default_months` (when set)
    /// restricts to the most recent months of data.
    fn to_filter(&self, table: &ListingTable, default_months: Option<u32>) -> FilterState {
        let explicit_dates = self.from.is_some() || self.to.is_some();
        let mut state = match default_months {
            Some(months) if !explicit_dates && !self.all_dates => {
                FilterState::last_months(table, months)
            }
            _ => FilterState::default(),
        };
        if explicit_dates {
            state.date_from = self.from;
            state.date_to = self.to;
        }
        state.price_min = self.price_min;
        state.price_max = self.price_max;
        state.mileage_min = self.mileage_min;
        state.mileage_max = self.mileage_max;
        state.brands = self.brands.iter().cloned().collect();
        // The cleaner stores models upper-cased.
        state.models = self.models.iter().map(|m| m.to_uppercase()).collect();
        state.years = self.years.iter().copied().collect();
        state.fuels = self.fuels.iter().cloned().collect();
        state.gearboxes = self.gearboxes.iter().cloned().collect();
        state.engines = self.engines.iter().cloned().collect();
        state
    }
}

fn main() {
    let cli = Cli::parse();

    // Config is read before logging so its level can take part in the
    // filter; warnings are logged once the subscriber exists.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (app_config, config_warnings) = config::load_config(&config_path);

    logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "CarScope starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    if let Err(e) = run(cli, app_config, config_warnings) {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, app_config: AppConfig, warnings: Vec<String>) -> Result<()> {
    let store_path = cli.db.unwrap_or_else(|| app_config.store_path.clone());
    let store = SqliteStore::new(&store_path);

    let mut state = AppState::new(app_config.cleaning.clone());
    state.warnings = warnings;
    let mut cache = ListingCache::new();
    state.load(&mut cache, &store)?;
    tracing::info!(
        store = %store.path().display(),
        status = %state.status_message,
        "Listings ready"
    );

    let window = cli.command.default_window();
    match cli.command {
        Command::Overview { filters, json } => {
            let filter = filters.to_filter(&state.cleaned, window);
            state.set_filter(filter);
            overview(&state, json)
        }
        Command::Models {
            brand,
            model,
            mut filters,
            limit,
            json,
        } => {
            filters.brands = vec![brand];
            filters.models = vec![model];
            let filter = filters.to_filter(&state.cleaned, window);
            state.set_filter(filter);
            models(&state, limit, json)
        }
        Command::Prices {
            filters,
            top,
            json,
        } => {
            let filter = filters.to_filter(&state.cleaned, window);
            state.set_filter(filter);
            prices(&state, top, json)
        }
        Command::Export {
            filters,
            format,
            output,
        } => {
            state.set_filter(filters.to_filter(&state.cleaned, window));
            let output = output.unwrap_or_else(|| default_export_path(format));
            export_to(&state, format, &output, app_config.large_export_threshold)
        }
    }
}

/// Chart data behind the overview: price and year boxes per brand and per
/// model, plus the overall price distribution.
#[derive(Debug, Serialize)]
struct OverviewCharts {
    price: Option<BoxStats>,
    price_histogram: Vec<Bin>,
    price_by_brand: Vec<BoxStats>,
    year_by_brand: Vec<BoxStats>,
    price_by_model: Vec<BoxStats>,
    year_by_model: Vec<BoxStats>,
}

impl OverviewCharts {
    /// Boxes cover the filter's brands and models, or the most listed ones
    /// when the filter names none.
    fn build(subset: &ListingTable, filter: &FilterState) -> Self {
        let brands = selected_or_top(subset, Column::Brand, &filter.brands);
        let models = selected_or_top(subset, Column::Model, &filter.models);
        let prices = stats::numeric_values(subset, Column::Price);
        Self {
            price: BoxStats::of("all listings".to_string(), &prices),
            price_histogram: stats::histogram(&prices, constants::DEFAULT_HISTOGRAM_BINS),
            price_by_brand: boxes_for(subset, Column::Brand, Column::Price, &brands),
            year_by_brand: boxes_for(subset, Column::Brand, Column::Year, &brands),
            price_by_model: boxes_for(subset, Column::Model, Column::Price, &models),
            year_by_model: boxes_for(subset, Column::Model, Column::Year, &models),
        }
    }
}

/// Chart data behind the model drill-down.
#[derive(Debug, Serialize)]
struct ModelCharts {
    price: Option<BoxStats>,
    price_by_year: Vec<BoxStats>,
    price_histogram: Vec<Bin>,
}

impl ModelCharts {
    fn build(subset: &ListingTable) -> Self {
        let prices = stats::numeric_values(subset, Column::Price);
        Self {
            price: BoxStats::of("all listings".to_string(), &prices),
            price_by_year: stats::box_stats(subset, Column::Year, Column::Price),
            price_histogram: stats::histogram(&prices, constants::DEFAULT_HISTOGRAM_BINS),
        }
    }
}

fn selected_or_top(subset: &ListingTable, column: Column, selected: &BTreeSet<String>) -> Vec<String> {
    if selected.is_empty() {
        stats::top_values(subset, column, constants::DEFAULT_TOP_GROUPS)
    } else {
        selected.iter().cloned().collect()
    }
}

fn boxes_for(subset: &ListingTable, group: Column, metric: Column, keys: &[String]) -> Vec<BoxStats> {
    stats::box_stats(subset, group, metric)
        .into_iter()
        .filter(|b| keys.contains(&b.key))
        .collect()
}

fn overview(state: &AppState, json: bool) -> Result<()> {
    let subset = state.filtered();
    let charts = OverviewCharts::build(&subset, &state.filter_state);

    if json {
        return print_json(&serde_json::json!({
            "report": state.report,
            "filter": state.filter_state,
            "rows": subset.len(),
            "numeric": stats::describe_numeric(&subset),
            "categorical": stats::describe_categorical(&subset),
            "brands": stats::group_summary(&subset, Column::Brand),
            "models": stats::group_summary(&subset, Column::Model),
            "charts": charts,
        }));
    }

    report::print_cleaning(state);
    println!("{} listings match the current filter.", subset.len());
    println!("{}", report::numeric_table(&stats::describe_numeric(&subset)));
    println!("{}", report::categorical_table(&stats::describe_categorical(&subset)));
    println!("{}", report::group_table("brand", &stats::group_summary(&subset, Column::Brand)));
    println!("{}", report::group_table("model", &stats::group_summary(&subset, Column::Model)));
    println!("{}", report::box_table("listings", "price", charts.price.as_slice()));
    println!("{}", report::histogram_table(&charts.price_histogram));
    println!("{}", report::box_table("brand", "price", &charts.price_by_brand));
    println!("{}", report::box_table("brand", "year", &charts.year_by_brand));
    println!("{}", report::box_table("model", "price", &charts.price_by_model));
    println!("{}", report::box_table("model", "year", &charts.year_by_model));
    Ok(())
}

fn models(state: &AppState, limit: usize, json: bool) -> Result<()> {
    let subset = state.filtered();
    let scatter = filter::iqr_inliers(&state.cleaned, &state.filtered_indices);
    let charts = ModelCharts::build(&subset);

    // Options the drill-down offers for this brand and model.
    let options: Vec<(Column, Vec<String>)> = [Column::Year, Column::Fuel, Column::Gearbox, Column::Engine]
        .into_iter()
        .map(|c| (c, stats::distinct_values(&subset, c)))
        .collect();

    if json {
        let options_json: serde_json::Map<String, serde_json::Value> = options
            .iter()
            .map(|(c, values)| (c.name().to_string(), serde_json::json!(values)))
            .collect();
        return print_json(&serde_json::json!({
            "filter": state.filter_state,
            "rows": subset.len(),
            "options": options_json,
            "numeric": stats::describe_numeric(&subset),
            "charts": charts,
            "scatter_points": scatter.len(),
            "listings": subset.rows.iter().take(limit).collect::<Vec<_>>(),
        }));
    }

    println!("{} listings match.", subset.len());
    for (column, values) in &options {
        println!("{column}: {}", values.join(", "));
    }
    println!("{}", report::numeric_table(&stats::describe_numeric(&subset)));
    println!("{}", report::box_table("listings", "price", charts.price.as_slice()));
    println!("{}", report::box_table("year", "price", &charts.price_by_year));
    println!("{}", report::histogram_table(&charts.price_histogram));
    println!(
        "{} of {} listings plotted after IQR outlier removal.",
        scatter.len(),
        subset.len()
    );
    println!("{}", report::listing_table(&subset, limit));
    Ok(())
}

fn prices(state: &AppState, top: usize, json: bool) -> Result<()> {
    let subset = state.filtered();
    let mut brands = stats::group_summary(&subset, Column::Brand);
    brands.truncate(top);
    let mut models = stats::group_summary(&subset, Column::Model);
    models.truncate(top);

    let top_models = stats::top_values(&subset, Column::Model, constants::DEFAULT_TOP_GROUPS);
    let model_boxes = boxes_for(&subset, Column::Model, Column::Price, &top_models);
    let bins = stats::histogram(
        &stats::numeric_values(&subset, Column::Price),
        constants::DEFAULT_HISTOGRAM_BINS,
    );

    if json {
        return print_json(&serde_json::json!({
            "filter": state.filter_state,
            "rows": subset.len(),
            "top_brands": brands,
            "top_models": models,
            "price_by_model": model_boxes,
            "price_histogram": bins,
        }));
    }

    println!("{} listings in the price band.", subset.len());
    println!("{}", report::group_table("brand", &brands));
    println!("{}", report::group_table("model", &models));
    println!("{}", report::box_table("model", "price", &model_boxes));
    println!("{}", report::histogram_table(&bins));
    Ok(())
}

fn export_to(
    state: &AppState,
    format: ExportFormat,
    output: &Path,
    large_threshold: usize,
) -> Result<()> {
    let subset = state.filtered();
    if subset.len() > large_threshold {
        tracing::warn!(
            rows = subset.len(),
            threshold = large_threshold,
            "Large export"
        );
    }

    let written = match format {
        ExportFormat::Xlsx => export::write_xlsx_file(&subset, output)?,
        ExportFormat::Csv => {
            let file = std::fs::File::create(output).map_err(|e| CarScopeError::Io {
                path: output.to_path_buf(),
                operation: "create export file",
                source: e,
            })?;
            export::export_csv(&subset, std::io::BufWriter::new(file))?
        }
    };

    tracing::info!(rows = written, path = %output.display(), "Export written");
    println!("Wrote {written} listings to {}", output.display());
    Ok(())
}

fn default_export_path(format: ExportFormat) -> PathBuf {
    let path = PathBuf::from(constants::DEFAULT_EXPORT_FILE_NAME);
    match format {
        ExportFormat::Xlsx => path,
        ExportFormat::Csv => path.with_extension("csv"),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CarScopeError::Io {
        path: PathBuf::from("<stdout>"),
        operation: "serialise JSON",
        source: e.into(),
    })?;
    println!("{text}");
    Ok(())
}
