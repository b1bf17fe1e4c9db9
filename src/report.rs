// CarScope - report.rs
//
// Terminal rendering of summaries with comfy-table. Binary-side only; the
// library returns plain data and the --json path serialises it directly.

use carscope::app::state::AppState;
use carscope::core::model::{Column, ListingTable};
use carscope::core::stats::{Bin, BoxStats, CategoricalSummary, GroupSummary, NumericSummary};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Columns shown in the listing table, in order.
const LISTING_COLUMNS: &[Column] = &[
    Column::Title,
    Column::Year,
    Column::Mileage,
    Column::Fuel,
    Column::Gearbox,
    Column::Engine,
    Column::Price,
    Column::Wilaya,
    Column::Date,
];

fn standard_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| header_cell(h)));
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold).fg(Color::Cyan)
}

fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn float(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

/// Cleaning summary and startup warnings, to stderr so stdout holds tables.
pub fn print_cleaning(state: &AppState) {
    for warning in &state.warnings {
        eprintln!("warning: {warning}");
    }
    let Some(report) = &state.report else {
        return;
    };
    eprintln!("{}", state.status_message);
    let removed = [
        ("missing brand or model", report.missing_brand_or_model),
        ("rare model", report.rare_model),
        ("rare brand", report.rare_brand),
        ("unparseable date", report.unparseable_date),
        ("before date floor", report.before_date_floor),
        ("rejected price", report.price_rejected),
        ("rejected mileage", report.mileage_rejected),
        ("missing year", report.missing_year),
        ("rare after filtering", report.settled),
    ];
    for (reason, count) in removed.iter().filter(|(_, n)| *n > 0) {
        eprintln!("  {count:>8}  {reason}");
    }
    if report.mileage_rescaled > 0 {
        eprintln!("  {:>8}  mileage values corrected", report.mileage_rescaled);
    }
}

pub fn numeric_table(summaries: &[NumericSummary]) -> Table {
    let mut table = standard_table(&[
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max",
    ]);
    for s in summaries {
        table.add_row(vec![
            Cell::new(s.column.name()),
            number_cell(s.count.to_string()),
            number_cell(float(s.mean)),
            number_cell(float(s.std)),
            number_cell(float(s.min)),
            number_cell(float(s.q1)),
            number_cell(float(s.median)),
            number_cell(float(s.q3)),
            number_cell(float(s.max)),
        ]);
    }
    table
}

pub fn categorical_table(summaries: &[CategoricalSummary]) -> Table {
    let mut table = standard_table(&["column", "count", "unique", "top", "freq"]);
    for s in summaries {
        table.add_row(vec![
            Cell::new(s.column.name()),
            number_cell(s.count.to_string()),
            number_cell(s.unique.to_string()),
            Cell::new(s.top.as_deref().unwrap_or("-")),
            number_cell(s.freq.to_string()),
        ]);
    }
    table
}

pub fn group_table(label: &str, groups: &[GroupSummary]) -> Table {
    let mut table = standard_table(&[label, "count", "average price"]);
    for g in groups {
        table.add_row(vec![
            Cell::new(&g.key),
            number_cell(g.count.to_string()),
            number_cell(float(g.average_price)),
        ]);
    }
    table
}

pub fn box_table(group: &str, metric: &str, boxes: &[BoxStats]) -> Table {
    let mut table = standard_table(&[
        group, "count", "whisker low", "q1", "median", "q3", "whisker high", "outliers",
    ]);
    for b in boxes {
        table.add_row(vec![
            Cell::new(&b.key),
            number_cell(b.count.to_string()),
            number_cell(format!("{:.0}", b.lower_whisker)),
            number_cell(format!("{:.0}", b.q1)),
            number_cell(format!("{:.0}", b.median)),
            number_cell(format!("{:.0}", b.q3)),
            number_cell(format!("{:.0}", b.upper_whisker)),
            number_cell(b.outliers.len().to_string()),
        ]);
    }
    tracing::debug!(group, metric, rows = boxes.len(), "Box table rendered");
    table
}

pub fn histogram_table(bins: &[Bin]) -> Table {
    let mut table = standard_table(&["from", "to", "count"]);
    for bin in bins.iter().filter(|b| b.count > 0) {
        table.add_row(vec![
            number_cell(format!("{:.0}", bin.start)),
            number_cell(format!("{:.0}", bin.end)),
            number_cell(bin.count.to_string()),
        ]);
    }
    table
}

/// First `limit` listings of `subset`.
pub fn listing_table(subset: &ListingTable, limit: usize) -> Table {
    let headers: Vec<&str> = LISTING_COLUMNS.iter().map(|c| c.name()).collect();
    let mut table = standard_table(&headers);
    for listing in subset.rows.iter().take(limit) {
        table.add_row(LISTING_COLUMNS.iter().map(|&c| {
            let text = listing.cell(c).to_string();
            if c.is_numeric() {
                number_cell(text)
            } else {
                Cell::new(text)
            }
        }));
    }
    table
}
