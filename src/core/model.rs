// CarScope - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers: the loader
// produces a `ListingTable`, the cleaner and filters consume and return one,
// and the summaries and exporters read from one.

use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;

// =============================================================================
// Listing (one row of the listings relation)
// =============================================================================

/// A single used-car advertisement.
///
/// Every stored attribute is optional: the store is scraped data and any
/// field may be NULL or absent from the projection. The cleaner is what
/// establishes guarantees on top of this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub link: Option<String>,
    pub title: Option<String>,
    /// Asking price in currency units.
    pub price: Option<i64>,
    pub engine: Option<String>,
    pub fuel: Option<String>,
    /// Distance travelled. Some sellers record it in thousands.
    pub mileage: Option<i64>,
    pub color: Option<String>,
    pub gearbox: Option<String>,
    pub paper: Option<String>,
    pub brand: Option<String>,
    /// Model year.
    pub year: Option<i32>,
    pub model: Option<String>,
    pub finition: Option<String>,
    pub location: Option<String>,
    /// Administrative region code.
    pub wilaya: Option<String>,
    /// Post date exactly as stored.
    pub date: Option<String>,

    /// Post date parsed by the cleaner. `None` until cleaned, or when the
    /// stored date is NULL.
    pub posted_on: Option<NaiveDate>,

    /// Days between 1970-01-01 and `posted_on`, derived by the cleaner.
    pub date_int: Option<i64>,
}

impl Listing {
    /// Value of a categorical column, if the column is textual.
    pub fn text(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::Link => &self.link,
            Column::Title => &self.title,
            Column::Engine => &self.engine,
            Column::Fuel => &self.fuel,
            Column::Color => &self.color,
            Column::Gearbox => &self.gearbox,
            Column::Paper => &self.paper,
            Column::Brand => &self.brand,
            Column::Model => &self.model,
            Column::Finition => &self.finition,
            Column::Location => &self.location,
            Column::Wilaya => &self.wilaya,
            Column::Date => &self.date,
            Column::Price | Column::Mileage | Column::Year | Column::DateInt => return None,
        };
        value.as_deref()
    }

    /// Value of a numeric column, if the column is numeric.
    pub fn number(&self, column: Column) -> Option<i64> {
        match column {
            Column::Price => self.price,
            Column::Mileage => self.mileage,
            Column::Year => self.year.map(i64::from),
            Column::DateInt => self.date_int,
            _ => None,
        }
    }

    /// Cell value for display and export.
    pub fn cell(&self, column: Column) -> Cell<'_> {
        if column.is_numeric() {
            match self.number(column) {
                Some(n) => Cell::Number(n),
                None => Cell::Empty,
            }
        } else if column == Column::Date {
            // Cleaned rows show the normalised date rather than the raw text.
            match (self.posted_on, self.date.as_deref()) {
                (Some(day), _) => Cell::Date(day),
                (None, Some(raw)) => Cell::Text(raw),
                (None, None) => Cell::Empty,
            }
        } else {
            match self.text(column) {
                Some(s) => Cell::Text(s),
                None => Cell::Empty,
            }
        }
    }
}

/// A single typed cell, borrowed from a `Listing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(i64),
    Date(NaiveDate),
    Empty,
}

impl std::fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Empty => Ok(()),
        }
    }
}

// =============================================================================
// Column
// =============================================================================

/// The columns of the listings relation, in projection order, plus the
/// derived `date_int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Link,
    Title,
    Price,
    Engine,
    Fuel,
    Mileage,
    Color,
    Gearbox,
    Paper,
    Brand,
    Year,
    Model,
    Finition,
    Location,
    Wilaya,
    Date,
    DateInt,
}

impl Column {
    /// The stored projection, in the order the loader selects it.
    pub fn all_stored() -> &'static [Column] {
        &[
            Column::Link,
            Column::Title,
            Column::Price,
            Column::Engine,
            Column::Fuel,
            Column::Mileage,
            Column::Color,
            Column::Gearbox,
            Column::Paper,
            Column::Brand,
            Column::Year,
            Column::Model,
            Column::Finition,
            Column::Location,
            Column::Wilaya,
            Column::Date,
        ]
    }

    /// Column name as stored and as written to export headers.
    pub fn name(&self) -> &'static str {
        match self {
            Column::Link => "link",
            Column::Title => "title",
            Column::Price => "price",
            Column::Engine => "engine",
            Column::Fuel => "fuel",
            Column::Mileage => "mileage",
            Column::Color => "color",
            Column::Gearbox => "gearbox",
            Column::Paper => "paper",
            Column::Brand => "brand",
            Column::Year => "year",
            Column::Model => "model",
            Column::Finition => "finition",
            Column::Location => "location",
            Column::Wilaya => "wilaya",
            Column::Date => "date",
            Column::DateInt => "date_int",
        }
    }

    /// True for integer-valued columns.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Column::Price | Column::Mileage | Column::Year | Column::DateInt
        )
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Column::all_stored()
            .iter()
            .chain(std::iter::once(&Column::DateInt))
            .find(|c| c.name() == wanted)
            .copied()
            .ok_or_else(|| format!("unknown column '{s}'"))
    }
}

// =============================================================================
// Listing table
// =============================================================================

/// An in-memory table of listings.
///
/// `columns` records which columns the table actually carries, in order.
/// Values of columns that are not listed are always `None` in `rows`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Listing>,
}

impl ListingTable {
    /// Table carrying the full stored projection.
    pub fn with_stored_columns(rows: Vec<Listing>) -> Self {
        Self {
            columns: Column::all_stored().to_vec(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Same columns, different rows.
    pub fn with_rows(&self, rows: Vec<Listing>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Materialise the rows at `indices` (as returned by the filter engine).
    ///
    /// Out-of-range indices are skipped.
    pub fn select(&self, indices: &[usize]) -> Self {
        let rows = indices
            .iter()
            .filter_map(|&i| self.rows.get(i).cloned())
            .collect();
        self.with_rows(rows)
    }

    /// Latest `posted_on` in the table.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().filter_map(|r| r.posted_on).max()
    }

    /// Earliest `posted_on` in the table.
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().filter_map(|r| r.posted_on).min()
    }
}
