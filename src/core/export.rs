// CarScope - core/export.rs
//
// Spreadsheet and CSV export of a listing table.
// The spreadsheet is built in memory so callers can offer it as a download
// or write it wherever they like; the CSV exporter writes to any `Write`.
//
// Both formats share one layout: a header row with the table's column
// names, then one row per listing. Missing values are empty cells.

use crate::core::model::{Cell, ListingTable};
use crate::util::constants;
use crate::util::error::ExportError;
use rust_xlsxwriter::Workbook;
use std::io::Write;
use std::path::Path;

/// Serialise `table` to an xlsx workbook held in memory.
///
/// One sheet named "Car Data". Numeric columns are written as numbers,
/// dates as `YYYY-MM-DD` text. Text longer than an xlsx cell allows is
/// truncated and counted in a warning.
pub fn export_xlsx(table: &ListingTable) -> Result<Vec<u8>, ExportError> {
    check_row_limit(table)?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(constants::EXPORT_SHEET_NAME)?;

    for (col, column) in table.columns.iter().enumerate() {
        sheet.write_string(0, col as u16, column.name())?;
    }

    let mut truncated = 0usize;
    for (idx, listing) in table.rows.iter().enumerate() {
        // Row 0 is the header; the row limit keeps this within u32.
        let row = (idx + 1) as u32;
        for (col, column) in table.columns.iter().enumerate() {
            let col = col as u16;
            match listing.cell(*column) {
                Cell::Number(n) => {
                    sheet.write_number(row, col, n as f64)?;
                }
                Cell::Text(s) => {
                    let fitted = fit_cell_text(s);
                    if fitted.len() < s.len() {
                        truncated += 1;
                    }
                    sheet.write_string(row, col, fitted)?;
                }
                Cell::Date(day) => {
                    sheet.write_string(row, col, day.format("%Y-%m-%d").to_string())?;
                }
                Cell::Empty => {}
            }
        }
    }

    if truncated > 0 {
        tracing::warn!(
            cells = truncated,
            max_chars = constants::XLSX_MAX_CELL_CHARS,
            "Truncated text cells that exceed the spreadsheet limit"
        );
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::info!(
        rows = table.len(),
        columns = table.columns.len(),
        bytes = bytes.len(),
        "Spreadsheet export built"
    );
    Ok(bytes)
}

/// Build the spreadsheet and write it to `path`.
pub fn write_xlsx_file(table: &ListingTable, path: &Path) -> Result<usize, ExportError> {
    let bytes = export_xlsx(table)?;
    std::fs::write(path, &bytes).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(table.len())
}

/// Export `table` as CSV, returning the number of data rows written.
pub fn export_csv<W: Write>(table: &ListingTable, writer: W) -> Result<usize, ExportError> {
    check_row_limit(table)?;

    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(table.columns.iter().map(|c| c.name()))
        .map_err(|e| ExportError::Csv { source: e })?;

    let mut count = 0;
    for listing in &table.rows {
        csv_writer
            .write_record(table.columns.iter().map(|c| listing.cell(*c).to_string()))
            .map_err(|e| ExportError::Csv { source: e })?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Csv {
        source: csv::Error::from(e),
    })?;

    Ok(count)
}

/// The longest prefix of `text` that fits in one xlsx cell, cut on a char
/// boundary.
fn fit_cell_text(text: &str) -> &str {
    match text.char_indices().nth(constants::XLSX_MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn check_row_limit(table: &ListingTable) -> Result<(), ExportError> {
    if table.len() > constants::MAX_EXPORT_ROWS {
        return Err(ExportError::TooManyRows {
            count: table.len(),
            max: constants::MAX_EXPORT_ROWS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Column, Listing};
    use chrono::NaiveDate;

    fn sample() -> ListingTable {
        ListingTable {
            columns: vec![Column::Brand, Column::Model, Column::Price, Column::Date, Column::DateInt],
            rows: vec![
                Listing {
                    brand: Some("Renault".to_string()),
                    model: Some("CLIO".to_string()),
                    price: Some(150),
                    date: Some("2021-01-01 00:00:00.000 +00:00".to_string()),
                    posted_on: NaiveDate::from_ymd_opt(2021, 1, 1),
                    date_int: Some(18_628),
                    ..Default::default()
                },
                Listing {
                    brand: Some("Kia, Motors".to_string()),
                    model: Some("RIO".to_string()),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_csv_export() {
        let mut buf = Vec::new();
        let count = export_csv(&sample(), &mut buf).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "brand,model,price,date,date_int");
        assert_eq!(lines[1], "Renault,CLIO,150,2021-01-01,18628");
        assert_eq!(lines[2], "\"Kia, Motors\",RIO,,,");
    }

    #[test]
    fn test_xlsx_export_is_a_zip_container() {
        let bytes = export_xlsx(&sample()).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_long_text_is_cut_to_cell_limit() {
        let short = "Clio 1.5 dCi";
        assert_eq!(fit_cell_text(short), short);

        let wide = "é".repeat(constants::XLSX_MAX_CELL_CHARS + 10);
        let fitted = fit_cell_text(&wide);
        assert_eq!(fitted.chars().count(), constants::XLSX_MAX_CELL_CHARS);
        assert!(wide.starts_with(fitted));
    }

    #[test]
    fn test_xlsx_export_accepts_oversized_title() {
        let table = ListingTable {
            columns: vec![Column::Title, Column::Price],
            rows: vec![Listing {
                title: Some("x".repeat(40_000)),
                price: Some(150),
                ..Default::default()
            }],
        };
        let bytes = export_xlsx(&table).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_empty_table_exports_header_only() {
        let table = ListingTable::with_stored_columns(Vec::new());
        let mut buf = Vec::new();
        assert_eq!(export_csv(&table, &mut buf).unwrap(), 0);
        let output = String::from_utf8(buf).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("link,title,price"));
        assert!(export_xlsx(&table).is_ok());
    }
}
