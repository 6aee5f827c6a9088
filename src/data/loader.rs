use std::path::Path;

use crate::data::parser;

/// A loaded data table: column names plus column-major string data.
pub struct LoadedData {
    pub columns: Vec<String>,
    /// column_data[col_idx][row_idx]
    pub column_data: Vec<Vec<String>>,
    pub row_count: usize,
}

/// Load a CSV or Excel file into a column-major string table.
/// The header row is detected on the in-memory rows, so each file is read
/// exactly once.
pub fn load_file(path: &Path) -> Result<LoadedData, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let rows = match ext.as_str() {
        "csv" => read_csv_rows(path)?,
        "xls" | "xlsx" => read_excel_rows(path)?,
        _ => return Err(format!("Unsupported file format: .{ext}")),
    };

    table_from_rows(rows)
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    // Try UTF-8 first, then latin1 (each byte maps to the same code point).
    let content = std::fs::read(path).map_err(|e| format!("Cannot read file: {e}"))?;
    let text = String::from_utf8(content.clone())
        .unwrap_or_else(|_| content.iter().map(|&b| b as char).collect());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records().flatten() {
        let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

fn read_excel_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    use calamine::{open_workbook_auto, Data, Reader};

    let mut workbook =
        open_workbook_auto(path).map_err(|e| format!("Cannot open Excel file: {e}"))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .ok_or("No sheets found")?
        .clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Cannot read sheet: {e}"))?;

    let rows = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::String(s) => s.clone(),
                    Data::Float(f) => f.to_string(),
                    Data::Int(i) => i.to_string(),
                    Data::Bool(b) => b.to_string(),
                    Data::DateTime(dt) => dt.to_string(),
                    Data::DateTimeIso(s) => s.clone(),
                    Data::DurationIso(s) => s.clone(),
                    Data::Error(e) => format!("{e:?}"),
                })
                .collect()
        })
        .collect();
    Ok(rows)
}

/// Split raw rows into header + column-major data.
fn table_from_rows(rows: Vec<Vec<String>>) -> Result<LoadedData, String> {
    if rows.is_empty() {
        return Err("No data found in file".to_string());
    }

    let header_row = parser::detect_header_row(&rows);
    let data_rows = &rows[header_row + 1..];
    if data_rows.is_empty() {
        return Err("No data rows found after the header".to_string());
    }

    let columns: Vec<String> = rows[header_row]
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    let num_cols = columns.len();

    let mut column_data: Vec<Vec<String>> = vec![Vec::new(); num_cols];
    for row in data_rows {
        for (col_idx, col) in column_data.iter_mut().enumerate() {
            col.push(row.get(col_idx).cloned().unwrap_or_default());
        }
    }

    Ok(LoadedData {
        columns,
        column_data,
        row_count: data_rows.len(),
    })
}

/// Extract numeric f64 values from a string column.
/// Returns (values, fraction_valid); unparseable cells become NaN.
pub fn column_to_f64(data: &[String]) -> (Vec<f64>, f64) {
    let mut values = Vec::with_capacity(data.len());
    let mut valid = 0usize;
    for s in data {
        match s.trim().parse::<f64>() {
            Ok(v) => {
                values.push(v);
                if v.is_finite() {
                    valid += 1;
                }
            }
            Err(_) => values.push(f64::NAN),
        }
    }
    let frac = if data.is_empty() {
        0.0
    } else {
        valid as f64 / data.len() as f64
    };
    (values, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn table_splits_header_and_columns() {
        let rows = vec![
            strings(&["Year", "CanESM5", "avg"]),
            strings(&["1950", "0.12", "0.10"]),
            strings(&["1951", "0.15", "0.13"]),
        ];
        let table = table_from_rows(rows).unwrap();
        assert_eq!(table.columns, vec!["Year", "CanESM5", "avg"]);
        assert_eq!(table.row_count, 2);
        assert_eq!(table.column_data[1], vec!["0.12", "0.15"]);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let rows = vec![
            strings(&["Year", "CanESM5", "avg"]),
            strings(&["1950", "0.12", "0.10"]),
            strings(&["1951", "0.15"]),
        ];
        let table = table_from_rows(rows).unwrap();
        assert_eq!(table.column_data[2], vec!["0.10", ""]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(table_from_rows(Vec::new()).is_err());
        let only_header = vec![strings(&["Year", "avg"])];
        assert!(table_from_rows(only_header).is_err());
    }

    #[test]
    fn bad_cells_become_nan() {
        let col = strings(&["1.0", "oops", "3.5", ""]);
        let (values, frac) = column_to_f64(&col);
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.5);
        assert!(values[3].is_nan());
        assert!((frac - 0.5).abs() < 1e-12);
    }
}
