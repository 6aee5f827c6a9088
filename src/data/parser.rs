use std::collections::HashMap;

/// Detect the header row in a table of raw string rows.
/// Scans bottom-up for the last full-width row made entirely of
/// non-numeric, non-date cells; falls back to row 0.
pub fn detect_header_row(rows: &[Vec<String>]) -> usize {
    if rows.is_empty() {
        return 0;
    }

    // Most common column count defines "full width".
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.len()).or_insert(0) += 1;
    }
    let full_width = counts
        .into_iter()
        .max_by_key(|&(_, c)| c)
        .map(|(len, _)| len)
        .unwrap_or(0);

    for (i, row) in rows.iter().enumerate().rev() {
        if row.len() != full_width {
            continue;
        }
        let header_like = row.iter().all(|cell| {
            let trimmed = cell.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().is_err() && !is_date_like(trimmed)
        });
        if header_like {
            return i;
        }
    }

    0
}

/// Fraction of cells in a column that parse as finite numbers, sampling up
/// to `sample` rows. Used to decide which columns can act as model series.
pub fn numeric_fraction(column: &[String], sample: usize) -> f64 {
    let mut total = 0usize;
    let mut numeric = 0usize;
    for cell in column.iter().take(sample.max(1)) {
        total += 1;
        if cell
            .trim()
            .parse::<f64>()
            .map(|v| v.is_finite())
            .unwrap_or(false)
        {
            numeric += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        numeric as f64 / total as f64
    }
}

fn is_date_like(s: &str) -> bool {
    let has_separators = s.contains('/') || s.contains(':');
    if !has_separators {
        return false;
    }

    use chrono::{NaiveDate, NaiveDateTime};
    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%d",
        "%m/%d/%Y",
    ];
    formats.iter().any(|fmt| {
        NaiveDateTime::parse_from_str(s, fmt).is_ok() || NaiveDate::parse_from_str(s, fmt).is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_found_above_numeric_data() {
        let table = rows(&[
            &["Year", "CanESM5", "avg"],
            &["1950", "0.12", "0.10"],
            &["1951", "0.15", "0.13"],
        ]);
        assert_eq!(detect_header_row(&table), 0);
    }

    #[test]
    fn later_full_width_header_wins() {
        let table = rows(&[
            &["exported", "by", "climate tool"],
            &["Year", "CanESM5", "avg"],
            &["1950", "0.12", "0.10"],
        ]);
        assert_eq!(detect_header_row(&table), 1);
    }

    #[test]
    fn all_numeric_table_defaults_to_first_row() {
        let table = rows(&[&["1", "2"], &["3", "4"]]);
        assert_eq!(detect_header_row(&table), 0);
    }

    #[test]
    fn date_cells_do_not_count_as_header() {
        // Bottom-up scan must skip the date row even though nothing in it
        // parses as a number.
        let table = rows(&[&["Year", "Season"], &["01/15/2020", "winter"]]);
        assert_eq!(detect_header_row(&table), 0);
    }

    #[test]
    fn numeric_fraction_counts_finite_values() {
        let col: Vec<String> = ["1.5", "x", "2.0", "NaN", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let frac = numeric_fraction(&col, 100);
        // "NaN" parses but is not finite.
        assert!((frac - 2.0 / 5.0).abs() < 1e-12);
    }
}
