//! Spreadsheet shaping: raw worksheet grids into build data.
//!
//! Two branches per sheet, picked by title. "Microcopy" sheets become a
//! key/value map with a reused-key-becomes-array merge rule; everything
//! else becomes an array of header-keyed records. Shaping is a pure
//! function of the sheet title and the 2D grid; all I/O stays in the
//! client and loader.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use serde_json::{Map, Value};

use crate::error::Result;

/// A worksheet as raw cells, one Vec per row.
pub type SheetGrid = Vec<Vec<String>>;

/// Whether a sheet holds key/value microcopy rather than tabular data.
///
/// True iff the title, case-insensitively, is exactly "microcopy" or
/// "copy", or ends with a space, hyphen or underscore followed by
/// "copy". "Copying" and "Copybook" do not qualify.
pub fn is_microcopy_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    if lower == "microcopy" || lower == "copy" {
        return true;
    }
    match lower.strip_suffix("copy") {
        Some(prefix) => {
            prefix.ends_with(' ') || prefix.ends_with('-') || prefix.ends_with('_')
        }
        None => false,
    }
}

/// Shape a microcopy sheet: first column is the key, second the value.
///
/// The header row is skipped, as are rows with fewer than two cells or
/// a blank key. A reused key turns the stored value into an array, in
/// first-seen order.
pub fn shape_microcopy(rows: &[Vec<String>]) -> Map<String, Value> {
    let mut shaped = Map::new();

    for row in rows.iter().skip(1) {
        if row.len() < 2 || row[0].trim().is_empty() {
            continue;
        }
        let key = row[0].clone();
        let value = Value::String(row[1].clone());

        match shaped.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let prior = existing.take();
                *existing = Value::Array(vec![prior, value]);
            }
            None => {
                shaped.insert(key, value);
            }
        }
    }

    shaped
}

/// Shape a tabular sheet: first row is the header, every other row a
/// record.
///
/// Rows whose cells are all blank are dropped. Cells are zipped to
/// header names positionally: a short row leaves its trailing fields
/// absent, extra cells beyond the header are dropped. A sheet with no
/// data rows yields an empty list.
pub fn shape_table(rows: &[Vec<String>]) -> Vec<Map<String, Value>> {
    if rows.len() < 2 {
        return Vec::new();
    }

    let header = &rows[0];
    rows[1..]
        .iter()
        .filter(|row| !row.iter().all(|cell| cell.trim().is_empty()))
        .map(|row| {
            header
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.clone(), Value::String(cell.clone())))
                .collect()
        })
        .collect()
}

/// Shape every sheet of a parsed workbook, keyed by sheet title.
pub fn shape_workbook(sheets: &[(String, SheetGrid)]) -> Map<String, Value> {
    let mut shaped = Map::new();
    for (title, grid) in sheets {
        let value = if is_microcopy_title(title) {
            Value::Object(shape_microcopy(grid))
        } else {
            Value::Array(shape_table(grid).into_iter().map(Value::Object).collect())
        };
        shaped.insert(title.clone(), value);
    }
    shaped
}

/// Parse XLSX bytes into per-sheet grids. Empty cells become empty
/// strings so shaping sees rectangular rows.
pub fn parse_xlsx(bytes: &[u8]) -> Result<Vec<(String, SheetGrid)>> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let grid = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();
        sheets.push((name, grid));
    }
    Ok(sheets)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid(rows: &[&[&str]]) -> SheetGrid {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_microcopy_title_exact_matches() {
        assert!(is_microcopy_title("microcopy"));
        assert!(is_microcopy_title("Microcopy"));
        assert!(is_microcopy_title("COPY"));
        assert!(is_microcopy_title("Copy"));
    }

    #[test]
    fn test_microcopy_title_suffix_matches() {
        assert!(is_microcopy_title("my-copy"));
        assert!(is_microcopy_title("notes_copy"));
        assert!(is_microcopy_title("Sidebar Copy"));
    }

    #[test]
    fn test_microcopy_title_non_matches() {
        assert!(!is_microcopy_title("Copying"));
        assert!(!is_microcopy_title("Copybook"));
        assert!(!is_microcopy_title("notes"));
        assert!(!is_microcopy_title("copyedit"));
    }

    #[test]
    fn test_microcopy_single_occurrence_stays_scalar() {
        let rows = grid(&[&["key", "value"], &["title", "Hello"]]);
        let shaped = shape_microcopy(&rows);
        assert_eq!(shaped["title"], json!("Hello"));
    }

    #[test]
    fn test_microcopy_repeated_key_becomes_array() {
        let rows = grid(&[
            &["key", "value"],
            &["k", "v1"],
            &["k", "v2"],
            &["k", "v3"],
        ]);
        let shaped = shape_microcopy(&rows);
        assert_eq!(shaped["k"], json!(["v1", "v2", "v3"]));
    }

    #[test]
    fn test_microcopy_skips_blank_keys_and_short_rows() {
        let rows = grid(&[
            &["key", "value"],
            &["", "orphan"],
            &["  ", "orphan"],
            &["lonely"],
            &["kept", "yes"],
        ]);
        let shaped = shape_microcopy(&rows);
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped["kept"], json!("yes"));
    }

    #[test]
    fn test_microcopy_preserves_first_seen_order() {
        let rows = grid(&[
            &["key", "value"],
            &["zebra", "1"],
            &["apple", "2"],
            &["zebra", "3"],
        ]);
        let shaped = shape_microcopy(&rows);
        let keys: Vec<&String> = shaped.keys().collect();
        assert_eq!(keys, ["zebra", "apple"]);
        assert_eq!(shaped["zebra"], json!(["1", "3"]));
    }

    #[test]
    fn test_table_basic() {
        let rows = grid(&[&["a", "b"], &["1", "2"], &["3", "4"]]);
        let shaped = shape_table(&rows);
        assert_eq!(
            Value::Array(shaped.into_iter().map(Value::Object).collect()),
            json!([{"a": "1", "b": "2"}, {"a": "3", "b": "4"}])
        );
    }

    #[test]
    fn test_table_header_only_yields_empty_list() {
        let rows = grid(&[&["a", "b"]]);
        assert!(shape_table(&rows).is_empty());
    }

    #[test]
    fn test_table_drops_blank_rows_keeps_partial_rows() {
        let rows = grid(&[
            &["a", "b"],
            &["", "   "],
            &["1", ""],
        ]);
        let shaped = shape_table(&rows);
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0]["a"], json!("1"));
        assert_eq!(shaped[0]["b"], json!(""));
    }

    #[test]
    fn test_table_short_row_leaves_trailing_fields_absent() {
        let rows = grid(&[&["a", "b", "c"], &["1", "2"]]);
        let shaped = shape_table(&rows);
        assert_eq!(shaped[0].len(), 2);
        assert!(!shaped[0].contains_key("c"));
    }

    #[test]
    fn test_table_long_row_drops_extra_cells() {
        let rows = grid(&[&["a", "b"], &["1", "2", "3", "4"]]);
        let shaped = shape_table(&rows);
        assert_eq!(shaped[0].len(), 2);
        assert_eq!(shaped[0]["b"], json!("2"));
    }

    #[test]
    fn test_shape_workbook_routes_by_title() {
        let sheets = vec![
            (
                "microcopy".to_string(),
                grid(&[&["key", "value"], &["help", "Click here"]]),
            ),
            (
                "people".to_string(),
                grid(&[&["name", "age"], &["Ada", "36"]]),
            ),
        ];
        let shaped = shape_workbook(&sheets);
        assert_eq!(shaped["microcopy"], json!({"help": "Click here"}));
        assert_eq!(shaped["people"], json!([{"name": "Ada", "age": "36"}]));
    }

    #[test]
    fn test_shaping_is_deterministic() {
        let sheets = vec![(
            "copy".to_string(),
            grid(&[&["key", "value"], &["k", "v1"], &["k", "v2"]]),
        )];
        let first = shape_workbook(&sheets);
        let second = shape_workbook(&sheets);
        assert_eq!(first, second);
    }
}
