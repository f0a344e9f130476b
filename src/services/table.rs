use std::cmp::Ordering;

use serde_json::Value;

use crate::models::table::{cell_number, embedded_number, AnalyticsTable};
use crate::models::view::{RenderedTable, SortDirection, SortMode, SortState, TableTotal};
use crate::services::extractor::name_matches;

/// Marker for a null/missing cell. Deliberately not an empty string, so a
/// missing value stays distinguishable from a cell holding "".
pub const MISSING_CELL: &str = "—";

/// Column names that carry an ordinal embedded in the label ("Band 3").
const ORDINAL_HINTS: &[&str] = &["band", "grade", "level", "tier"];
/// Column names that sort alphabetically by default.
const LEXICAL_HINTS: &[&str] = &["department", "location", "education"];

/// Render a table with the inferred default sort.
pub fn render(table: &AnalyticsTable) -> RenderedTable {
    render_sorted(table, infer_sort(table))
}

/// Render a table under an explicit sort state (re-render after a header click).
pub fn render_sorted(table: &AnalyticsTable, sort: SortState) -> RenderedTable {
    let order = sorted_indices(table, &sort);
    let value_column = detect_value_column(table);
    let total = compute_total(table, value_column.as_deref());
    let rows = order
        .iter()
        .map(|&i| {
            table
                .columns
                .iter()
                .map(|col| format_cell(table.cell(i, col), col))
                .collect()
        })
        .collect();

    RenderedTable {
        columns: table.columns.clone(),
        rows,
        sort,
        total_display: total.display(),
        total,
        value_column,
    }
}

/// Infer the default sort for a table. Deterministic: column names are
/// inspected in a fixed priority order.
pub fn infer_sort(table: &AnalyticsTable) -> SortState {
    // Ordinal category labels sort ascending by their embedded number.
    if let Some(column) = find_column(table, &["band"]) {
        return SortState {
            column,
            direction: SortDirection::Ascending,
            mode: SortMode::EmbeddedNumber,
        };
    }
    if let Some(column) = find_column(table, &["grade", "level", "tier"]) {
        return SortState {
            column,
            direction: SortDirection::Ascending,
            mode: SortMode::EmbeddedNumber,
        };
    }

    // Category labels that are themselves numbers ("101", "102", ...).
    let category = category_column(table);
    if mostly_numeric(table, &category) {
        return SortState {
            column: category,
            direction: SortDirection::Ascending,
            mode: SortMode::Numeric,
        };
    }

    if let Some(column) = find_column(table, LEXICAL_HINTS) {
        return SortState {
            column,
            direction: SortDirection::Ascending,
            mode: SortMode::Lexicographic,
        };
    }

    // Largest value first when a numeric value column exists.
    if let Some(column) = detect_value_column(table) {
        return SortState {
            column,
            direction: SortDirection::Descending,
            mode: SortMode::Numeric,
        };
    }

    SortState {
        column: table.columns.first().cloned().unwrap_or_default(),
        direction: SortDirection::Ascending,
        mode: SortMode::Lexicographic,
    }
}

/// Header-click semantics: toggle direction on the active column, otherwise
/// switch to the clicked column with its type-appropriate default direction
/// (ascending for ordinal columns, descending otherwise).
pub fn toggle_sort(table: &AnalyticsTable, current: &SortState, clicked: &str) -> SortState {
    if clicked == current.column {
        return SortState {
            column: current.column.clone(),
            direction: current.direction.toggled(),
            mode: current.mode,
        };
    }

    let mode = column_mode(table, clicked);
    let direction = if name_matches(clicked, ORDINAL_HINTS) {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    };
    SortState {
        column: clicked.to_string(),
        direction,
        mode,
    }
}

/// The category column: a hinted ordinal column if one exists, otherwise the
/// first declared column by convention.
pub fn category_column(table: &AnalyticsTable) -> String {
    find_column(table, ORDINAL_HINTS)
        .or_else(|| table.columns.first().cloned())
        .unwrap_or_default()
}

/// The numeric value column used for totals, default sorting and chart data:
/// the first column that is not the category, not a percent column, and whose
/// cells are mostly numeric. `None` when the table has no such column.
pub fn detect_value_column(table: &AnalyticsTable) -> Option<String> {
    let category = category_column(table);
    table
        .columns
        .iter()
        .filter(|col| **col != category)
        .filter(|col| !name_matches(col, &["percent"]))
        .find(|col| mostly_numeric(table, col))
        .cloned()
}

/// Sum of the value column across all rows; non-numeric cells are excluded.
/// Explicitly `Unavailable` (not zero) when no numeric column was detected.
pub fn compute_total(table: &AnalyticsTable, value_column: Option<&str>) -> TableTotal {
    match value_column {
        Some(column) => {
            let sum = table
                .rows
                .iter()
                .filter_map(|row| row.get(column).and_then(cell_number))
                .sum();
            TableTotal::Sum(sum)
        }
        None => TableTotal::Unavailable,
    }
}

/// Display order of row indices under a sort state. The sort is stable, so
/// rows without a comparable key keep their original relative order, at the end.
fn sorted_indices(table: &AnalyticsTable, sort: &SortState) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..table.rows.len()).collect();
    indices.sort_by(|&a, &b| {
        let ka = sort_key(table.cell(a, &sort.column), sort.mode);
        let kb = sort_key(table.cell(b, &sort.column), sort.mode);
        match (ka, kb) {
            (Some(x), Some(y)) => {
                let ord = x.compare(&y);
                if sort.direction == SortDirection::Descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
            // Keyless cells always sort last, regardless of direction.
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    indices
}

enum SortKey {
    Num(f64),
    Text(String),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Num(a), SortKey::Num(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Num(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Num(_)) => Ordering::Greater,
        }
    }
}

fn sort_key(value: Option<&Value>, mode: SortMode) -> Option<SortKey> {
    let value = value?;
    if value.is_null() {
        return None;
    }
    match mode {
        SortMode::EmbeddedNumber => embedded_number(value).map(|n| SortKey::Num(n as f64)),
        SortMode::Numeric => cell_number(value).map(SortKey::Num),
        SortMode::Lexicographic => Some(SortKey::Text(cell_text(value).to_lowercase())),
    }
}

fn column_mode(table: &AnalyticsTable, column: &str) -> SortMode {
    if name_matches(column, ORDINAL_HINTS) {
        SortMode::EmbeddedNumber
    } else if mostly_numeric(table, column) {
        SortMode::Numeric
    } else {
        SortMode::Lexicographic
    }
}

fn find_column(table: &AnalyticsTable, hints: &[&str]) -> Option<String> {
    table
        .columns
        .iter()
        .find(|col| name_matches(col, hints))
        .cloned()
}

/// Strict majority of non-null cells parse as numbers.
fn mostly_numeric(table: &AnalyticsTable, column: &str) -> bool {
    let mut non_null = 0usize;
    let mut numeric = 0usize;
    for row in &table.rows {
        match row.get(column) {
            None | Some(Value::Null) => {}
            Some(value) => {
                non_null += 1;
                if cell_number(value).is_some() {
                    numeric += 1;
                }
            }
        }
    }
    non_null > 0 && numeric * 2 > non_null
}

/// Format one cell for display. Percent columns get one decimal and a `%`
/// suffix, numeric cells get thousands separators, null/missing cells render
/// the explicit missing marker.
pub fn format_cell(value: Option<&Value>, column: &str) -> String {
    let value = match value {
        None | Some(Value::Null) => return MISSING_CELL.to_string(),
        Some(v) => v,
    };

    if name_matches(column, &["percent"]) {
        if let Some(n) = cell_number(value) {
            return format!("{:.1}%", n);
        }
        return cell_text(value);
    }

    match cell_number(value) {
        Some(n) => format_number(n),
        None => cell_text(value),
    }
}

pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Thousands-separated number: integers render without decimals, fractional
/// values with two.
pub fn format_number(value: f64) -> String {
    let formatted = if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    };
    let (sign, rest) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest.to_string()),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rest, None),
    };

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(columns: &[&str], rows: Vec<Value>) -> AnalyticsTable {
        AnalyticsTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.as_object().unwrap().clone())
                .collect(),
        }
    }

    fn band_table() -> AnalyticsTable {
        table(
            &["band", "count"],
            vec![
                json!({"band": "Band 3", "count": 10}),
                json!({"band": "Band 1", "count": 5}),
                json!({"band": "Band 2", "count": 7}),
            ],
        )
    }

    #[test]
    fn band_table_sorts_ascending_by_embedded_number_with_total() {
        let rendered = render(&band_table());
        let first_col: Vec<&str> = rendered.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(first_col, vec!["Band 1", "Band 2", "Band 3"]);
        assert_eq!(rendered.sort.direction, SortDirection::Ascending);
        assert_eq!(rendered.total, TableTotal::Sum(22.0));
        assert_eq!(rendered.total_display, "22");
        assert_eq!(rendered.value_column.as_deref(), Some("count"));
    }

    #[test]
    fn band_ten_sorts_after_band_two() {
        let t = table(
            &["band", "count"],
            vec![
                json!({"band": "Band 10", "count": 1}),
                json!({"band": "Band 2", "count": 2}),
            ],
        );
        let rendered = render(&t);
        assert_eq!(rendered.rows[0][0], "Band 2");
        assert_eq!(rendered.rows[1][0], "Band 10");
    }

    #[test]
    fn department_column_sorts_lexicographically() {
        let t = table(
            &["department", "headcount"],
            vec![
                json!({"department": "Sales", "headcount": 30}),
                json!({"department": "Finance", "headcount": 12}),
                json!({"department": "IT", "headcount": 25}),
            ],
        );
        let rendered = render(&t);
        let depts: Vec<&str> = rendered.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(depts, vec!["Finance", "IT", "Sales"]);
        assert_eq!(rendered.sort.mode, SortMode::Lexicographic);
    }

    #[test]
    fn unhinted_table_sorts_by_value_column_descending() {
        let t = table(
            &["dept", "count"],
            vec![
                json!({"dept": "A", "count": 3}),
                json!({"dept": "B", "count": 9}),
                json!({"dept": "C", "count": 6}),
            ],
        );
        let rendered = render(&t);
        assert_eq!(rendered.sort.column, "count");
        assert_eq!(rendered.sort.direction, SortDirection::Descending);
        let counts: Vec<&str> = rendered.rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(counts, vec!["9", "6", "3"]);
    }

    #[test]
    fn numeric_category_labels_sort_ascending() {
        let t = table(
            &["code", "count"],
            vec![
                json!({"code": "102", "count": 1}),
                json!({"code": "9", "count": 2}),
                json!({"code": "30", "count": 3}),
            ],
        );
        let rendered = render(&t);
        assert_eq!(rendered.sort.column, "code");
        let codes: Vec<&str> = rendered.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(codes, vec!["9", "30", "102"]);
    }

    #[test]
    fn sort_round_trip_preserves_row_multiset_and_is_idempotent() {
        let t = band_table();
        let sort = infer_sort(&t);
        let asc = render_sorted(&t, sort.clone());
        let desc = render_sorted(&t, toggle_sort(&t, &sort, &sort.column));

        let mut asc_rows = asc.rows.clone();
        let mut desc_rows = desc.rows.clone();
        asc_rows.sort();
        desc_rows.sort();
        assert_eq!(asc_rows, desc_rows);

        let again = render_sorted(&t, sort.clone());
        assert_eq!(asc.rows, again.rows);
    }

    #[test]
    fn toggle_switches_direction_on_active_column_only() {
        let t = band_table();
        let sort = infer_sort(&t);
        let toggled = toggle_sort(&t, &sort, "band");
        assert_eq!(toggled.direction, SortDirection::Descending);
        assert_eq!(toggled.mode, SortMode::EmbeddedNumber);

        // A different column gets its own default: descending for values.
        let switched = toggle_sort(&t, &sort, "count");
        assert_eq!(switched.column, "count");
        assert_eq!(switched.direction, SortDirection::Descending);
        assert_eq!(switched.mode, SortMode::Numeric);
    }

    #[test]
    fn non_numeric_cells_sort_last_in_original_order() {
        let t = table(
            &["band", "count"],
            vec![
                json!({"band": "Unassigned", "count": 1}),
                json!({"band": "Band 2", "count": 2}),
                json!({"band": "Pending", "count": 3}),
                json!({"band": "Band 1", "count": 4}),
            ],
        );
        let rendered = render(&t);
        let bands: Vec<&str> = rendered.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(bands, vec!["Band 1", "Band 2", "Unassigned", "Pending"]);
    }

    #[test]
    fn total_is_unavailable_without_a_numeric_column() {
        let t = table(
            &["name", "manager"],
            vec![json!({"name": "Ana", "manager": "Bo"})],
        );
        let rendered = render(&t);
        assert_eq!(rendered.total, TableTotal::Unavailable);
        assert_eq!(rendered.total_display, "N/A");
        assert_eq!(rendered.value_column, None);
    }

    #[test]
    fn cell_formatting_rules() {
        assert_eq!(format_cell(Some(&json!(1250000)), "count"), "1,250,000");
        assert_eq!(format_cell(Some(&json!(12.345)), "share_percent"), "12.3%");
        assert_eq!(format_cell(Some(&json!("8.2")), "percent"), "8.2%");
        assert_eq!(format_cell(Some(&json!(null)), "count"), MISSING_CELL);
        assert_eq!(format_cell(None, "count"), MISSING_CELL);
        // An empty string is not "missing".
        assert_eq!(format_cell(Some(&json!("")), "note"), "");
        assert_eq!(format_cell(Some(&json!("Band 3")), "band"), "Band 3");
        assert_eq!(format_cell(Some(&json!(7.5)), "avg"), "7.50");
    }

    #[test]
    fn thousands_formatting() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(-1234567.0), "-1,234,567");
        assert_eq!(format_number(1234.5), "1,234.50");
    }
}
