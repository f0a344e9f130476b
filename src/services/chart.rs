use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::models::table::{cell_number, AnalyticsTable};
use crate::models::view::{ChartOption, ChartTypeInfo};
use crate::services::table::{category_column, cell_text, detect_value_column};

/// Readability ceiling for circular charts (pie, doughnut, polar area, radar).
const MAX_CIRCULAR_CATEGORIES: usize = 15;
/// Ceiling for vertical bars; horizontal bars have no ceiling.
const MAX_VERTICAL_BARS: usize = 30;
/// Above this, a plain table is the primary recommendation.
const TABLE_ONLY_THRESHOLD: usize = 35;

/// Normalized chart-type vocabulary. Backend spellings (`bar_chart`,
/// `polar_area_chart`, `horizontal_bar`, ...) all map onto this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "horizontalBar")]
    HorizontalBar,
    #[serde(rename = "pie")]
    Pie,
    #[serde(rename = "doughnut")]
    Doughnut,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "polarArea")]
    PolarArea,
    #[serde(rename = "bubble")]
    Bubble,
    #[serde(rename = "scatter")]
    Scatter,
    #[serde(rename = "radar")]
    Radar,
    #[serde(rename = "table")]
    Table,
}

impl ChartKind {
    pub const ALL: [ChartKind; 10] = [
        ChartKind::Bar,
        ChartKind::HorizontalBar,
        ChartKind::Pie,
        ChartKind::Doughnut,
        ChartKind::Line,
        ChartKind::PolarArea,
        ChartKind::Bubble,
        ChartKind::Scatter,
        ChartKind::Radar,
        ChartKind::Table,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::HorizontalBar => "horizontalBar",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Line => "line",
            ChartKind::PolarArea => "polarArea",
            ChartKind::Bubble => "bubble",
            ChartKind::Scatter => "scatter",
            ChartKind::Radar => "radar",
            ChartKind::Table => "table",
        }
    }

    /// Normalize a backend token. Case-insensitive; tolerates `_chart`
    /// suffixes, underscores and hyphens.
    pub fn from_token(token: &str) -> Option<ChartKind> {
        let normalized: String = token
            .trim()
            .to_lowercase()
            .trim_end_matches("_chart")
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect();
        match normalized.as_str() {
            "bar" => Some(ChartKind::Bar),
            "horizontalbar" | "hbar" => Some(ChartKind::HorizontalBar),
            "pie" => Some(ChartKind::Pie),
            "doughnut" | "donut" => Some(ChartKind::Doughnut),
            "line" => Some(ChartKind::Line),
            "polararea" => Some(ChartKind::PolarArea),
            "bubble" => Some(ChartKind::Bubble),
            "scatter" | "scatterplot" => Some(ChartKind::Scatter),
            "radar" => Some(ChartKind::Radar),
            "table" => Some(ChartKind::Table),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar Chart",
            ChartKind::HorizontalBar => "Horizontal Bar Chart",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Doughnut => "Doughnut Chart",
            ChartKind::Line => "Line Chart",
            ChartKind::PolarArea => "Polar Area Chart",
            ChartKind::Bubble => "Bubble Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Radar => "Radar Chart",
            ChartKind::Table => "Table",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ChartKind::Bar => "📊",
            ChartKind::HorizontalBar => "📊",
            ChartKind::Pie => "🥧",
            ChartKind::Doughnut => "🍩",
            ChartKind::Line => "📈",
            ChartKind::PolarArea => "❄️",
            ChartKind::Bubble => "🔵",
            ChartKind::Scatter => "🎯",
            ChartKind::Radar => "🕸️",
            ChartKind::Table => "📋",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChartKind::Bar => "Compare values across categories",
            ChartKind::HorizontalBar => "Compare many categories without crowding",
            ChartKind::Pie => "Show proportions of a whole",
            ChartKind::Doughnut => "Modern pie chart with center space",
            ChartKind::Line => "Show the values as an ordered sequence",
            ChartKind::PolarArea => "Show categories with weighted importance",
            ChartKind::Bubble => "Visualize three dimensions of data",
            ChartKind::Scatter => "Show relationships between variables",
            ChartKind::Radar => "Compare multiple variables at once",
            ChartKind::Table => "Plain sortable table, no chart",
        }
    }
}

/// The chart-type catalog served by `GET /api/viz/chart-types`.
pub fn catalog() -> Vec<ChartTypeInfo> {
    ChartKind::ALL
        .iter()
        .map(|kind| ChartTypeInfo {
            chart_type: kind.token().to_string(),
            display_name: kind.display_name().to_string(),
            icon: kind.icon().to_string(),
            description: kind.description().to_string(),
        })
        .collect()
}

/// Outcome of a compatibility check. An incompatible result always carries a
/// non-empty reason; `build` fails with the same reason verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Compatibility {
    pub compatible: bool,
    pub reason: Option<String>,
}

impl Compatibility {
    fn ok() -> Self {
        Compatibility {
            compatible: true,
            reason: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Compatibility {
            compatible: false,
            reason: Some(reason),
        }
    }
}

/// Check whether a chart type can render the table.
pub fn validate(kind: ChartKind, table: &AnalyticsTable) -> Compatibility {
    let categories = table.category_count();

    match kind {
        ChartKind::Table => Compatibility::ok(),

        ChartKind::Bubble | ChartKind::Scatter => {
            let needs_radius = kind == ChartKind::Bubble;
            if has_point_fields(table, needs_radius) {
                Compatibility::ok()
            } else {
                Compatibility::rejected(format!(
                    "{} requires explicit numeric x/y fields in every row; this table only has category and value columns",
                    kind.display_name()
                ))
            }
        }

        _ => {
            if detect_value_column(table).is_none() {
                return Compatibility::rejected(
                    "no numeric value column detected in the data".to_string(),
                );
            }
            match kind {
                ChartKind::Pie | ChartKind::Doughnut | ChartKind::PolarArea | ChartKind::Radar
                    if categories > MAX_CIRCULAR_CATEGORIES =>
                {
                    Compatibility::rejected(format!(
                        "too many categories for a readable {} ({} > {})",
                        kind.display_name().to_lowercase(),
                        categories,
                        MAX_CIRCULAR_CATEGORIES
                    ))
                }
                ChartKind::Bar if categories > MAX_VERTICAL_BARS => {
                    Compatibility::rejected(format!(
                        "too many categories for vertical bars ({} > {}); use a horizontal bar chart",
                        categories, MAX_VERTICAL_BARS
                    ))
                }
                _ => Compatibility::ok(),
            }
        }
    }
}

/// Build a Chart.js-style configuration for a compatible chart/table pairing.
///
/// Column names flow through verbatim as series and axis labels: the
/// displayed categories carry domain meaning the user must recognize.
/// Incompatible pairings fail with the exact reason `validate` reports.
pub fn build(kind: ChartKind, table: &AnalyticsTable) -> Result<Value, GatewayError> {
    let compat = validate(kind, table);
    if !compat.compatible {
        return Err(GatewayError::IncompatibleChart {
            chart: kind.token().to_string(),
            reason: compat.reason.unwrap_or_default(),
        });
    }

    match kind {
        ChartKind::Table => Ok(table_config(table)),
        ChartKind::Bubble | ChartKind::Scatter => Ok(point_config(kind, table)),
        _ => Ok(categorical_config(kind, table)),
    }
}

/// Primary recommendation plus the full option list. Every chart type is
/// always listed; incompatible ones are flagged with a reason, never removed.
pub fn recommend(table: &AnalyticsTable) -> (ChartKind, Vec<ChartOption>) {
    let primary = recommend_primary(table);

    let mut options: Vec<ChartOption> = Vec::with_capacity(ChartKind::ALL.len());
    for kind in ChartKind::ALL {
        let compat = validate(kind, table);
        options.push(ChartOption {
            chart_type: kind.token().to_string(),
            display_name: kind.display_name().to_string(),
            icon: kind.icon().to_string(),
            description: kind.description().to_string(),
            compatible: compat.compatible,
            reason: compat.reason,
            recommended: kind == primary,
        });
    }
    // Primary first, rest in vocabulary order.
    options.sort_by_key(|o| !o.recommended);

    (primary, options)
}

/// What to suggest when the user's pick is incompatible.
pub fn suggest_alternative(table: &AnalyticsTable) -> ChartKind {
    if detect_value_column(table).is_none() || table.category_count() > TABLE_ONLY_THRESHOLD {
        ChartKind::Table
    } else {
        ChartKind::HorizontalBar
    }
}

fn recommend_primary(table: &AnalyticsTable) -> ChartKind {
    let categories = table.category_count();
    if detect_value_column(table).is_none() {
        return ChartKind::Table;
    }
    if categories > TABLE_ONLY_THRESHOLD {
        ChartKind::Table
    } else if categories > MAX_CIRCULAR_CATEGORIES {
        ChartKind::HorizontalBar
    } else {
        ChartKind::Bar
    }
}

/// Bubble/scatter eligibility: every row carries numeric `x` and `y` fields
/// (and `r` for bubbles).
fn has_point_fields(table: &AnalyticsTable, needs_radius: bool) -> bool {
    !table.rows.is_empty()
        && table.rows.iter().all(|row| {
            let xy = row.get("x").and_then(cell_number).is_some()
                && row.get("y").and_then(cell_number).is_some();
            if needs_radius {
                xy && row.get("r").and_then(cell_number).is_some()
            } else {
                xy
            }
        })
}

fn categorical_config(kind: ChartKind, table: &AnalyticsTable) -> Value {
    let category = category_column(table);
    // validate() guarantees the value column exists here.
    let value = detect_value_column(table).unwrap_or_default();

    let labels: Vec<String> = table
        .rows
        .iter()
        .map(|row| row.get(&category).map(cell_text).unwrap_or_default())
        .collect();
    let data: Vec<Value> = table
        .rows
        .iter()
        .map(|row| match row.get(&value).and_then(cell_number) {
            Some(n) => json!(n),
            None => Value::Null,
        })
        .collect();

    let chartjs_type = match kind {
        ChartKind::HorizontalBar => "bar",
        other => other.token(),
    };

    let mut options = json!({ "responsive": true });
    if kind == ChartKind::HorizontalBar {
        options["indexAxis"] = json!("y");
    }
    if matches!(kind, ChartKind::Bar | ChartKind::HorizontalBar | ChartKind::Line) {
        let (x_title, y_title) = if kind == ChartKind::HorizontalBar {
            (&value, &category)
        } else {
            (&category, &value)
        };
        options["scales"] = json!({
            "x": { "title": { "display": true, "text": x_title } },
            "y": { "title": { "display": true, "text": y_title } }
        });
    }

    json!({
        "type": chartjs_type,
        "data": {
            "labels": labels,
            "datasets": [{
                "label": value,
                "data": data
            }]
        },
        "options": options
    })
}

fn point_config(kind: ChartKind, table: &AnalyticsTable) -> Value {
    let points: Vec<Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut point = json!({
                "x": row.get("x").and_then(cell_number),
                "y": row.get("y").and_then(cell_number)
            });
            if kind == ChartKind::Bubble {
                point["r"] = json!(row.get("r").and_then(cell_number));
            }
            point
        })
        .collect();

    json!({
        "type": kind.token(),
        "data": {
            "datasets": [{
                "label": "x vs y",
                "data": points
            }]
        },
        "options": { "responsive": true }
    })
}

fn table_config(table: &AnalyticsTable) -> Value {
    let rows: Vec<Vec<Value>> = table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .map(|col| row.get(col).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    json!({
        "type": "table",
        "data": {
            "columns": table.columns,
            "rows": rows
        },
        "options": {}
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn categorical_table(n: usize) -> AnalyticsTable {
        AnalyticsTable {
            columns: vec!["department".into(), "count".into()],
            rows: (0..n)
                .map(|i| {
                    json!({"department": format!("Dept {}", i), "count": i + 1})
                        .as_object()
                        .unwrap()
                        .clone()
                })
                .collect(),
        }
    }

    fn point_table() -> AnalyticsTable {
        AnalyticsTable {
            columns: vec!["x".into(), "y".into(), "r".into()],
            rows: vec![
                json!({"x": 1, "y": 2, "r": 3}).as_object().unwrap().clone(),
                json!({"x": 4, "y": 5, "r": 6}).as_object().unwrap().clone(),
            ],
        }
    }

    #[test]
    fn token_normalization_accepts_backend_spellings() {
        assert_eq!(ChartKind::from_token("bar_chart"), Some(ChartKind::Bar));
        assert_eq!(ChartKind::from_token("doughnut_chart"), Some(ChartKind::Doughnut));
        assert_eq!(ChartKind::from_token("polar_area_chart"), Some(ChartKind::PolarArea));
        assert_eq!(ChartKind::from_token("horizontalBar"), Some(ChartKind::HorizontalBar));
        assert_eq!(ChartKind::from_token("horizontal_bar"), Some(ChartKind::HorizontalBar));
        assert_eq!(ChartKind::from_token("PIE"), Some(ChartKind::Pie));
        assert_eq!(ChartKind::from_token("sparkline"), None);
    }

    #[test]
    fn pie_rejects_forty_categories_but_horizontal_bar_accepts() {
        let table = categorical_table(40);
        let pie = validate(ChartKind::Pie, &table);
        assert!(!pie.compatible);
        let reason = pie.reason.unwrap();
        assert!(reason.contains("40"), "reason should mention category count: {}", reason);

        assert!(validate(ChartKind::HorizontalBar, &table).compatible);
    }

    #[test]
    fn vertical_bar_ceiling_is_thirty() {
        assert!(validate(ChartKind::Bar, &categorical_table(30)).compatible);
        assert!(!validate(ChartKind::Bar, &categorical_table(31)).compatible);
    }

    #[test]
    fn scatter_requires_point_fields() {
        assert!(!validate(ChartKind::Scatter, &categorical_table(5)).compatible);
        assert!(validate(ChartKind::Scatter, &point_table()).compatible);
        assert!(validate(ChartKind::Bubble, &point_table()).compatible);

        // Bubble needs a radius too.
        let mut no_radius = point_table();
        for row in &mut no_radius.rows {
            row.remove("r");
        }
        assert!(validate(ChartKind::Scatter, &no_radius).compatible);
        assert!(!validate(ChartKind::Bubble, &no_radius).compatible);
    }

    #[test]
    fn incompatible_results_always_carry_a_reason() {
        let table = categorical_table(40);
        for kind in ChartKind::ALL {
            let compat = validate(kind, &table);
            if !compat.compatible {
                assert!(
                    compat.reason.as_deref().map_or(false, |r| !r.is_empty()),
                    "{:?} incompatible without a reason",
                    kind
                );
            }
        }
    }

    #[test]
    fn build_fails_with_the_same_reason_validate_reports() {
        let table = categorical_table(40);
        let compat = validate(ChartKind::Pie, &table);
        match build(ChartKind::Pie, &table) {
            Err(GatewayError::IncompatibleChart { chart, reason }) => {
                assert_eq!(chart, "pie");
                assert_eq!(Some(reason), compat.reason);
            }
            other => panic!("expected IncompatibleChart, got {:?}", other),
        }
    }

    #[test]
    fn build_preserves_column_names_as_labels() {
        let table = categorical_table(3);
        let config = build(ChartKind::Bar, &table).unwrap();
        assert_eq!(config["type"], "bar");
        assert_eq!(config["data"]["datasets"][0]["label"], "count");
        assert_eq!(config["data"]["labels"][0], "Dept 0");
        assert_eq!(config["options"]["scales"]["x"]["title"]["text"], "department");

        let horizontal = build(ChartKind::HorizontalBar, &table).unwrap();
        assert_eq!(horizontal["type"], "bar");
        assert_eq!(horizontal["options"]["indexAxis"], "y");
        assert_eq!(horizontal["options"]["scales"]["y"]["title"]["text"], "department");
    }

    #[test]
    fn build_table_config_keeps_declared_column_order() {
        let config = build(ChartKind::Table, &categorical_table(2)).unwrap();
        assert_eq!(config["type"], "table");
        assert_eq!(config["data"]["columns"][0], "department");
        assert_eq!(config["data"]["rows"][0][1], 1);
    }

    #[test]
    fn recommendation_lists_every_type_and_demotes_above_thirty_five() {
        let (primary, options) = recommend(&categorical_table(40));
        assert_eq!(primary, ChartKind::Table);
        assert_eq!(options.len(), ChartKind::ALL.len());
        assert!(options[0].recommended);
        assert_eq!(options[0].chart_type, "table");
        // Charts are demoted, not removed.
        assert!(options.iter().any(|o| o.chart_type == "horizontalBar" && o.compatible));
    }

    #[test]
    fn small_categorical_tables_recommend_bar_and_never_line() {
        let (primary, options) = recommend(&categorical_table(5));
        assert_eq!(primary, ChartKind::Bar);
        let line = options.iter().find(|o| o.chart_type == "line").unwrap();
        assert!(line.compatible && !line.recommended);
    }

    #[test]
    fn mid_cardinality_recommends_horizontal_bar() {
        let (primary, _) = recommend(&categorical_table(20));
        assert_eq!(primary, ChartKind::HorizontalBar);
    }

    #[test]
    fn alternative_suggestion_tracks_cardinality() {
        assert_eq!(suggest_alternative(&categorical_table(20)), ChartKind::HorizontalBar);
        assert_eq!(suggest_alternative(&categorical_table(50)), ChartKind::Table);
    }
}
