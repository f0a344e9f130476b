use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of an active table sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// How cell values in the sort column are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Compare by the first digit run embedded in the text ("Band 10" > "Band 2").
    EmbeddedNumber,
    /// Compare by the full numeric value of the cell.
    Numeric,
    /// Case-insensitive lexicographic comparison.
    Lexicographic,
}

/// The active sort of a rendered table. Reproducible: the same table always
/// infers the same state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
    pub mode: SortMode,
}

/// Computed total of the detected value column.
///
/// `Unavailable` is deliberately distinct from a zero sum: a table with no
/// numeric column shows "N/A", never "0".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum TableTotal {
    Sum(f64),
    Unavailable,
}

impl TableTotal {
    pub fn display(&self) -> String {
        match self {
            TableTotal::Sum(v) => crate::services::table::format_number(*v),
            TableTotal::Unavailable => "N/A".to_string(),
        }
    }
}

/// Sortable-table view model: headers, formatted cells in display order, the
/// active sort and the computed total. Pure data; painting is the client's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedTable {
    pub columns: Vec<String>,
    /// Formatted cell text, row-major, in display order.
    pub rows: Vec<Vec<String>>,
    pub sort: SortState,
    pub total: TableTotal,
    /// Preformatted total for the footer row ("N/A" when unavailable).
    pub total_display: String,
    /// Column the total was computed from, when one was detected.
    pub value_column: Option<String>,
}

/// Narrative/insight block at the top of a dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub summary: String,
}

/// One selectable chart type in an offer or catalog listing.
///
/// Incompatible types are flagged with a reason but never removed from the
/// list; the recommendation is metadata, not a filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOption {
    pub chart_type: String,
    pub display_name: String,
    pub icon: String,
    pub description: String,
    pub compatible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub recommended: bool,
}

/// Chart offer attached to a dashboard turn. Only present when the backend
/// explicitly opted in via `visualization_available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOffer {
    pub conversation_id: String,
    pub turn_id: String,
    pub recommended: String,
    pub options: Vec<ChartOption>,
}

/// Composite dashboard view for one analytics turn, in fixed vertical order:
/// narrative, key facts, table, chart offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<NarrativeBlock>,
    pub facts: Vec<String>,
    pub table: RenderedTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_offer: Option<ChartOffer>,
    /// Legacy self-contained chart config, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prebuilt_chart: Option<Value>,
}

/// The on-screen artifact for one bot message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedTurn {
    Text { answer: String },
    Dashboard { view: Box<DashboardView> },
    Error { message: String },
    Unauthorized { message: String },
}

/// One entry of the chart-type catalog (`GET /api/viz/chart-types`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartTypeInfo {
    pub chart_type: String,
    pub display_name: String,
    pub icon: String,
    pub description: String,
}
