use serde_json::Value;

use crate::models::response::{Analysis, AnalysisFact, BackendResponse};
use crate::models::table::AnalyticsTable;
use crate::models::view::{ChartOffer, DashboardView, NarrativeBlock};
use crate::services::{chart, table};

/// Literal delimiter some backend answers use between the data recap and the
/// analysis bullets.
const ANALYSIS_MARKER: &str = "ANALYSIS:";
const DATA_MARKER: &str = "DATA:";

/// Assemble the composite dashboard view for one analytics turn, in fixed
/// vertical order: narrative, key facts, table, chart offer.
///
/// The chart offer is strictly gated on the backend's explicit
/// `visualization_available` flag plus both correlation IDs; a chart is never
/// offered just because the table happens to be chart-eligible.
pub fn compose(response: &BackendResponse, analytics: &AnalyticsTable) -> DashboardView {
    let mut facts = Vec::new();

    let narrative = explicit_narrative(response)
        .or_else(|| synthesize_narrative(response.answer.as_deref(), &mut facts));

    if let Some(analysis) = &response.analysis {
        facts.extend(analysis_facts(analysis));
    }

    let chart_offer = chart_offer(response, analytics);

    DashboardView {
        narrative,
        facts,
        table: table::render(analytics),
        chart_offer,
        prebuilt_chart: response.visualization.clone(),
    }
}

fn explicit_narrative(response: &BackendResponse) -> Option<NarrativeBlock> {
    let narrative = response.narrative.as_ref()?;
    let summary = narrative.summary.clone().unwrap_or_default();
    if summary.is_empty() && narrative.title.is_none() {
        return None;
    }
    Some(NarrativeBlock {
        title: narrative.title.clone(),
        summary,
    })
}

/// Fallback narrative from free text: split the answer on the literal
/// `ANALYSIS:` marker, take the first line of the preceding half as the
/// summary and the analysis half as bullet facts.
fn synthesize_narrative(answer: Option<&str>, facts: &mut Vec<String>) -> Option<NarrativeBlock> {
    let answer = answer?;
    let (data_half, analysis_half) = answer.split_once(ANALYSIS_MARKER)?;

    facts.extend(bullet_lines(analysis_half));

    let summary = data_half
        .replace(DATA_MARKER, "")
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)?;

    Some(NarrativeBlock {
        title: None,
        summary,
    })
}

fn bullet_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(&['-', '*', '•'][..]).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Key facts formatted as `"{label}: {category} with {value} ({percent}%)"`.
fn analysis_facts(analysis: &Analysis) -> Vec<String> {
    let mut facts = Vec::new();
    if let Some(fact) = &analysis.highest {
        if let Some(line) = fact_line("Highest", fact) {
            facts.push(line);
        }
    }
    if let Some(fact) = &analysis.lowest {
        if let Some(line) = fact_line("Lowest", fact) {
            facts.push(line);
        }
    }
    if let Some(percent) = analysis.top_concentration_percent {
        facts.push(format!("Top concentration: {:.1}%", percent));
    }
    facts
}

fn fact_line(label: &str, fact: &AnalysisFact) -> Option<String> {
    let category = fact.category.as_deref()?;
    let mut line = match &fact.value {
        Some(value) => format!("{}: {} with {}", label, category, fact_value(value)),
        None => format!("{}: {}", label, category),
    };
    if let Some(percent) = fact.percent {
        line.push_str(&format!(" ({:.1}%)", percent));
    }
    Some(line)
}

fn fact_value(value: &Value) -> String {
    match crate::models::table::cell_number(value) {
        Some(n) => table::format_number(n),
        None => table::cell_text(value),
    }
}

/// The chart offer requires the backend's explicit opt-in and both
/// correlation IDs; a valid table alone is not enough.
fn chart_offer(response: &BackendResponse, analytics: &AnalyticsTable) -> Option<ChartOffer> {
    if response.visualization_available != Some(true) {
        return None;
    }
    let conversation_id = response.conversation_id.clone()?;
    let turn_id = response.turn_id.clone()?;

    let (primary, options) = chart::recommend(analytics);
    Some(ChartOffer {
        conversation_id,
        turn_id,
        recommended: primary.token().to_string(),
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::{Narrative, ANALYTICS_RESULT};
    use serde_json::json;

    fn dept_table() -> AnalyticsTable {
        AnalyticsTable {
            columns: vec!["dept".into(), "count".into()],
            rows: vec![
                json!({"dept": "Finance", "count": 12}).as_object().unwrap().clone(),
                json!({"dept": "Sales", "count": 30}).as_object().unwrap().clone(),
            ],
        }
    }

    fn analytics_response() -> BackendResponse {
        BackendResponse {
            answer: Some("Headcount by department.".into()),
            message_type: Some(ANALYTICS_RESULT.into()),
            conversation_id: Some("conv-1".into()),
            turn_id: Some("turn-1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn no_chart_offer_without_explicit_opt_in() {
        // Chart-eligible table, but visualization_available is false.
        let mut response = analytics_response();
        response.visualization_available = Some(false);
        let view = compose(&response, &dept_table());
        assert!(view.chart_offer.is_none());
        assert_eq!(view.table.rows.len(), 2);
    }

    #[test]
    fn no_chart_offer_without_correlation_ids() {
        let mut response = analytics_response();
        response.visualization_available = Some(true);
        response.turn_id = None;
        assert!(compose(&response, &dept_table()).chart_offer.is_none());
    }

    #[test]
    fn chart_offer_present_when_flag_and_ids_are_set() {
        let mut response = analytics_response();
        response.visualization_available = Some(true);
        let view = compose(&response, &dept_table());
        let offer = view.chart_offer.expect("offer expected");
        assert_eq!(offer.turn_id, "turn-1");
        assert_eq!(offer.conversation_id, "conv-1");
        assert_eq!(offer.recommended, "bar");
        assert_eq!(offer.options.len(), 10);
    }

    #[test]
    fn explicit_narrative_wins_over_synthesis() {
        let mut response = analytics_response();
        response.narrative = Some(Narrative {
            title: Some("Headcount".into()),
            summary: Some("Sales is the largest department.".into()),
        });
        response.answer = Some("DATA:\nignored\nANALYSIS:\n- also ignored".into());
        let view = compose(&response, &dept_table());
        let narrative = view.narrative.unwrap();
        assert_eq!(narrative.title.as_deref(), Some("Headcount"));
        assert_eq!(narrative.summary, "Sales is the largest department.");
        assert!(view.facts.is_empty());
    }

    #[test]
    fn narrative_synthesized_from_delimited_answer() {
        let mut response = analytics_response();
        response.answer = Some(
            "DATA:\n42 employees across 2 departments\n\nANALYSIS:\n- Sales dominates\n- Finance is small\n".into(),
        );
        let view = compose(&response, &dept_table());
        let narrative = view.narrative.unwrap();
        assert_eq!(narrative.summary, "42 employees across 2 departments");
        assert_eq!(view.facts, vec!["Sales dominates", "Finance is small"]);
    }

    #[test]
    fn key_facts_formatted_from_analysis_block() {
        let mut response = analytics_response();
        response.analysis = Some(Analysis {
            highest: Some(AnalysisFact {
                category: Some("Sales".into()),
                value: Some(json!(30)),
                percent: Some(71.4),
            }),
            lowest: Some(AnalysisFact {
                category: Some("Finance".into()),
                value: Some(json!(12)),
                percent: None,
            }),
            top_concentration_percent: Some(71.4),
        });
        let view = compose(&response, &dept_table());
        assert_eq!(
            view.facts,
            vec![
                "Highest: Sales with 30 (71.4%)",
                "Lowest: Finance with 12",
                "Top concentration: 71.4%"
            ]
        );
    }

    #[test]
    fn prebuilt_visualization_passes_through_untouched() {
        let mut response = analytics_response();
        let config = json!({"type": "bar", "data": {"labels": ["a"]}});
        response.visualization = Some(config.clone());
        let view = compose(&response, &dept_table());
        assert_eq!(view.prebuilt_chart, Some(config));
    }
}
