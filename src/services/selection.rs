use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::table::AnalyticsTable;
use crate::services::chart::ChartKind;

/// Step of the per-turn chart-selection flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SelectionStep {
    Offered,
    Selected { chart: ChartKind },
    Rendered { chart: ChartKind },
    Cancelled,
}

/// User/client events driving the selection flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    Select(ChartKind),
    RenderComplete,
    ChangeType,
    Cancel,
}

/// Side effects the client must perform, in order. Disposing the previous
/// chart instance before building a new one is a correctness invariant, not
/// an optimization: a canvas may hold at most one live chart instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionEffect {
    DisposeChart,
    BuildChart(ChartKind),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid chart-selection event {event:?} in step {step:?}")]
pub struct InvalidTransition {
    pub step: SelectionStep,
    pub event: SelectionEvent,
}

/// Failure modes of [`SelectionStore::advance`].
#[derive(Debug, Error)]
pub enum AdvanceError {
    #[error("no live chart selection for turn {0}")]
    NoSelection(String),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    #[error("failed to acquire lock on chart selections")]
    Lock,
}

/// Pure transition function for the selection state machine:
/// `Offered → Selected → Rendered`, back to `Offered` via "change type", or
/// out via `Cancelled`. Transition logic stays unit-testable independent of
/// any HTTP handler or click handler.
pub fn step(
    state: SelectionStep,
    event: SelectionEvent,
) -> Result<(SelectionStep, Vec<SelectionEffect>), InvalidTransition> {
    use SelectionEffect::*;
    use SelectionEvent::*;
    use SelectionStep::*;

    match (state, event) {
        (Offered, Select(chart)) => Ok((Selected { chart }, vec![BuildChart(chart)])),
        (Selected { .. }, Select(chart)) => {
            Ok((Selected { chart }, vec![DisposeChart, BuildChart(chart)]))
        }
        // Re-selecting from a rendered chart disposes the old instance first.
        (Rendered { .. }, Select(chart)) => {
            Ok((Selected { chart }, vec![DisposeChart, BuildChart(chart)]))
        }
        (Selected { chart }, RenderComplete) => Ok((Rendered { chart }, vec![])),
        (Selected { .. }, ChangeType) => Ok((Offered, vec![])),
        (Rendered { .. }, ChangeType) => Ok((Offered, vec![DisposeChart])),
        (Offered, Cancel) | (Selected { .. }, Cancel) => Ok((Cancelled, vec![])),
        (Rendered { .. }, Cancel) => Ok((Cancelled, vec![DisposeChart])),
        (state, event) => Err(InvalidTransition { step: state, event }),
    }
}

/// Ephemeral per-turn selection state: the data snapshot the turn rendered,
/// whether a chart was actually offered, and the machine step. At most one
/// live selection per turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSelection {
    pub turn_id: String,
    pub conversation_id: String,
    #[serde(flatten)]
    pub step: SelectionStep,
    /// False for turns stored only so their table can be re-sorted; the
    /// chart-flow events refuse such turns.
    pub chart_offered: bool,
    pub table: AnalyticsTable,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ChartSelection {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Turn-keyed in-memory store for chart selections.
///
/// Entries expire after a TTL and are invalidated when a newer turn of the
/// same conversation arrives, so the map cannot grow unboundedly over a long
/// session.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    selections: Arc<Mutex<HashMap<String, ChartSelection>>>,
    ttl: Duration,
}

impl SelectionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            selections: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Register a fresh chart offer for a turn, superseding any previous
    /// selection state for older turns of the same conversation.
    pub fn offer(
        &self,
        turn_id: &str,
        conversation_id: &str,
        table: AnalyticsTable,
    ) -> Result<()> {
        self.insert(turn_id, conversation_id, table, true)
    }

    /// Store a turn's table snapshot without a chart offer, so the table can
    /// still be re-sorted later. Chart-flow events refuse such turns.
    pub fn remember(
        &self,
        turn_id: &str,
        conversation_id: &str,
        table: AnalyticsTable,
    ) -> Result<()> {
        self.insert(turn_id, conversation_id, table, false)
    }

    fn insert(
        &self,
        turn_id: &str,
        conversation_id: &str,
        table: AnalyticsTable,
        chart_offered: bool,
    ) -> Result<()> {
        let mut selections = self.lock()?;
        selections.retain(|_, sel| {
            !(sel.conversation_id == conversation_id && sel.turn_id != turn_id)
        });

        let now = Utc::now();
        selections.insert(
            turn_id.to_string(),
            ChartSelection {
                turn_id: turn_id.to_string(),
                conversation_id: conversation_id.to_string(),
                step: SelectionStep::Offered,
                chart_offered,
                table,
                created_at: now,
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    /// Look up the live selection for a turn. Expired entries are removed on
    /// read and reported as absent.
    pub fn get(&self, turn_id: &str) -> Result<Option<ChartSelection>> {
        let mut selections = self.lock()?;
        if let Some(selection) = selections.get(turn_id) {
            if selection.is_expired() {
                selections.remove(turn_id);
                return Ok(None);
            }
            return Ok(Some(selection.clone()));
        }
        Ok(None)
    }

    /// Run one state-machine event for a turn atomically: the lookup, the
    /// transition and the write-back happen under a single lock, so two
    /// concurrent events can never both compute effects from the same step.
    pub fn advance(
        &self,
        turn_id: &str,
        event: SelectionEvent,
    ) -> Result<(SelectionStep, Vec<SelectionEffect>), AdvanceError> {
        let mut selections = self.selections.lock().map_err(|_| AdvanceError::Lock)?;
        if selections
            .get(turn_id)
            .map_or(false, |sel| sel.is_expired())
        {
            selections.remove(turn_id);
        }
        let selection = selections
            .get_mut(turn_id)
            .filter(|sel| sel.chart_offered)
            .ok_or_else(|| AdvanceError::NoSelection(turn_id.to_string()))?;

        let (next, effects) = step(selection.step, event)?;
        selection.step = next;
        Ok((next, effects))
    }

    pub fn remove(&self, turn_id: &str) -> Result<bool> {
        let mut selections = self.lock()?;
        Ok(selections.remove(turn_id).is_some())
    }

    /// Drop every expired entry; returns how many were removed. Driven
    /// periodically from the background sweeper in `main`.
    pub fn sweep_expired(&self) -> Result<usize> {
        let mut selections = self.lock()?;
        let before = selections.len();
        selections.retain(|_, sel| !sel.is_expired());
        let removed = before - selections.len();
        if removed > 0 {
            info!("Swept {} expired chart selection(s)", removed);
        }
        Ok(removed)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, ChartSelection>>> {
        self.selections
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock on chart selections"))
    }
}
