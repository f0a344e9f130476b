use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::view::RenderedTurn;

/// One question/answer exchange stored in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTurn {
    pub question: String,
    pub turn: RenderedTurn,
    pub timestamp: DateTime<Utc>,
}

/// Listing entry for `GET /sessions/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub pinned: bool,
    pub turn_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Full stored session: summary fields plus the turn history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub title: String,
    pub pinned: bool,
    pub turns: Vec<SessionTurn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            pinned: false,
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_turn(&mut self, question: String, turn: RenderedTurn) {
        self.turns.push(SessionTurn {
            question,
            turn,
            timestamp: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            pinned: self.pinned,
            turn_count: self.turns.len(),
            updated_at: self.updated_at,
        }
    }
}
