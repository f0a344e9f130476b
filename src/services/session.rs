use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use uuid::Uuid;

use crate::models::session::{SessionRecord, SessionSummary};
use crate::models::view::RenderedTurn;

const TITLE_MAX_CHARS: usize = 60;

/// In-memory session store keyed by session id.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SessionRecord>>> {
        self.sessions
            .lock()
            .map_err(|_| anyhow!("Failed to acquire lock on sessions"))
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl super::SessionStoreTrait for MemorySessionStore {
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let sessions = self.lock()?;
        let mut summaries: Vec<SessionSummary> =
            sessions.values().map(SessionRecord::summary).collect();
        // Pinned sessions first, most recently updated next.
        summaries.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(summaries)
    }

    async fn get_history(&self, id: &str) -> Result<Option<SessionRecord>> {
        let sessions = self.lock()?;
        Ok(sessions.get(id).cloned())
    }

    async fn toggle_pin(&self, id: &str) -> Result<Option<bool>> {
        let mut sessions = self.lock()?;
        Ok(sessions.get_mut(id).map(|record| {
            record.pinned = !record.pinned;
            record.pinned
        }))
    }

    async fn delete_session(&self, id: &str) -> Result<bool> {
        let mut sessions = self.lock()?;
        Ok(sessions.remove(id).is_some())
    }

    async fn append_turn(
        &self,
        session_id: Option<&str>,
        question: &str,
        turn: RenderedTurn,
    ) -> Result<String> {
        let mut sessions = self.lock()?;
        let id = match session_id {
            Some(id) if sessions.contains_key(id) => id.to_string(),
            _ => {
                let id = Uuid::new_v4().to_string();
                let title: String = question.chars().take(TITLE_MAX_CHARS).collect();
                sessions.insert(id.clone(), SessionRecord::new(id.clone(), title));
                id
            }
        };

        if let Some(record) = sessions.get_mut(&id) {
            record.add_turn(question.to_string(), turn);
        }
        Ok(id)
    }
}
