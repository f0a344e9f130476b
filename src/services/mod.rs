pub mod backend;
pub mod chart;
pub mod classifier;
pub mod dashboard;
pub mod extractor;
pub mod selection;
pub mod session;
pub mod table;

use anyhow::Result;

use crate::models::session::{SessionRecord, SessionSummary};
use crate::models::view::RenderedTurn;

/// Conversation persistence collaborator. The gateway only needs list,
/// history, pin, delete and append; anything richer lives behind this seam.
#[async_trait::async_trait]
pub trait SessionStoreTrait: Send + Sync + 'static {
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;
    async fn get_history(&self, id: &str) -> Result<Option<SessionRecord>>;
    /// Flip the pinned flag; returns the new state, or None for an unknown id.
    async fn toggle_pin(&self, id: &str) -> Result<Option<bool>>;
    async fn delete_session(&self, id: &str) -> Result<bool>;
    /// Append a turn, creating the session when the id is absent or unknown.
    /// Returns the session id the turn landed in.
    async fn append_turn(
        &self,
        session_id: Option<&str>,
        question: &str,
        turn: RenderedTurn,
    ) -> Result<String>;
}

pub use backend::BackendClient;
pub use selection::SelectionStore;
pub use session::MemorySessionStore;
