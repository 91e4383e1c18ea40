//! Narrator chat use cases.

use std::sync::Arc;

use emberhall_domain::{ChatTurn, Persona, WorldCatalog};

use crate::infrastructure::ports::{ChatHistoryRepo, LlmError, RepoError};
use crate::use_cases::map::MapError;

mod directives;
mod narrator_chat;

pub use directives::{extract_move_directives, ParsedReply};
pub use narrator_chat::{ChatReply, NarratorChat};

/// Turns of history sent to the narrator and returned to the client.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("Narrator unavailable: {0}")]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Container for chat use cases.
pub struct ChatUseCases {
    pub chat: Arc<NarratorChat>,
    pub history: Arc<ChatHistoryOps>,
}

impl ChatUseCases {
    pub fn new(chat: Arc<NarratorChat>, history: Arc<ChatHistoryOps>) -> Self {
        Self { chat, history }
    }
}

/// Reading and clearing stored conversations.
pub struct ChatHistoryOps {
    history: Arc<dyn ChatHistoryRepo>,
    catalog: Arc<WorldCatalog>,
}

impl ChatHistoryOps {
    pub fn new(history: Arc<dyn ChatHistoryRepo>, catalog: Arc<WorldCatalog>) -> Self {
        Self { history, catalog }
    }

    /// Returns the resolved persona name and its turns, oldest first.
    pub async fn history(
        &self,
        username: &str,
        persona: Option<&str>,
    ) -> Result<(String, Vec<ChatTurn>), ChatError> {
        let persona = self.catalog.persona(persona);
        let turns = self
            .history
            .recent(username, &persona.name, HISTORY_LIMIT)
            .await?;
        Ok((persona.name, turns))
    }

    pub async fn clear(&self, username: &str, persona: Option<&str>) -> Result<String, ChatError> {
        let persona = self.catalog.persona(persona);
        self.history.clear(username, &persona.name).await?;
        tracing::info!(username, persona = %persona.name, "Chat history cleared");
        Ok(persona.name)
    }

    /// Configured personas, or the built-in narrator when none are.
    pub fn personas(&self) -> Vec<Persona> {
        if self.catalog.personas.is_empty() {
            vec![Persona::default_narrator()]
        } else {
            self.catalog.personas.clone()
        }
    }
}
