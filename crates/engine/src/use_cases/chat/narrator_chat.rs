//! Narrator chat use case.
//!
//! One conversation per (player, persona). The narrator sees the player's
//! current location and may move them with a `MOVE_TO:` directive.

use std::sync::Arc;

use emberhall_domain::{ChatRole, ChatTurn, WorldCatalog};

use super::directives::extract_move_directives;
use super::{ChatError, HISTORY_LIMIT};
use crate::infrastructure::ports::{ChatHistoryRepo, ChatMessage, ClockPort, LlmPort, LlmRequest};
use crate::use_cases::map::{LocationView, MapOps};

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub persona: String,
    pub moved_to: Option<String>,
}

pub struct NarratorChat {
    history: Arc<dyn ChatHistoryRepo>,
    map: Arc<MapOps>,
    llm: Arc<dyn LlmPort>,
    catalog: Arc<WorldCatalog>,
    clock: Arc<dyn ClockPort>,
}

impl NarratorChat {
    pub fn new(
        history: Arc<dyn ChatHistoryRepo>,
        map: Arc<MapOps>,
        llm: Arc<dyn LlmPort>,
        catalog: Arc<WorldCatalog>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            history,
            map,
            llm,
            catalog,
            clock,
        }
    }

    /// Send a message, or with `regenerate` replace the last narrator reply.
    ///
    /// Regenerate only applies when the newest stored turn is a reply;
    /// otherwise the call is a normal chat turn.
    pub async fn execute(
        &self,
        username: &str,
        message: &str,
        persona: Option<&str>,
        regenerate: bool,
    ) -> Result<ChatReply, ChatError> {
        let persona = self.catalog.persona(persona);
        let mut turns = self
            .history
            .recent(username, &persona.name, HISTORY_LIMIT)
            .await?;

        let regenerating = regenerate
            && turns.len() >= 2
            && turns.last().map(|t| t.role) == Some(ChatRole::Assistant);

        let message = message.trim();
        if regenerating {
            turns.pop();
        } else if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut messages: Vec<ChatMessage> = turns
            .iter()
            .map(|turn| match turn.role {
                ChatRole::User => ChatMessage::user(&turn.content),
                ChatRole::Assistant => ChatMessage::assistant(&turn.content),
            })
            .collect();
        if !regenerating {
            messages.push(ChatMessage::user(message));
        }

        let location = self.map.current_location(username).await?;
        let request = LlmRequest::new(messages)
            .with_system_prompt(system_prompt(&persona.system_prompt, &location));

        let reply = self.llm.generate(request).await.map_err(|e| {
            tracing::error!(username, persona = %persona.name, error = %e, "Narrator request failed");
            e
        })?;

        let parsed = extract_move_directives(&reply.content);
        let mut response = parsed.text;
        let mut moved_to = None;
        if let Some(target) = parsed.move_targets.first() {
            match self.map.move_to(username, target).await {
                Ok(view) => {
                    if let Some(notice) = &view.location.arrival_notice {
                        response.push_str(&format!("\n\n[Encounter] {notice}"));
                    }
                    moved_to = Some(view.location.location_id);
                }
                Err(e) => {
                    tracing::warn!(username, target = %target, error = %e, "Ignoring narrator move");
                }
            }
        }

        let now = self.clock.now();
        if regenerating {
            self.history
                .delete_last_assistant(username, &persona.name)
                .await?;
        } else {
            self.history
                .append(
                    username,
                    &persona.name,
                    &ChatTurn {
                        role: ChatRole::User,
                        content: message.to_string(),
                        timestamp: now,
                    },
                )
                .await?;
        }
        self.history
            .append(
                username,
                &persona.name,
                &ChatTurn {
                    role: ChatRole::Assistant,
                    content: response.clone(),
                    timestamp: now,
                },
            )
            .await?;

        tracing::debug!(
            username,
            persona = %persona.name,
            regenerated = regenerating,
            moved_to = ?moved_to,
            "Narrator replied"
        );
        Ok(ChatReply {
            response,
            persona: persona.name,
            moved_to,
        })
    }
}

fn system_prompt(persona_prompt: &str, location: &LocationView) -> String {
    let area = location
        .area
        .as_ref()
        .map(|a| a.display_name.as_str())
        .unwrap_or(location.location.area_id.as_str());
    format!(
        "{persona_prompt}\n\n[Current state] The player is in {area}, at {}: {}",
        location.location.display_name, location.location.description
    )
}
