//! Room use cases that go beyond a single store call.

use std::sync::Arc;

use emberhall_domain::{MessageType, RoomId, RoomMessage, WorldCatalog, NARRATOR_SENDER};

use crate::infrastructure::ports::{ChatMessage, ClockPort, LlmPort, LlmRequest};
use crate::stores::{RoomError, RoomManager};

const EMPTY_REPLY: &str = "The narrator acknowledges the interaction with a nod.";

/// Container for room use cases.
pub struct RoomUseCases {
    pub open: Arc<OpenRoom>,
    pub narrator: Arc<NarratorReply>,
}

impl RoomUseCases {
    pub fn new(open: Arc<OpenRoom>, narrator: Arc<NarratorReply>) -> Self {
        Self { open, narrator }
    }
}

/// Create a room and seat its host.
pub struct OpenRoom {
    rooms: Arc<RoomManager>,
    clock: Arc<dyn ClockPort>,
}

impl OpenRoom {
    pub fn new(rooms: Arc<RoomManager>, clock: Arc<dyn ClockPort>) -> Self {
        Self { rooms, clock }
    }

    pub async fn execute(&self, host: &str, session_token: &str) -> Result<RoomId, RoomError> {
        let room_id = self
            .rooms
            .create_with_host(host, session_token, self.clock.now())
            .await?;
        Ok(room_id)
    }
}

/// Post a narrator response to an interaction into the room.
pub struct NarratorReply {
    rooms: Arc<RoomManager>,
    llm: Arc<dyn LlmPort>,
    catalog: Arc<WorldCatalog>,
    clock: Arc<dyn ClockPort>,
}

impl NarratorReply {
    pub fn new(
        rooms: Arc<RoomManager>,
        llm: Arc<dyn LlmPort>,
        catalog: Arc<WorldCatalog>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            rooms,
            llm,
            catalog,
            clock,
        }
    }

    /// The LLM failing never fails the call; a fallback line is posted instead.
    pub async fn execute(
        &self,
        room_id: &RoomId,
        interaction: &str,
    ) -> Result<RoomMessage, RoomError> {
        let interaction = interaction.trim();
        if interaction.is_empty() {
            return Err(RoomError::EmptyContent);
        }
        if self.rooms.get(room_id).await.is_none() {
            return Err(RoomError::RoomNotFound(room_id.clone()));
        }

        let persona = self.catalog.persona(None);
        let request = LlmRequest::new(vec![ChatMessage::user(interaction)])
            .with_system_prompt(persona.system_prompt);

        let content = match self.llm.generate(request).await {
            Ok(reply) if reply.content.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(reply) => reply.content.trim().to_string(),
            Err(e) => {
                tracing::error!(room_id = %room_id, error = %e, "Narrator room reply failed");
                format!("The narrator notes the interaction: {interaction}")
            }
        };

        self.rooms
            .send_message(
                room_id,
                NARRATOR_SENDER,
                &content,
                MessageType::Global,
                None,
                self.clock.now(),
            )
            .await
    }
}
