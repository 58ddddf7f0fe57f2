use agora_llm::{ChatClient, ChatOptions, ChatRequest, Message, StreamEvent};
use agora_persist::{ChatMessage, ChatSession, MessageRole, PersistenceClient, TopicCatalog};
use agora_types::{ParticipantIdentity, TurnEvent};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::EngineConfig;
use crate::dispatch::{ProfileDispatch, ProfileJob};
use crate::error::{EngineError, Result};
use crate::markers::parse_reply;
use crate::prompts::{self, is_start_signal};
use crate::trigger;

/// Where a session stands in the deliberation protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// Nothing exchanged yet
    NotStarted,
    /// Intro delivered, no participant message yet
    Intro,
    Deliberating,
}

impl ConversationPhase {
    pub fn of(messages: &[ChatMessage]) -> Self {
        let participant = messages
            .iter()
            .any(|m| m.role == MessageRole::User && !is_start_signal(&m.content));
        if participant {
            Self::Deliberating
        } else if messages.iter().any(|m| m.role == MessageRole::Assistant) {
            Self::Intro
        } else {
            Self::NotStarted
        }
    }
}

/// Result of one conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub session_id: String,
    /// Reply as persisted, markers included
    pub reply: String,
    pub clean_text: String,
    pub content_ids: Vec<String>,
    pub message_count: u64,
    pub messages_until_next_update: u64,
    pub profile_update_dispatched: bool,
}

impl TurnOutcome {
    fn new(session_id: String, reply: String, message_count: u64, dispatched: bool) -> Self {
        let parsed = parse_reply(&reply);
        Self {
            session_id,
            reply,
            clean_text: parsed.clean_text,
            content_ids: parsed.content_ids,
            message_count,
            messages_until_next_update: trigger::messages_until_next_update(message_count),
            profile_update_dispatched: dispatched,
        }
    }

    pub fn into_done_event(self) -> TurnEvent {
        TurnEvent::Done {
            session_id: self.session_id,
            reply: self.reply,
            message_count: self.message_count,
            messages_until_next_update: self.messages_until_next_update,
            profile_update_dispatched: self.profile_update_dispatched,
        }
    }
}

/// Drives one deliberation turn: persistence, instructions, streamed reply
/// and the profile cadence check.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn PersistenceClient>,
    catalog: Arc<dyn TopicCatalog>,
    chat: Arc<dyn ChatClient>,
    dispatcher: Arc<dyn ProfileDispatch>,
    config: Arc<EngineConfig>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn PersistenceClient>,
        catalog: Arc<dyn TopicCatalog>,
        chat: Arc<dyn ChatClient>,
        dispatcher: Arc<dyn ProfileDispatch>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            catalog,
            chat,
            dispatcher,
            config,
        }
    }

    /// Send a message and collect the whole reply
    pub async fn send_message(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
        text: &str,
    ) -> Result<TurnOutcome> {
        self.run_turn(topic_id, identity, text, None).await
    }

    /// Spawn a turn in the background, return the event receiver.
    /// The receiver always ends with a `Done` or an `Error` event.
    pub fn spawn_turn(
        &self,
        topic_id: String,
        identity: ParticipantIdentity,
        text: String,
    ) -> mpsc::Receiver<TurnEvent> {
        let (tx, rx) = mpsc::channel(1000);
        let orchestrator = self.clone();

        tokio::spawn(async move {
            let event = match orchestrator
                .run_turn(&topic_id, &identity, &text, Some(&tx))
                .await
            {
                Ok(outcome) => outcome.into_done_event(),
                Err(e) => {
                    tracing::error!(topic_id = %topic_id, participant = %identity, "Turn failed: {}", e);
                    TurnEvent::Error {
                        message: e.to_string(),
                    }
                }
            };
            if tx.send(event).await.is_err() {
                tracing::warn!(topic_id = %topic_id, "Turn finished after the client disconnected");
            }
        });

        rx
    }

    /// Current phase of the participant's session on a topic
    pub async fn phase(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<ConversationPhase> {
        match self.store.find_session(topic_id, identity).await? {
            Some(session) => {
                let messages = self.store.get_messages(&session.id).await?;
                Ok(ConversationPhase::of(&messages))
            }
            None => Ok(ConversationPhase::NotStarted),
        }
    }

    /// One full turn.
    ///
    /// The participant message is durably appended before generation starts,
    /// so a failed or timed-out reply can be retried without duplicating it.
    pub async fn run_turn(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
        text: &str,
        events: Option<&mpsc::Sender<TurnEvent>>,
    ) -> Result<TurnOutcome> {
        let start = is_start_signal(text);
        if !start && text.trim().is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        let topic = self
            .catalog
            .get_topic(topic_id)
            .await?
            .ok_or_else(|| EngineError::TopicNotFound(topic_id.to_string()))?;

        let session = self.store.get_or_create_session(&topic.id, identity).await?;
        let mut history = self.store.get_messages(&session.id).await?;
        let phase = ConversationPhase::of(&history);

        if start && phase != ConversationPhase::NotStarted {
            return self.replay_last_reply(&session, &history).await;
        }

        let mut message_count = 0;
        if !start {
            let message = self
                .store
                .append_message(&session.id, MessageRole::User, text)
                .await?;
            history.push(message);
            message_count = self.store.count_participant_messages(&session.id).await?;
        }

        let prompt_phase = if start {
            ConversationPhase::NotStarted
        } else {
            ConversationPhase::of(&history)
        };
        let artifacts = self.catalog.list_artifacts(&topic.id).await?;
        let instructions = prompts::moderator_instructions(
            &topic,
            &artifacts,
            prompt_phase,
            &self.config.response_language,
        );

        let request = self.build_request(instructions, &history);
        let reply = match self.generate_reply(request, events).await {
            Ok(reply) => self
                .store
                .append_message(&session.id, MessageRole::Assistant, &reply)
                .await
                .map(|_| reply)
                .map_err(EngineError::from),
            Err(e) => Err(e),
        };

        let dispatched = !start && self.check_trigger(&session, message_count);
        let reply = reply?;

        tracing::info!(
            session_id = %session.id,
            topic_id = %topic.id,
            message_count,
            intro = start,
            "Turn completed"
        );

        Ok(TurnOutcome::new(session.id, reply, message_count, dispatched))
    }

    /// A repeated start signal on a running conversation changes nothing
    async fn replay_last_reply(
        &self,
        session: &ChatSession,
        history: &[ChatMessage],
    ) -> Result<TurnOutcome> {
        let reply = history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let message_count = self.store.count_participant_messages(&session.id).await?;
        Ok(TurnOutcome::new(session.id.clone(), reply, message_count, false))
    }

    fn build_request(&self, instructions: String, history: &[ChatMessage]) -> ChatRequest {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(instructions));
        for message in history.iter().filter(|m| !is_start_signal(&m.content)) {
            messages.push(match message.role {
                MessageRole::User => Message::human(message.content.as_str()),
                MessageRole::Assistant => Message::ai(message.content.as_str()),
            });
        }
        // The intro turn has no participant message to answer
        if !messages.iter().any(|m| matches!(m, Message::Human { .. })) {
            messages.push(Message::human(prompts::START_SIGNAL));
        }

        let mut options = ChatOptions::new();
        if let Some(temp) = self.config.temperature {
            options = options.temperature(temp);
        }
        ChatRequest::new(&self.config.chat_model, messages).with_options(options)
    }

    /// Stream the reply under the turn's wall-clock budget
    async fn generate_reply(
        &self,
        request: ChatRequest,
        events: Option<&mpsc::Sender<TurnEvent>>,
    ) -> Result<String> {
        let budget = self.config.turn_timeout;

        let work = async {
            let mut stream = self.chat.chat_stream(request).await?;
            let mut reply = String::new();

            while let Some(event) = stream.next().await {
                match event? {
                    StreamEvent::Message { content } => {
                        reply.push_str(&content);
                        if let Some(tx) = events {
                            // A gone receiver must not abort persistence
                            let _ = tx.send(TurnEvent::Delta { content }).await;
                        }
                    }
                    StreamEvent::Done { .. } => break,
                }
            }

            if reply.trim().is_empty() {
                return Err(EngineError::Generation(anyhow::anyhow!(
                    "Model returned an empty reply"
                )));
            }
            Ok::<String, EngineError>(reply)
        };

        match tokio::time::timeout(budget, work).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(budget)),
        }
    }

    fn check_trigger(&self, session: &ChatSession, message_count: u64) -> bool {
        if !trigger::should_generate(message_count) {
            return false;
        }
        self.dispatcher.dispatch(ProfileJob {
            session_id: session.id.clone(),
            topic_id: session.topic_id.clone(),
            message_count,
        })
    }
}
