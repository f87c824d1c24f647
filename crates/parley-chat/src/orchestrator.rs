//! Message orchestration: the single entry point that turns a user message
//! into a persisted exchange with the backend

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use parley_ai::{
    Backend, ChunkSink, Error as AiError, InboundResponse, ProfileRouter, StreamReader,
};

use crate::cache::HandleCache;
use crate::conversation::{Turn, TurnFile};
use crate::error::Result;
use crate::mapper;
use crate::prompt::{self, PromptInput};
use crate::publish::ChunkPublisher;
use crate::store::ConversationStore;

/// Per-call overrides for a send. The default sends on the service's
/// default profile with no extra rule text.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Profile key to send on instead of the service default
    pub profile_key: Option<String>,
    /// Rule text appended to the system section of the prompt
    pub rules: Option<String>,
}

/// Adapts the conversation-scoped publisher to the reader's sink contract
struct PublishSink<'a> {
    publisher: &'a dyn ChunkPublisher,
    conversation_id: i64,
}

#[async_trait::async_trait]
impl ChunkSink for PublishSink<'_> {
    async fn emit(&mut self, delta: &str) {
        self.publisher.publish(self.conversation_id, delta).await;
    }
}

/// Coordinates a full message exchange: assemble the prompt, resolve the
/// profile, persist the user turn, call the backend, persist the reply,
/// and advance the continuation handle.
pub struct ChatService {
    router: ProfileRouter,
    backend: Arc<dyn Backend>,
    store: Arc<dyn ConversationStore>,
    publisher: Arc<dyn ChunkPublisher>,
    cache: HandleCache,
    default_profile: String,
}

impl ChatService {
    pub fn new(
        router: ProfileRouter,
        backend: Arc<dyn Backend>,
        store: Arc<dyn ConversationStore>,
        publisher: Arc<dyn ChunkPublisher>,
        default_profile: impl Into<String>,
    ) -> Self {
        let cache = HandleCache::new(store.clone());
        Self {
            router,
            backend,
            store,
            publisher,
            cache,
            default_profile: default_profile.into(),
        }
    }

    /// Send a user message on the default profile with default options
    pub async fn send_turn(
        &self,
        conversation_id: i64,
        text: impl Into<String>,
        files: Vec<TurnFile>,
    ) -> Result<Turn> {
        self.send_turn_with(
            conversation_id,
            text,
            files,
            &SendOptions::default(),
            None,
            CancellationToken::new(),
        )
        .await
    }

    /// Send a user message with explicit options, an optional per-call
    /// chunk sink, and a cancellation token. When `sink` is absent,
    /// streamed chunks go to the service's publisher under the
    /// conversation's topic.
    ///
    /// The user turn is persisted before the backend call, so a failed call
    /// leaves the user's message durable with no reply and an unchanged
    /// continuation handle. The reply turn and the new handle are recorded
    /// only after the backend produces a complete response.
    pub async fn send_turn_with(
        &self,
        conversation_id: i64,
        text: impl Into<String>,
        files: Vec<TurnFile>,
        options: &SendOptions,
        sink: Option<&mut dyn ChunkSink>,
        cancel: CancellationToken,
    ) -> Result<Turn> {
        let previous_handle = self.cache.get(conversation_id).await?;

        let user_turn = Turn::user(conversation_id, text, files);
        let input = prompt::assemble(
            &PromptInput::Message(user_turn.clone()),
            options.rules.as_deref(),
            &user_turn.files,
        );

        let profile_key = options
            .profile_key
            .as_deref()
            .unwrap_or(&self.default_profile);
        let profile = self.router.resolve(profile_key)?;

        let request = mapper::to_request(input, profile, previous_handle.as_deref());

        let user_turn = self.store.append_turn(user_turn).await?;
        tracing::debug!(
            conversation_id,
            turn_id = %user_turn.id,
            profile = profile_key,
            continuation = previous_handle.is_some(),
            "sending turn"
        );

        let response: InboundResponse = if profile.streaming {
            let mut fallback = PublishSink {
                publisher: self.publisher.as_ref(),
                conversation_id,
            };
            let sink: &mut dyn ChunkSink = match sink {
                Some(sink) => sink,
                None => &mut fallback,
            };
            let mut reader = StreamReader::new();
            // Neither the client nor the reader carries a deadline of its
            // own; the profile's timeout bounds the whole streaming call,
            // connect phase included. The connect await also observes the
            // cancellation token, which the reader re-checks per frame.
            let drive = async {
                let transport = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(AiError::Cancelled),
                    transport = self.backend.open_stream(&request, profile) => transport?,
                };
                reader.read_to_end(transport, Some(sink), &cancel).await
            };
            tokio::time::timeout(profile.timeout(), drive)
                .await
                .map_err(|_| AiError::Timeout {
                    limit_secs: profile.timeout_secs,
                })??
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AiError::Cancelled.into()),
                response = self.backend.send(&request, profile) => response?,
            }
        };

        let reply = mapper::to_turn(&response, conversation_id)?;
        let reply = self.store.append_turn(reply).await?;
        self.cache.set(conversation_id, &response.id).await?;

        tracing::debug!(
            conversation_id,
            response_id = %response.id,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total_tokens,
            "turn completed"
        );

        Ok(reply)
    }

    /// Continuation handle currently associated with a conversation
    pub async fn continuation_handle(&self, conversation_id: i64) -> Result<Option<String>> {
        self.cache.get(conversation_id).await
    }

    pub fn router(&self) -> &ProfileRouter {
        &self.router
    }
}
