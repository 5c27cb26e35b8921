//! Conversational code assistance over an [`LlmProvider`]

use crate::config::Config;
use crate::llm::prompts::{ASSISTANT_PERSONA, CONNECTIVITY_PROBE};
use crate::llm::{
    GenerationConfig, LlmError, LlmProvider, LlmProviderFactory, LlmStream, Message,
    PromptContext, PromptTemplate, PromptTemplates,
};
use crate::session::{ConversationTurn, Session, SessionHandle};
use crate::utils::errors::CodepadError;
use crate::utils::http::SharedHttpConfig;
use crate::utils::text::strip_code_fence;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Stored turns replayed into each chat prompt by default
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Reply to a blocking chat call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    /// Full history after the exchange was committed
    pub history: Vec<ConversationTurn>,
}

/// One event of a streamed chat reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Next fragment of the reply
    Delta { text: String },
    /// Terminal marker; the exchange has been committed
    Done { response: String },
}

/// Streamed chat reply, ending with [`ChatEvent::Done`] or an error
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<ChatEvent, CodepadError>> + Send>>;

/// Builds prompts, drives the provider and commits completed exchanges
pub struct Assistant {
    provider: Arc<dyn LlmProvider>,
    generation: GenerationConfig,
    history_window: usize,
    timeout: Duration,
}

impl Assistant {
    pub fn new(provider: Arc<dyn LlmProvider>, generation: GenerationConfig) -> Self {
        Self {
            provider,
            generation,
            history_window: DEFAULT_HISTORY_WINDOW,
            timeout: Duration::from_secs(60),
        }
    }

    /// Assistant for the provider selected by the configuration
    pub fn from_config(config: &Config) -> Result<Self, CodepadError> {
        let provider: Arc<dyn LlmProvider> = Arc::from(LlmProviderFactory::from_config(config)?);
        let budget = SharedHttpConfig::from(&config.http).call_budget();

        Ok(Self::new(provider, config.generation_config())
            .with_history_window(config.session.history_window)
            .with_timeout(budget))
    }

    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    /// Bound on a whole provider call, retries included
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model(&self) -> &str {
        &self.generation.model
    }

    /// Persona, recent history, optional current file, then the new message
    fn build_prompt(&self, session: &Session, message: &str, include_context: bool) -> Vec<Message> {
        let mut messages = vec![Message::system(ASSISTANT_PERSONA)];
        messages.extend_from_slice(session.conversation.recent(self.history_window));

        if include_context {
            let current = session
                .current_file
                .as_ref()
                .and_then(|id| session.workspace.get_file(id));
            if let Some(file) = current {
                messages.push(Message::system(PromptTemplates::current_file_block(
                    &file.extension,
                    &file.content,
                )));
            }
        }

        messages.push(Message::user(message));
        messages
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, LlmError>
    where
        F: Future<Output = Result<T, LlmError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    /// Blocking chat turn; the exchange is committed only on success
    pub async fn chat(
        &self,
        session: &SessionHandle,
        message: &str,
        include_context: bool,
    ) -> Result<ChatReply, CodepadError> {
        require("message", message)?;

        let messages = {
            let session = session.lock().await;
            self.build_prompt(&session, message, include_context)
        };

        tracing::debug!(
            "Chat request to {} with {} message(s)",
            self.provider.provider_name(),
            messages.len()
        );
        let response = self
            .bounded(self.provider.generate(&messages, &self.generation))
            .await
            .map_err(|e| {
                tracing::warn!("Chat failed ({}): {}", e.kind(), e);
                e
            })?;

        let mut session = session.lock().await;
        session.conversation.commit_exchange(message, response.clone());
        Ok(ChatReply {
            response,
            history: session.conversation.turns().to_vec(),
        })
    }

    /// Streaming chat turn.
    ///
    /// Failures before the first fragment are returned directly. The exchange
    /// is committed when the provider signals completion; a stream that fails
    /// or is dropped earlier leaves the history untouched.
    pub async fn chat_stream(
        &self,
        session: SessionHandle,
        message: &str,
        include_context: bool,
    ) -> Result<ChatEventStream, CodepadError> {
        require("message", message)?;

        let messages = {
            let session = session.lock().await;
            self.build_prompt(&session, message, include_context)
        };

        let inner = self
            .bounded(self.provider.generate_stream(&messages, &self.generation))
            .await?;

        Ok(commit_on_completion(inner, session, message.to_string()))
    }

    async fn one_shot(
        &self,
        template: PromptTemplate,
        context: PromptContext,
    ) -> Result<String, CodepadError> {
        let messages = template
            .to_messages(&context)
            .map_err(CodepadError::unknown)?;
        Ok(self
            .bounded(self.provider.generate(&messages, &self.generation))
            .await?)
    }

    /// Write code from a description; one surrounding code fence is removed
    pub async fn generate_code(
        &self,
        description: &str,
        language: &str,
    ) -> Result<String, CodepadError> {
        require("description", description)?;
        let context = PromptContext::new()
            .with_variable("language", language)
            .with_variable("description", description);
        let text = self
            .one_shot(PromptTemplates::code_generation(), context)
            .await?;
        Ok(strip_code_fence(&text))
    }

    pub async fn explain_code(&self, code: &str, language: &str) -> Result<String, CodepadError> {
        require("code", code)?;
        let context = PromptContext::new()
            .with_variable("language", language)
            .with_variable("code", code);
        self.one_shot(PromptTemplates::code_explanation(), context)
            .await
    }

    pub async fn debug_code(&self, code: &str, language: &str) -> Result<String, CodepadError> {
        require("code", code)?;
        let context = PromptContext::new()
            .with_variable("language", language)
            .with_variable("code", code);
        self.one_shot(PromptTemplates::code_debugging(), context)
            .await
    }

    /// Minimal completion used to verify the provider is reachable
    pub async fn check_connectivity(&self) -> Result<String, CodepadError> {
        let config = GenerationConfig {
            max_tokens: Some(10),
            ..self.generation.clone()
        };
        let messages = [Message::user(CONNECTIVITY_PROBE)];
        Ok(self
            .bounded(self.provider.generate(&messages, &config))
            .await?)
    }
}

fn require(field: &str, value: &str) -> Result<(), CodepadError> {
    if value.trim().is_empty() {
        return Err(CodepadError::validation(field, "must not be empty"));
    }
    Ok(())
}

struct CommitState {
    inner: LlmStream,
    session: SessionHandle,
    message: String,
    response: String,
    finish_pending: bool,
    finished: bool,
}

impl CommitState {
    async fn commit(&mut self) -> ChatEvent {
        self.finished = true;
        let response = std::mem::take(&mut self.response);
        self.session
            .lock()
            .await
            .conversation
            .commit_exchange(std::mem::take(&mut self.message), response.clone());
        ChatEvent::Done { response }
    }
}

/// Relay provider chunks as chat events and commit the exchange on the final
/// chunk
fn commit_on_completion(inner: LlmStream, session: SessionHandle, message: String) -> ChatEventStream {
    let state = CommitState {
        inner,
        session,
        message,
        response: String::new(),
        finish_pending: false,
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }
        if state.finish_pending {
            let done = state.commit().await;
            return Some((Ok(done), state));
        }

        loop {
            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    let text = chunk.content.filter(|c| !c.is_empty());
                    let is_final = chunk.finish_reason.is_some();

                    if let Some(text) = text {
                        state.response.push_str(&text);
                        state.finish_pending = is_final;
                        return Some((Ok(ChatEvent::Delta { text }), state));
                    }
                    if is_final {
                        let done = state.commit().await;
                        return Some((Ok(done), state));
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!("Chat stream failed ({}): {}", e.kind(), e);
                    state.finished = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.finished = true;
                    let error = LlmError::InvalidResponse {
                        message: "Stream ended without completion marker".to_string(),
                    };
                    return Some((Err(error.into()), state));
                }
            }
        }
    }))
}
