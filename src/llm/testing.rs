//! Scripted provider for exercising the assistant without a network

use super::{GenerationConfig, LlmError, LlmProvider, LlmStream, Message, StreamChunk};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Drain a provider stream into its full text; the final chunk is required
pub async fn collect_stream(mut stream: LlmStream) -> Result<String, LlmError> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if let Some(content) = &chunk.content {
            text.push_str(content);
        }
        if chunk.is_final() {
            return Ok(text);
        }
    }
    Err(LlmError::InvalidResponse {
        message: "Stream ended without completion marker".to_string(),
    })
}

/// One scripted reaction to a provider call
pub enum Script {
    Reply(String),
    Fail(LlmError),
    Stream(Vec<Result<StreamChunk, LlmError>>),
    /// Never answers within any reasonable timeout
    Hang,
}

/// Provider that replays scripted outcomes in order and records every prompt
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, script: Script) -> &Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    pub fn reply(text: &str) -> Self {
        let provider = Self::new();
        provider.push(Script::Reply(text.to_string()));
        provider
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Messages sent on the most recent call
    pub fn last_prompt(&self) -> Vec<Message> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn next(&self, messages: &[Message]) -> Script {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Fail(LlmError::Unknown {
                message: "script exhausted".to_string(),
            }))
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        messages: &[Message],
        _config: &GenerationConfig,
    ) -> Result<String, LlmError> {
        match self.next(messages) {
            Script::Reply(text) => Ok(text),
            Script::Fail(error) => Err(error),
            Script::Stream(_) => panic!("stream scripted for a blocking call"),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        _config: &GenerationConfig,
    ) -> Result<LlmStream, LlmError> {
        match self.next(messages) {
            Script::Stream(chunks) => Ok(Box::pin(stream::iter(chunks))),
            Script::Reply(text) => Ok(Box::pin(stream::iter(vec![
                Ok(StreamChunk::content(text)),
                Ok(StreamChunk::finish("stop")),
            ]))),
            Script::Fail(error) => Err(error),
            Script::Hang => Ok(Box::pin(stream::pending())),
        }
    }
}
