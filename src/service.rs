//! Session-scoped operations offered to a transport layer

use crate::assistant::{Assistant, ChatEventStream, ChatReply};
use crate::config::Config;
use crate::language::{language_for_extension, Diagnostic, LanguageRegistry};
use crate::llm::LlmError;
use crate::session::{ConversationTurn, SessionHandle, SessionId, SessionStore};
use crate::utils::errors::CodepadError;
use crate::workspace::{FileId, FileSummary, ROOT_FOLDER};
use crate::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of adding a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCreated {
    pub id: FileId,
    pub name: String,
}

/// A stored file with its language and current diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileView {
    pub id: FileId,
    pub name: String,
    pub content: String,
    pub extension: String,
    pub language: String,
    pub diagnostics: Vec<Diagnostic>,
    pub modified_at: DateTime<Utc>,
}

/// The code workspace service
pub struct Codepad {
    sessions: SessionStore,
    languages: Arc<LanguageRegistry>,
    assistant: Option<Assistant>,
    provider_name: String,
}

impl Codepad {
    /// Service with the built-in languages and an optional assistant
    pub fn new(sessions: SessionStore, assistant: Option<Assistant>) -> Self {
        let provider_name = assistant
            .as_ref()
            .map(|a| a.provider_name().to_string())
            .unwrap_or_default();
        Self {
            sessions,
            languages: Arc::new(LanguageRegistry::with_defaults()),
            assistant,
            provider_name,
        }
    }

    /// Build the service from configuration.
    ///
    /// A missing API key is not fatal: the workspace stays usable and AI
    /// operations report the missing credential.
    pub fn from_config(config: &Config) -> Result<Self> {
        let sessions = SessionStore::new(config.session.ttl());
        let assistant = match Assistant::from_config(config) {
            Ok(assistant) => Some(assistant),
            Err(CodepadError::Llm(LlmError::MissingCredential { provider })) => {
                tracing::warn!("No API key for provider {}, AI features disabled", provider);
                None
            }
            Err(e) => return Err(e),
        };

        let mut codepad = Self::new(sessions, assistant);
        codepad.provider_name = config.active_provider.clone();
        Ok(codepad)
    }

    pub fn with_languages(mut self, languages: LanguageRegistry) -> Self {
        self.languages = Arc::new(languages);
        self
    }

    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    fn assistant(&self) -> Result<&Assistant> {
        self.assistant.as_ref().ok_or_else(|| {
            LlmError::MissingCredential {
                provider: self.provider_name.clone(),
            }
            .into()
        })
    }

    async fn session(&self, id: &SessionId) -> Result<SessionHandle> {
        self.sessions.get(id).await
    }

    pub async fn create_session(&self) -> SessionId {
        self.sessions.create().await
    }

    pub async fn close_session(&self, id: &SessionId) -> Result<()> {
        self.sessions.close(id).await
    }

    pub async fn list_folders(&self, id: &SessionId) -> Result<IndexMap<String, Vec<FileSummary>>> {
        let handle = self.session(id).await?;
        let session = handle.lock().await;
        Ok(session.workspace.folders())
    }

    pub async fn add_file(
        &self,
        id: &SessionId,
        filename: &str,
        content: Option<&str>,
        folder: Option<&str>,
    ) -> Result<FileCreated> {
        if filename.trim().is_empty() {
            return Err(CodepadError::validation("filename", "must not be empty"));
        }
        if folder.is_some_and(|f| f.trim().is_empty()) {
            return Err(CodepadError::validation("folder", "must not be empty"));
        }

        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        let file_id = session
            .workspace
            .add_file(filename, content.unwrap_or_default(), folder);

        Ok(FileCreated {
            id: file_id,
            name: filename.to_string(),
        })
    }

    /// Create a folder; `false` when it already exists
    pub async fn add_folder(&self, id: &SessionId, folder: &str) -> Result<bool> {
        if folder.trim().is_empty() {
            return Err(CodepadError::validation("folder", "must not be empty"));
        }
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        Ok(session.workspace.add_folder(folder))
    }

    pub async fn get_file(&self, id: &SessionId, file_id: &FileId) -> Result<FileView> {
        let handle = self.session(id).await?;
        let session = handle.lock().await;
        let entry = session
            .workspace
            .get_file(file_id)
            .ok_or_else(|| CodepadError::not_found(format!("file {}", file_id)))?;

        let language = language_for_extension(&entry.extension);
        Ok(FileView {
            id: entry.id.clone(),
            name: entry.name.clone(),
            content: entry.content.clone(),
            extension: entry.extension.clone(),
            language: language.to_string(),
            diagnostics: self.languages.analyze(&entry.content, language),
            modified_at: entry.modified_at,
        })
    }

    /// Replace a file's content and return its new diagnostics
    pub async fn update_file(
        &self,
        id: &SessionId,
        file_id: &FileId,
        content: &str,
    ) -> Result<Vec<Diagnostic>> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        if !session.workspace.update_file(file_id, content) {
            return Err(CodepadError::not_found(format!("file {}", file_id)));
        }

        let extension = session
            .workspace
            .get_file(file_id)
            .map(|entry| entry.extension.clone())
            .unwrap_or_default();
        Ok(self
            .languages
            .analyze(content, language_for_extension(&extension)))
    }

    pub async fn delete_file(&self, id: &SessionId, file_id: &FileId) -> Result<()> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        if !session.delete_file(file_id) {
            return Err(CodepadError::not_found(format!("file {}", file_id)));
        }
        Ok(())
    }

    /// Delete a folder and its files; the root folder is never deleted
    pub async fn delete_folder(&self, id: &SessionId, folder: &str) -> Result<()> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        if folder == ROOT_FOLDER {
            return Err(CodepadError::not_found("root folder cannot be deleted"));
        }
        if !session.delete_folder(folder) {
            return Err(CodepadError::not_found(format!("folder {}", folder)));
        }
        Ok(())
    }

    pub async fn set_current_file(&self, id: &SessionId, file_id: &FileId) -> Result<()> {
        let handle = self.session(id).await?;
        let mut session = handle.lock().await;
        session.set_current_file(file_id)
    }

    /// Reformat source; formatter problems return the input unchanged
    pub async fn format(&self, id: &SessionId, content: &str, language: &str) -> Result<String> {
        self.session(id).await?;
        Ok(self.languages.format(content, language).await)
    }

    pub async fn check_syntax(
        &self,
        id: &SessionId,
        content: &str,
        language: &str,
    ) -> Result<Vec<Diagnostic>> {
        self.session(id).await?;
        Ok(self.languages.analyze(content, language))
    }

    pub async fn chat(
        &self,
        id: &SessionId,
        message: &str,
        include_context: bool,
    ) -> Result<ChatReply> {
        let handle = self.session(id).await?;
        self.assistant()?.chat(&handle, message, include_context).await
    }

    pub async fn chat_stream(
        &self,
        id: &SessionId,
        message: &str,
        include_context: bool,
    ) -> Result<ChatEventStream> {
        let handle = self.session(id).await?;
        self.assistant()?
            .chat_stream(handle, message, include_context)
            .await
    }

    pub async fn generate(&self, id: &SessionId, description: &str, language: &str) -> Result<String> {
        self.session(id).await?;
        self.assistant()?.generate_code(description, language).await
    }

    pub async fn explain(&self, id: &SessionId, code: &str, language: &str) -> Result<String> {
        self.session(id).await?;
        self.assistant()?.explain_code(code, language).await
    }

    pub async fn debug(&self, id: &SessionId, code: &str, language: &str) -> Result<String> {
        self.session(id).await?;
        self.assistant()?.debug_code(code, language).await
    }

    pub async fn get_conversation(&self, id: &SessionId) -> Result<Vec<ConversationTurn>> {
        let handle = self.session(id).await?;
        let session = handle.lock().await;
        Ok(session.conversation.turns().to_vec())
    }

    pub async fn clear_conversation(&self, id: &SessionId) -> Result<()> {
        let handle = self.session(id).await?;
        handle.lock().await.conversation.clear();
        Ok(())
    }

    /// Send the connectivity probe through the configured provider
    pub async fn check_connectivity(&self) -> Result<String> {
        self.assistant()?.check_connectivity().await
    }
}
