//! Prompt templates for the code assistant

use super::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// System persona used for every conversational turn
pub const ASSISTANT_PERSONA: &str = "You are a helpful coding assistant embedded in a lightweight online code editor. \
Answer questions about code clearly and concisely, show code in fenced blocks with a language tag, \
and when the user shares a file, ground your answer in that file.";

/// Minimal prompt used to check provider connectivity
pub const CONNECTIVITY_PROBE: &str = "Say 'test successful' if you can read this";

/// Template for one system + user exchange
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub system_message: String,
    pub user_template: String,
    pub variables: Vec<String>,
}

/// Context for filling prompt templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptContext {
    pub variables: HashMap<String, String>,
}

impl PromptContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn set_variable<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.variables.insert(key.into(), value.into());
    }

    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }
}

impl PromptTemplate {
    /// Fill the template with context variables
    pub fn fill(&self, context: &PromptContext) -> Result<(String, String), String> {
        if let Some(missing) = self
            .variables
            .iter()
            .find(|v| !context.variables.contains_key(*v))
        {
            return Err(format!("Missing required variable: {}", missing));
        }

        let mut system_message = self.system_message.clone();
        let mut user_message = self.user_template.clone();

        // Only declared variables are substituted, in declaration order
        for variable in &self.variables {
            let placeholder = format!("{{{{{}}}}}", variable);
            if let Some(value) = context.variables.get(variable) {
                system_message = system_message.replace(&placeholder, value);
                user_message = user_message.replace(&placeholder, value);
            }
        }

        Ok((system_message, user_message))
    }

    /// Fill the template and return it as a system + user message pair
    pub fn to_messages(&self, context: &PromptContext) -> Result<Vec<Message>, String> {
        let (system, user) = self.fill(context)?;
        Ok(vec![Message::system(system), Message::user(user)])
    }
}

/// Collection of predefined prompt templates
pub struct PromptTemplates;

impl PromptTemplates {
    /// Template for writing new code from a description
    pub fn code_generation() -> PromptTemplate {
        PromptTemplate {
            system_message: "You are an expert {{language}} programmer. Write clean, idiomatic, working code. \
Respond with the code only, without commentary."
                .to_string(),
            user_template: "Write {{language}} code for the following task:\n\n{{description}}".to_string(),
            variables: vec!["language".to_string(), "description".to_string()],
        }
    }

    /// Template for explaining existing code
    pub fn code_explanation() -> PromptTemplate {
        PromptTemplate {
            system_message: "You are an expert {{language}} programmer and a patient teacher. \
Explain what the code does step by step, and point out anything surprising."
                .to_string(),
            user_template: "Explain this {{language}} code:\n\n```{{language}}\n{{code}}\n```".to_string(),
            variables: vec!["language".to_string(), "code".to_string()],
        }
    }

    /// Template for finding and fixing bugs
    pub fn code_debugging() -> PromptTemplate {
        PromptTemplate {
            system_message: "You are an expert {{language}} debugger. Identify bugs, explain their cause, \
and provide a corrected version of the code."
                .to_string(),
            user_template: "Find and fix the bugs in this {{language}} code:\n\n```{{language}}\n{{code}}\n```"
                .to_string(),
            variables: vec!["language".to_string(), "code".to_string()],
        }
    }

    /// Fenced block carrying the current file into a chat prompt
    pub fn current_file_block(extension: &str, content: &str) -> String {
        format!("Current file:\n```{}\n{}\n```", extension, content)
    }

    /// Get all available template names
    pub fn list_templates() -> Vec<&'static str> {
        vec!["code_generation", "code_explanation", "code_debugging"]
    }

    /// Get a template by name
    pub fn get_template(name: &str) -> Option<PromptTemplate> {
        match name {
            "code_generation" => Some(Self::code_generation()),
            "code_explanation" => Some(Self::code_explanation()),
            "code_debugging" => Some(Self::code_debugging()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    #[test]
    fn test_prompt_context_creation() {
        let context = PromptContext::new()
            .with_variable("name", "test")
            .with_variable("value", "123");

        assert_eq!(context.get_variable("name"), Some(&"test".to_string()));
        assert_eq!(context.get_variable("value"), Some(&"123".to_string()));
        assert_eq!(context.get_variable("missing"), None);
    }

    #[test]
    fn test_template_filling() {
        let context = PromptContext::new()
            .with_variable("language", "python")
            .with_variable("description", "reverse a string");

        let (system, user) = PromptTemplates::code_generation().fill(&context).unwrap();
        assert!(system.contains("expert python programmer"));
        assert!(user.ends_with("reverse a string"));
    }

    #[test]
    fn test_braces_in_values_are_kept() {
        let context = PromptContext::new()
            .with_variable("language", "javascript")
            .with_variable("code", "function f() { return {{a}}; }");

        let (_, user) = PromptTemplates::code_explanation().fill(&context).unwrap();
        assert!(user.contains("function f() { return {{a}}; }"));
    }

    #[test]
    fn test_missing_variable_error() {
        let context = PromptContext::new().with_variable("language", "sql");
        let result = PromptTemplates::code_debugging().fill(&context);
        assert!(result.unwrap_err().contains("code"));
    }

    #[test]
    fn test_to_messages_builds_pair() {
        let context = PromptContext::new()
            .with_variable("language", "rust")
            .with_variable("code", "fn main() {}");
        let messages = PromptTemplates::code_debugging().to_messages(&context).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
    }

    #[test]
    fn test_template_retrieval() {
        for name in PromptTemplates::list_templates() {
            assert!(PromptTemplates::get_template(name).is_some());
        }
        assert!(PromptTemplates::get_template("nonexistent").is_none());
    }

    #[test]
    fn test_current_file_block() {
        let block = PromptTemplates::current_file_block("py", "print(1)");
        assert_eq!(block, "Current file:\n```py\nprint(1)\n```");
    }
}
