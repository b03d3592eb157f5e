//! folio-chat - the embedded assistant behind a personal portfolio site.
//!
//! A two-stage answer pipeline: context retrieval over an immutable
//! biography record (keyword groups plus fuzzy search), then text
//! generation through a configured local or remote backend, validated by a
//! sanitizer and backed by a deterministic keyword fallback that always
//! produces an on-topic answer. The enclosing application drives a
//! [`ChatSession`] and renders its message list.

pub mod biography;
pub mod chat;
pub mod config;
pub mod engine;
pub mod fallback;
pub mod llm;
pub mod prompt;
pub mod retrieval;
pub mod sanitize;
pub mod search;
pub mod topics;

// Re-export the primary surface for convenience
pub use biography::{BiographyRecord, BiographyStore};
pub use chat::{ChatSession, ConversationMessage, Sender};
pub use config::{AssistantConfig, GenerationParams};
pub use engine::AssistantEngine;
pub use llm::{BackendMode, GenerateError, TextGenerator};

// Re-export common types
pub use anyhow::{Error, Result};
pub use uuid::Uuid;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// End-to-end: a fresh fallback-only session answers an education
    /// question with the canned education paragraph and nothing else.
    #[tokio::test]
    async fn fallback_only_session_answers_education_question() {
        let store = BiographyStore::load(None);
        let config = AssistantConfig::default();
        let engine = Arc::new(AssistantEngine::new(store, &config));
        let session = ChatSession::new(engine);

        assert!(session.send_message("What did you study in school?").await);

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert!(messages[1].text.contains("educational background"));
    }

    #[tokio::test]
    async fn whitespace_input_leaves_session_untouched() {
        let store = BiographyStore::load(None);
        let engine = Arc::new(AssistantEngine::new(store, &AssistantConfig::default()));
        let session = ChatSession::new(engine);

        assert!(!session.send_message("   ").await);
        assert!(session.messages().is_empty());
        assert!(!session.is_composing());
    }
}
