//! Conversation Controller - owns the message history for one open session
//! and runs the answer pipeline once per user turn.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{ConversationMessage, Sender};
use crate::engine::AssistantEngine;

pub struct ChatSession {
    engine: Arc<AssistantEngine>,
    session_id: Uuid,
    messages: Mutex<Vec<ConversationMessage>>,
    next_id: AtomicU64,
    composing: AtomicBool,
    open: AtomicBool,
}

impl ChatSession {
    pub fn new(engine: Arc<AssistantEngine>) -> Self {
        Self {
            engine,
            session_id: Uuid::new_v4(),
            messages: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            composing: AtomicBool::new(false),
            open: AtomicBool::new(false),
        }
    }

    /// A session that opens with the assistant's greeting already present,
    /// the way the chat window shows itself to a first-time visitor.
    pub fn with_greeting(engine: Arc<AssistantEngine>) -> Self {
        let session = Self::new(engine);
        let name = session.engine.record().personal.name.clone();
        session.append(
            Sender::Assistant,
            &format!(
                "Hi! I'm {}'s assistant. Ask me about their skills, projects, or experience!",
                name
            ),
        );
        session
    }

    /// Handle one user turn. No-op (returns false) for blank input or while
    /// a turn is already in flight; otherwise appends the user message, runs
    /// the pipeline, and appends exactly one assistant message.
    pub async fn send_message(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            tracing::debug!(session = %self.session_id, "Ignoring blank input");
            return false;
        }

        // At most one in-flight turn per session; a concurrent send is
        // dropped, not queued
        if self
            .composing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(session = %self.session_id, "Turn already in flight, ignoring input");
            return false;
        }

        self.append(Sender::User, trimmed);
        let reply = self.engine.answer(trimmed).await;
        self.append(Sender::Assistant, &reply);

        self.composing.store(false, Ordering::SeqCst);
        true
    }

    /// Read-only, insertion-ordered view of the history.
    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.messages.lock().clone()
    }

    /// True while the assistant is composing a reply.
    pub fn is_composing(&self) -> bool {
        self.composing.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Widget visibility, independent of the turn state machine.
    pub fn toggle_open(&self) {
        self.open.fetch_xor(true, Ordering::SeqCst);
    }

    fn append(&self, sender: Sender, text: &str) {
        let message = ConversationMessage {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            text: text.to_string(),
            sender,
            created_at: Utc::now(),
        };
        self.messages.lock().push(message);
    }
}
