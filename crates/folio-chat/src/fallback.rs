//! Fallback Responder - deterministic keyword-to-canned-answer mapping.
//! Total function: whenever generation is unavailable, slow, or invalid,
//! this is the answer of record.

use std::sync::Arc;

use crate::topics::TopicTable;

pub struct FallbackResponder {
    topics: Arc<TopicTable>,
}

impl FallbackResponder {
    pub fn new(topics: Arc<TopicTable>) -> Self {
        Self { topics }
    }

    /// Always returns non-empty text: the first matching topic's canned
    /// paragraph, or the default paragraph describing available topics.
    pub fn respond(&self, question: &str) -> String {
        let question_lower = question.to_lowercase();
        match self.topics.first_match(&question_lower) {
            Some(topic) => {
                tracing::debug!(topic = ?topic.key, "Fallback topic matched");
                topic.canned.clone()
            }
            None => self.topics.default_answer().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biography::BiographyStore;
    use crate::topics::TopicKey;

    fn responder() -> (FallbackResponder, Arc<TopicTable>) {
        let store = BiographyStore::load(None);
        let topics = Arc::new(TopicTable::from_record(store.record()));
        (FallbackResponder::new(Arc::clone(&topics)), topics)
    }

    #[test]
    fn education_question_returns_education_paragraph() {
        let (responder, topics) = responder();
        let expected = &topics
            .topics()
            .iter()
            .find(|t| t.key == TopicKey::Education)
            .unwrap()
            .canned;
        assert_eq!(&responder.respond("Where did you go to college?"), expected);
        assert_eq!(&responder.respond("do you have a degree"), expected);
    }

    #[test]
    fn unmatched_question_returns_default_paragraph() {
        let (responder, topics) = responder();
        assert_eq!(responder.respond("xyzzy plugh"), topics.default_answer());
    }

    #[test]
    fn always_returns_nonempty_text() {
        let (responder, _) = responder();
        for q in ["", "?!", "skills", "completely unrelated text", "工作"] {
            assert!(!responder.respond(q).is_empty(), "empty answer for {:?}", q);
        }
    }

    #[test]
    fn repeated_calls_are_idempotent() {
        let (responder, _) = responder();
        assert_eq!(responder.respond("skills?"), responder.respond("skills?"));
    }

    #[test]
    fn keyword_groups_match_retriever_groups() {
        // Both components consult the same table; this pins the contract
        // that their keyword groups can never drift apart.
        let (_, topics) = responder();
        let fallback_groups: Vec<_> = topics
            .topics()
            .iter()
            .filter(|t| t.detail.is_some())
            .map(|t| t.keywords.clone())
            .collect();
        let retriever_groups: Vec<_> =
            topics.context_topics().map(|t| t.keywords.clone()).collect();
        assert_eq!(fallback_groups, retriever_groups);
    }
}
