//! Context Retriever - turns a free-text question into a bounded, relevant
//! slice of the biography for the generation prompt.

use std::sync::Arc;

use crate::biography::BiographyRecord;
use crate::search::{fuzzy_search, SearchableItem};
use crate::topics::TopicTable;

/// Upper bound on fuzzy-stage matches appended to the context.
const FUZZY_RESULT_CAP: usize = 3;

/// Pure function of (record, topic table, index, question). Shares the
/// read-only inputs with the rest of the engine.
pub struct ContextRetriever {
    record: Arc<BiographyRecord>,
    topics: Arc<TopicTable>,
    index: Arc<Vec<SearchableItem>>,
}

impl ContextRetriever {
    pub fn new(
        record: Arc<BiographyRecord>,
        topics: Arc<TopicTable>,
        index: Arc<Vec<SearchableItem>>,
    ) -> Self {
        Self { record, topics, index }
    }

    /// Assemble the context for one question. Always starts with the fixed
    /// personal header so every generation attempt has minimal grounding;
    /// keyword-stage blocks follow in table declaration order, then up to
    /// three fuzzy matches.
    pub fn retrieve(&self, question: &str) -> String {
        let question_lower = question.to_lowercase();
        let mut context = self.header_block();

        let mut fired = 0usize;
        for topic in self.topics.context_topics() {
            if topic.matches(&question_lower) {
                if let Some(detail) = &topic.detail {
                    context.push('\n');
                    context.push_str(detail);
                    fired += 1;
                }
            }
        }

        let matches = fuzzy_search(&self.index, &question_lower, FUZZY_RESULT_CAP);
        for m in &matches {
            context.push('\n');
            context.push_str(&m.item.format_block(&self.record));
        }

        tracing::debug!(
            keyword_blocks = fired,
            fuzzy_blocks = matches.len(),
            context_len = context.len(),
            "Context assembled"
        );
        context
    }

    /// Fixed header of basic personal facts, present in every context.
    fn header_block(&self) -> String {
        let p = &self.record.personal;
        let mut header = format!("About {}", p.name);
        if !p.nickname.is_empty() {
            header.push_str(&format!(" ({})", p.nickname));
        }
        header.push_str(":\n");
        header.push_str(&format!("- Full name: {}\n", p.name));
        if !p.nickname.is_empty() {
            header.push_str(&format!("- Nickname: {}\n", p.nickname));
        }
        header.push_str(&format!("- Current role: {}\n", p.title));
        if !p.location.is_empty() {
            header.push_str(&format!("- Location: {}\n", p.location));
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biography::BiographyStore;
    use crate::search::build_index;

    fn retriever() -> ContextRetriever {
        let store = BiographyStore::load(None);
        let record = Arc::new(store.record().clone());
        let topics = Arc::new(TopicTable::from_record(&record));
        let index = Arc::new(build_index(&record));
        ContextRetriever::new(record, topics, index)
    }

    #[test]
    fn header_present_for_any_question() {
        let r = retriever();
        for q in ["what did you study", "asdf qwerty", "projects?"] {
            let context = r.retrieve(q);
            assert!(context.contains("Full name:"), "missing header for {:?}", q);
            assert!(context.contains("Current role:"));
        }
    }

    #[test]
    fn education_question_includes_education_block() {
        let r = retriever();
        let context = r.retrieve("What did you study in school?");
        assert!(context.contains("EDUCATION:"));
    }

    #[test]
    fn multiple_groups_fire_together() {
        let r = retriever();
        let context = r.retrieve("Tell me about your skills and education");
        assert!(context.contains("SKILLS:"));
        assert!(context.contains("EDUCATION:"));
        // Keyword stage order is table declaration order
        let edu = context.find("EDUCATION:").unwrap();
        let skills = context.find("SKILLS:").unwrap();
        assert!(edu < skills);
    }

    #[test]
    fn retrieval_is_idempotent() {
        let r = retriever();
        let a = r.retrieve("where did you go to college");
        let b = r.retrieve("where did you go to college");
        assert_eq!(a, b);
    }

    #[test]
    fn unmatched_question_still_gets_grounding() {
        let r = retriever();
        let context = r.retrieve("zzz nothing matches this zzz");
        assert!(context.starts_with("About "));
    }

    #[test]
    fn degraded_store_still_produces_context() {
        let store = BiographyStore::load(Some(std::path::Path::new("/no/such/file.json")));
        let record = Arc::new(store.record().clone());
        let topics = Arc::new(TopicTable::from_record(&record));
        let index = Arc::new(build_index(&record));
        let r = ContextRetriever::new(record, topics, index);

        let context = r.retrieve("who are you");
        assert!(context.contains("Full name:"));
    }
}
