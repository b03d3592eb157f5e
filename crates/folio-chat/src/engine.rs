//! Per-turn answer pipeline: retrieve context, build the prompt, attempt
//! generation under a bounded timeout, sanitize, and degrade to the
//! fallback responder on any failure at any stage. `answer` is total: the
//! assistant always answers, with generated text preferred and canned text
//! as an invisible safety net.

use std::sync::Arc;
use std::time::Duration;

use crate::biography::{BiographyRecord, BiographyStore};
use crate::config::AssistantConfig;
use crate::fallback::FallbackResponder;
use crate::llm::{build_generator, TextGenerator};
use crate::prompt::PromptBuilder;
use crate::retrieval::ContextRetriever;
use crate::sanitize::sanitize;
use crate::search::build_index;
use crate::topics::TopicTable;

pub struct AssistantEngine {
    record: Arc<BiographyRecord>,
    retriever: ContextRetriever,
    builder: PromptBuilder,
    generator: Option<Arc<dyn TextGenerator>>,
    fallback: FallbackResponder,
    max_output_chars: usize,
    generation_timeout: Duration,
}

impl AssistantEngine {
    pub fn new(store: BiographyStore, config: &AssistantConfig) -> Self {
        let generator = build_generator(&config.backend, config.model_load_timeout());
        Self::with_generator(store, config, generator)
    }

    /// Construct with an explicit generator (or none). The seam that lets
    /// tests drive the pipeline with a fake backend.
    pub fn with_generator(
        store: BiographyStore,
        config: &AssistantConfig,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let record = Arc::new(store.record().clone());
        let topics = Arc::new(TopicTable::from_record(&record));
        let index = Arc::new(build_index(&record));

        match &generator {
            Some(g) => {
                let info = g.info();
                tracing::info!(backend = %info.name, model = %info.model, "Assistant engine ready");
            }
            None => tracing::info!("Assistant engine ready (fallback-only, no backend configured)"),
        }

        Self {
            retriever: ContextRetriever::new(
                Arc::clone(&record),
                Arc::clone(&topics),
                index,
            ),
            builder: PromptBuilder::new(config.generation.clone()),
            generator,
            fallback: FallbackResponder::new(topics),
            record,
            max_output_chars: config.generation.max_output_chars,
            generation_timeout: config.generation_timeout(),
        }
    }

    pub fn record(&self) -> &BiographyRecord {
        &self.record
    }

    /// Answer one user turn. Never fails and never returns empty text.
    pub async fn answer(&self, question: &str) -> String {
        let context = self.retriever.retrieve(question);
        let request = self.builder.build(question, &context);

        let generator = match &self.generator {
            Some(g) => g,
            None => {
                tracing::debug!("No backend configured, answering from fallback");
                return self.fallback.respond(question);
            }
        };

        let raw = match tokio::time::timeout(self.generation_timeout, generator.generate(&request))
            .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Generation failed, answering from fallback");
                return self.fallback.respond(question);
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.generation_timeout, "Generation timed out, answering from fallback");
                return self.fallback.respond(question);
            }
        };

        match sanitize(&raw, &request.prompt, self.max_output_chars) {
            Some(text) => text,
            None => {
                tracing::warn!("Generated output rejected by sanitizer, answering from fallback");
                self.fallback.respond(question)
            }
        }
    }
}
