//! Prompt Builder - composes the persona instruction, retrieved context,
//! and the visitor's question into one generation request.

use crate::config::GenerationParams;

/// Fixed persona instruction. The assistant speaks about the subject in the
/// third person, never as the subject, and keeps answers short and complete.
pub const PERSONA_PROMPT: &str = "\
You are the helpful assistant embedded in a personal portfolio site. \
Answer visitor questions about the site's subject using ONLY the facts in the \
context below. Always speak about the subject in the third person; never \
answer as if you were the subject. Keep the answer under 60 words, friendly \
and professional, and always end on a complete sentence.";

/// Plain value object built fresh per turn; not retained anywhere.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub persona: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: usize,
    pub repetition_penalty: f32,
    pub max_output_chars: usize,
}

/// Deterministic, I/O-free composition of persona + context + question.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    params: GenerationParams,
}

impl PromptBuilder {
    pub fn new(params: GenerationParams) -> Self {
        Self { params }
    }

    pub fn build(&self, question: &str, context: &str) -> GenerationRequest {
        let prompt = format!(
            "{persona}\n\n{context}\n\nVisitor question: {question}\n\nAnswer:",
            persona = PERSONA_PROMPT,
            context = context,
            question = question,
        );

        GenerationRequest {
            prompt,
            persona: PERSONA_PROMPT.to_string(),
            temperature: self.params.temperature,
            top_p: self.params.top_p,
            top_k: self.params.top_k,
            repetition_penalty: self.params.repetition_penalty,
            max_output_chars: self.params.max_output_chars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_contains_all_parts() {
        let builder = PromptBuilder::new(GenerationParams::default());
        let req = builder.build("What do you build?", "About Alex:\n- role: dev\n");

        assert!(req.prompt.starts_with(PERSONA_PROMPT));
        assert!(req.prompt.contains("About Alex:"));
        assert!(req.prompt.contains("Visitor question: What do you build?"));
        assert!(req.prompt.ends_with("Answer:"));
    }

    #[test]
    fn build_is_deterministic() {
        let builder = PromptBuilder::new(GenerationParams::default());
        let a = builder.build("q", "c");
        let b = builder.build("q", "c");
        assert_eq!(a.prompt, b.prompt);
        assert_eq!(a.temperature, b.temperature);
    }

    #[test]
    fn params_flow_through() {
        let params = GenerationParams { temperature: 0.3, ..GenerationParams::default() };
        let req = PromptBuilder::new(params).build("q", "c");
        assert_eq!(req.temperature, 0.3);
    }
}
