//! Answer generator trait and the fixed instructions every backend receives.

use async_trait::async_trait;

use crate::context::AssembledContext;
use crate::error::Result;

/// The sentence the model must answer with when the context lacks the answer.
///
/// Existing clients match on this text, so the wording is fixed.
pub const FALLBACK_ANSWER: &str = "I cannot find that information in the provided medical records.";

/// System instruction (Gemini) / preamble (Cohere) sent with every question.
pub const SYSTEM_INSTRUCTION: &str = "You are a medical information assistant. You answer \
questions using only the excerpts from a medical reference manual that are supplied with each \
question.

Rules:
1. Answer strictly from the supplied context. Do not rely on outside knowledge, and do not \
guess or speculate.
2. If the context does not contain the answer, reply with exactly this sentence and nothing \
else: \"I cannot find that information in the provided medical records.\"
3. Format structured answers in Markdown: use headings, bullet lists and bold key terms where \
they help readability.
4. Keep a professional and empathetic tone. Remind the reader to consult a qualified healthcare \
professional when the question concerns their own diagnosis or treatment.";

/// Text shown to the model in place of an empty context block.
pub const EMPTY_CONTEXT_NOTICE: &str = "(no relevant passages were found)";

/// A backend that turns a question plus retrieved context into an answer.
///
/// Adapters decide how to present the context: as one text block inside the
/// prompt, or as a structured document list when the provider supports it.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;

    /// Generate an answer. The returned text is passed to the client as-is.
    async fn generate(&self, question: &str, context: &AssembledContext) -> Result<String>;
}

/// Render the user turn for providers that take the context inline.
pub fn render_prompt(question: &str, context: &AssembledContext) -> String {
    let block = if context.is_empty() { EMPTY_CONTEXT_NOTICE.to_string() } else { context.block() };
    format!("Context:\n{block}\n\nQuestion: {question}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::assemble;
    use crate::document::{SearchMatch, TEXT_KEY};

    #[test]
    fn instruction_carries_the_exact_fallback_sentence() {
        assert!(SYSTEM_INSTRUCTION.contains(FALLBACK_ANSWER));
    }

    #[test]
    fn prompt_inlines_context_then_question() {
        let ctx = assemble(&[SearchMatch::new("a", 1.0).with_metadata(TEXT_KEY, "T1")]);
        let prompt = render_prompt("What is hypertension?", &ctx);
        assert_eq!(prompt, "Context:\nT1\n\nQuestion: What is hypertension?");
    }

    #[test]
    fn empty_context_is_called_out() {
        let prompt = render_prompt("Q?", &AssembledContext::default());
        assert!(prompt.contains(EMPTY_CONTEXT_NOTICE));
    }
}
