use async_trait::async_trait;

use crate::domain::DomainError;

/// An LLM chat completion used by the Summarizer (§6). `user_question` is
/// the content being summarized; `system_prompt`/`user_prompt` carry the
/// fixed instruction and the kind-specific template.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        user_question: &str,
    ) -> Result<String, DomainError>;
}
