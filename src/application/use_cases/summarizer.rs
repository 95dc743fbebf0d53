use std::sync::Arc;

use tracing::warn;

use crate::application::ChatService;

/// The kind of content being summarized (§4.5). Each variant selects a fixed
/// system+user prompt pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Folder,
    File,
    Class,
    Struct,
    Interface,
    Function,
    CodeChunk,
}

/// Prompt wording, versioned the way the teacher versions its tree-sitter
/// query strings — as an associated constant bumped whenever the wording
/// changes, so callers can tell which generation of summaries a row holds.
pub mod prompts {
    pub const PROMPT_VERSION: u32 = 1;

    pub const SYSTEM_PROMPT: &str =
        "You are a senior software engineer writing concise, factual summaries of source code. \
         Respond with plain prose only, no markdown, no code fences.";

    pub const FOLDER_USER_PROMPT: &str =
        "Summarize the purpose of this folder in one or two sentences based on its contents:";
    pub const FILE_USER_PROMPT: &str =
        "Summarize the purpose of this file in one or two sentences:";
    pub const CLASS_USER_PROMPT: &str =
        "Summarize the responsibility of this class in one or two sentences:";
    pub const STRUCT_USER_PROMPT: &str =
        "Summarize the purpose of this struct, including its key fields, in one or two sentences:";
    pub const INTERFACE_USER_PROMPT: &str =
        "Summarize the contract this interface defines in one or two sentences:";
    pub const FUNCTION_USER_PROMPT: &str =
        "Summarize what this function does, including its inputs and outputs, in one or two sentences:";
    pub const CODE_CHUNK_USER_PROMPT: &str =
        "Summarize what this code does in one or two sentences:";
}

impl SummaryKind {
    fn user_prompt(&self) -> &'static str {
        match self {
            SummaryKind::Folder => prompts::FOLDER_USER_PROMPT,
            SummaryKind::File => prompts::FILE_USER_PROMPT,
            SummaryKind::Class => prompts::CLASS_USER_PROMPT,
            SummaryKind::Struct => prompts::STRUCT_USER_PROMPT,
            SummaryKind::Interface => prompts::INTERFACE_USER_PROMPT,
            SummaryKind::Function => prompts::FUNCTION_USER_PROMPT,
            SummaryKind::CodeChunk => prompts::CODE_CHUNK_USER_PROMPT,
        }
    }
}

/// Turns source text into prose via the chat model (§4.5). The only
/// side-effect is the outbound LLM call; callers own persistence.
pub struct Summarizer {
    chat_service: Arc<dyn ChatService>,
}

impl Summarizer {
    pub fn new(chat_service: Arc<dyn ChatService>) -> Self {
        Self { chat_service }
    }

    /// Returns the assistant's stripped text, or an empty string if the
    /// call fails — the caller leaves `is_summarized=false` and retries on
    /// the next scan rather than treating this as fatal.
    pub async fn llm_summarize(&self, content: &str, kind: SummaryKind) -> String {
        match self
            .chat_service
            .chat(prompts::SYSTEM_PROMPT, kind.user_prompt(), content)
            .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Summarizer: llm_summarize failed for {:?}: {}", kind, e);
                String::new()
            }
        }
    }
}
