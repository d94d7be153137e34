//! Outbound LLM gateway: provider client and candidate extraction.
//!
//! - [`llm`] - the [`LlmClient`] seam and the OpenAI-compatible HTTP client
//! - [`extractor`] - JSON-first, fence-fallback candidate extraction

pub mod extractor;
pub mod llm;

pub use extractor::{CandidateExtractor, ExtractionOutcome, python_syntax_scan};
pub use llm::{
    DEFAULT_LLM_TIMEOUT, GatewayError, HttpLlmClient, LlmClient, LlmOptions, LlmProvider,
    MAX_LLM_TIMEOUT, MAX_LLM_TOKENS, SYSTEM_PROMPT,
};
