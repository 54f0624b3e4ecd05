//! LLM client for the relay.
//!
//! Single-shot text generation against a local Ollama instance, plus model listing for probes.

mod ollama;

pub use ollama::{
    GenerateChoice, GenerateReply, GenerateResponse, OllamaClient, OllamaError, OllamaModel,
    APOLOGY_UNRECOGNIZED,
};
