// Document transformation core: session lifecycle, prompt building,
// remote invocation and failure classification.
// All LLM calls go through llm_client; nothing here talks to Anthropic directly.

pub mod client;
pub mod failure;
pub mod handlers;
pub mod prompts;
pub mod session;
