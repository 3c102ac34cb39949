// Resume review: company context retrieval feeding a two-agent report pipeline.
// All LLM calls go through llm_client, never direct OpenAI calls here.

pub mod handlers;
pub mod pipeline;
pub mod prompts;
