//! LLM integration module.
//!
//! Provides an OpenAI-compatible client for multimodal chat completions and
//! the default prompts used to score screenshot pairs.

mod client;
mod prompts;

pub use client::{
    ContentPart, ImageUrl, LlmClient, LlmResponse, Message, MessageContent, Role, TokenUsage,
};
pub use prompts::Prompts;
