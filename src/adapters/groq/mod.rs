//! Groq Adapter
//!
//! Ranks candidates through an OpenAI-compatible chat completion endpoint.

mod client;

pub use client::{GroqConfig, GroqRanker, DEFAULT_GROQ_API_URL, DEFAULT_GROQ_MODEL};
