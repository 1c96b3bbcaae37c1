//! Gemini `generateContent` client shared by language-model enrichment and grounded search.

pub mod client;
pub mod grounding;
pub mod types;

pub use client::{GeminiClient, GeminiError};
