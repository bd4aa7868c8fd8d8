//! LLM domain: request payloads and the chat-completion call.
//!
//! Public API for the translation half of the pipeline.
//! External code should only use the functions exported here.
//!
//!   - encode.rs: captured image → messages (OCR text or vision parts)
//!   - request.rs: endpoint/proxy normalisation, headers, HTTP client
//!   - client.rs: the POST itself and failure classification
//!   - response.rs: content + usage extraction, API error messages
//!   - types.rs: wire types

pub mod client;
pub mod encode;
pub mod request;
pub mod response;
pub mod types;

pub use client::send;
pub use encode::encode;
pub use types::{ChatMessage, TokenUsage, TranslationResult};
