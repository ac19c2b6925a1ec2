//! History-aware retrieval-augmented answering

pub mod answerer;
pub mod contextualizer;
pub mod conversation;
pub mod prompts;

pub use answerer::Answerer;
pub use contextualizer::Contextualizer;
pub use conversation::{Conversation, Reply, Responder, APOLOGY};
