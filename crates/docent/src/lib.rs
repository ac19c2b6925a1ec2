//! Docent - conversational question answering over PDF manuals
//!
//! Documents are split into overlapping chunks, embedded into a flat L2 index
//! and retrieved per question. Follow-up questions are rewritten against the
//! session history before retrieval so multi-turn conversations stay grounded.

pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod memory;
pub mod models;
pub mod runtime;
pub mod server;
pub mod services;

pub use error::{DocentError, Result};
