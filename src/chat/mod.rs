//! Chat agent: keyword classification and Markdown replies

pub mod classifier;
mod responder;

pub use classifier::{classify, Intent, Query, UseCase};
pub use responder::{ChatAgent, Reply};
