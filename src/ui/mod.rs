//! UI rendering module for L1 Chat
//!
//! All terminal drawing lives here, using ratatui widgets over the `App`
//! state.

pub mod chat;
pub mod help_overlay;

pub use chat::render as render_chat;
pub use help_overlay::render as render_help_overlay;
