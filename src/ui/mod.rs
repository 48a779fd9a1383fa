//! Terminal UI layer for the chat panel.
//!
//! Key submodules:
//! - [`chat_loop`]: the event loop that turns key presses into submissions
//!   and applies outcomes from [`crate::core::inference_service`].
//! - [`state`]: input fields, focus, scroll, and status for one session.
//! - [`renderer`]: frame layout and drawing.
//! - [`theme`]: the fixed dark palette.
//!
//! Ownership boundary: this layer presents and captures interaction state,
//! while [`crate::core`] owns the conversation and submission rules.

pub mod chat_loop;
pub mod renderer;
pub mod state;
pub mod theme;
