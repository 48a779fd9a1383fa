//! Image Analyzer is a terminal chat panel for asking a remote inference
//! service about an image.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation log, pending input, submission rules,
//!   reply post-processing, configuration, and the background request
//!   service.
//! - [`api`] defines the endpoint payloads and the reqwest-backed
//!   [`api::InferenceBackend`] that posts multipart forms.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop.
//! - [`utils`] holds transcript layout, JSON highlighting, and the
//!   plain-text transcript log.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration and dispatches
//! into [`ui::chat_loop`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
