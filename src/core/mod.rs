pub mod config;
pub mod conversation;
pub mod format;
pub mod inference_service;
pub mod message;
pub mod panel;
pub mod submission;
