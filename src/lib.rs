//! Clinical note summarization, entity extraction and diagnostic suggestions.

pub mod api;
pub mod cli;
pub mod config;
pub mod diagnosis;
pub mod logging;
pub mod nlp;
#[cfg(feature = "askama")]
pub mod ui;
