//! Terminal interaction

pub mod prompts;
