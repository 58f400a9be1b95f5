pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod graph;
pub mod output;
pub mod tui;
