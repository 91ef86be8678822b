pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod formatters;
pub mod gate;
pub mod logging;
pub mod traversal;
pub mod types;
pub mod vcs;
