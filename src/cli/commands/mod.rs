//! CLI command implementations

pub mod utils;

pub mod completions;
pub mod config;
pub mod groups;
pub mod lookup;
pub mod run;
pub mod sheets;
