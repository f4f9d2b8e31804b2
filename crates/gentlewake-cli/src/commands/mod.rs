//! CLI subcommands

pub mod completions;
pub mod config;
pub mod prefs;
pub mod status;
pub mod sync;
