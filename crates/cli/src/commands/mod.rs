//! CLI subcommands

pub mod health;
pub mod predict;
pub mod weather;
