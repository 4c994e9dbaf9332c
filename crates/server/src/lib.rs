//! Tempcast server - weather lookup and next-temperature prediction over HTTP

pub mod api;
pub mod config;
