//! Command line and configuration handling

pub mod api;
pub mod args;
pub mod config;
