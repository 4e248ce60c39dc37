//! Application layer: arguments, configuration, startup and terminal progress

pub mod cli;
pub mod spinner;
pub mod startup;
