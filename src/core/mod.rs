//! Core services and infrastructure

pub mod error_handling;
pub mod logging;
pub mod shutdown;
pub mod styles; // colour roles for the console summary and help
pub mod validation;
pub mod version;
