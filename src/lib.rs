pub mod app;
pub mod aws;
pub mod core;
pub mod inventory;
pub mod report;
pub mod scanner;
