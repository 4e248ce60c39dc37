//! CLI API

pub use crate::app::cli::args::Args;
pub use crate::app::cli::config::{
    load_config, locate_config_file, read_config_file, InventoryConfig, RawConfig,
};
