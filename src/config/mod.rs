pub mod env;
mod loader;

pub use env::{AppConfig, BatchConfig, DirectoryConfig, FetchConfig, FlushPolicy};
pub use loader::load_config;
