//! WebSense command line: argument handling, settings resolution and
//! terminal output around the `websense` library.

pub mod commands;
pub mod config;
pub mod input;
pub mod output;

pub use config::{process_env, resolve_extraction_config};
pub use input::parse_json_input;
