//! ccdict
//!
//! Command-line front end for `ccdict-core`: configuration with file
//! locations, the search command mini-language and the interactive shell.
//!
//! Public API:
//! - `CcdictConfig` - core defaults plus dictionary and database paths
//! - `SearchCommand` - parsed search command, merged over session settings
//! - `Shell` - interactive search loop

pub mod config;
pub use config::CcdictConfig;

pub mod command;
pub use command::{parse_bool, SearchCommand};

pub mod shell;
pub use shell::{Flow, Shell};

// Re-export the core for callers that only depend on this crate.
pub use ccdict_core;
