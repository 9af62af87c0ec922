//! Library side of the `tabprep` command-line tool.
//!
//! - **commands**: subcommand implementations over `tabprep-core`
//! - **logging**: `tracing-subscriber` setup
//! - **summary**: terminal tables for results

pub mod commands;
pub mod logging;
pub mod summary;
