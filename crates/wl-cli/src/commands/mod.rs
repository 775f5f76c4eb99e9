//! CLI subcommand implementations.

pub mod edit;
pub mod import;
pub mod list;
pub mod scan;
pub mod status;
pub mod tick;
pub mod util;
