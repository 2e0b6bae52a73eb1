//! CLI subcommands.

pub mod migrate;
pub mod order;
pub mod seed;
