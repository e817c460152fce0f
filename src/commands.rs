//! Subcommands of the `jps` binary.

pub mod generate;
pub mod repl;
