//! Relay CLI
//!
//! Library half of the `relay` binary: manifest loading (`manifest`), the
//! subcommands (`commands`) and terminal output (`output`).

pub mod commands;
pub mod manifest;
pub mod output;

pub use commands::check::{run, CheckReport, Generated, GeneratedKind};
pub use manifest::Manifest;
