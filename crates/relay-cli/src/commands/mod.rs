//! `relay` subcommands

pub mod check;
pub mod reserved;
