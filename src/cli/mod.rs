//! Command Line Interface for ferry
// (c) 2026 Ferry contributors
mod args;
mod cli_main;
pub mod styles;
pub use cli_main::cli;
