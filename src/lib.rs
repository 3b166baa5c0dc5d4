//! sql_bridge library - uniform client access to SQLite, MySQL and PostgreSQL
//!
//! Provides the handle-based database client, the UTF-16 host boundary, and
//! the command execution and output formatting behind the `sql_bridge` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod encoding;
pub mod host;
pub mod output;

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod test_utils;
