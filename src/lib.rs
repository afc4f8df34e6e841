// ABOUTME: Library root for pressdock - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod compose;
pub mod config;
pub mod deploy;
pub mod error;
pub mod output;
pub mod remote;
pub mod site;
pub mod ssh;
pub mod store;
pub mod transcript;
pub mod types;
