//! `kv-server` - a line-oriented TCP front end for the `kv` transactional
//! store.
//!
//! ## Getting started
//!
//! ```doc
//! ❯ ./kv-server
//!
//! ██  ██  █        █
//! ██ ██   ██      ██
//! ███      ██    ██
//! ██ ██     ██  ██
//! ██  ██     ████  KV Server
//!
//! kv-server listening on localhost:8000
//! ```

pub mod config;
pub mod listener;
pub mod protocol;
pub mod trace;

pub use config::ServerConfig;
