//! Conversational SQL assistant.
//!
//! Connect to a database through a remote assistant service, turn natural
//! language into SQL, edit it, run it, and browse the schema.

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod conversation;
pub mod dispatch;
pub mod draft;
pub mod error;
pub mod generation;
pub mod headless;
pub mod logging;
pub mod query;
pub mod render;
pub mod repl;
pub mod schema;
pub mod service;
pub mod workspace;
