//! Core decision and orchestration logic for the skyreply bot.
//!
//! This crate is intentionally framework-agnostic. The social feed and the text
//! completion service live behind ports (traits) implemented in adapter crates.

pub mod bot;
pub mod config;
pub mod domain;
pub mod errors;
pub mod generator;
pub mod logging;
pub mod matcher;
pub mod policy;
pub mod ports;
pub mod publisher;
pub mod thread;
pub mod utils;

pub use errors::{Error, Result};
