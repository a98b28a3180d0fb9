//! Blocks Cloud MCP Server Library
//!
//! This module exports the core components for testing and integration.

pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod session;
pub mod shell;
pub mod tools;
