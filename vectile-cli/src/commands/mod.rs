//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (init, list, path)
//! - [`plan`] - Show the tile plan without rendering
//! - [`probe`] - Check the source and rasterizer environment
//! - [`slice`] - Render a complete pyramid (the main command)

pub mod common;
pub mod config;
pub mod plan;
pub mod probe;
pub mod slice;
