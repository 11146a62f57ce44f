//! Core types for typed-pipeline.
//!
//! This crate provides the foundational types used throughout the system:
//! - [`Chunk`] - Raw bytes read from a chunk producer, with source metadata
//! - [`ReadOptions`] - Read configuration for file-backed chunk producers
//! - [`PipelineState`] - Lifecycle state of a pipeline run

pub mod chunk;
pub mod config;
pub mod state;

pub use chunk::*;
pub use config::*;
pub use state::*;
