//! Shared configuration for Tidemark.
//!
//! This crate provides the configuration types used by the database layer
//! and the CLI binary.

pub mod config;

pub use config::MigratorConfig;
