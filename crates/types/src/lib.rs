//! Foundation types for the GraphQL project engine.
//!
//! This crate provides shared types used across the engine stack.
//! It has zero external dependencies, making it suitable as a foundation layer.
//!
//! # Type Categories
//!
//! - **File types**: [`Language`], [`SourceKind`]
//! - **Position types**: [`Position`], [`Range`], [`OffsetRange`]
//! - **Severity types**: [`DiagnosticSeverity`]
//! - **Identity types**: [`Fingerprint`]

mod file;
mod fingerprint;
mod position;
mod severity;

pub use file::{Language, SourceKind};
pub use fingerprint::Fingerprint;
pub use position::{OffsetRange, Position, Range};
pub use severity::DiagnosticSeverity;
