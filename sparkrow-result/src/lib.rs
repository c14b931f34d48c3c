//! Error types and result definitions for the sparkrow workspace.
//!
//! This crate provides the unified error type ([`Error`]) and result type
//! alias ([`Result<T>`]) used throughout the sparkrow crates. All operations
//! that can fail return `Result<T>`, where the error variant carries enough
//! context to diagnose the failure.
//!
//! # Error Philosophy
//!
//! Sparkrow uses a single error enum rather than crate-specific error types.
//! Row serialization is all-or-nothing per block: any error aborts the block
//! in progress, the output buffer (if already allocated) is released, and no
//! partial row set is ever handed to the caller. No variant is retryable —
//! the input is fully in memory, so a second attempt would deterministically
//! fail the same way.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
