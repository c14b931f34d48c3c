use crate::error::Error;

/// Result type alias used across the sparkrow crates.
///
/// All sparkrow operations that can fail return this type.
pub type Result<T> = std::result::Result<T, Error>;
