use thiserror::Error;

/// Unified error type for row serialization.
///
/// Every variant is fatal to the block being serialized. Errors propagate
/// upward with the `?` operator; at the native-boundary surface they are
/// typically rendered into a message for the host runtime.
#[derive(Error, Debug)]
pub enum Error {
    /// Arrow library error during columnar data access.
    ///
    /// Raised when downcasting arrays, reading nested children, or building
    /// test fixtures fails inside the `arrow` crate itself.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// The input block has zero columns.
    ///
    /// A row in the target format always carries a null bitmap sized from
    /// the column count, so an empty schema has no meaningful encoding.
    #[error("cannot serialize a block with no columns")]
    EmptySchema,

    /// A column or nested element type is neither fixed-length nor
    /// variable-length under the row format's classification table, or a
    /// materialized value does not match its declared type.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The write pass diverged from the sizes computed by the length pass.
    ///
    /// This is defensive: it indicates a bug in the length calculator or in
    /// one of the writers, never bad input. Neighbouring rows may already be
    /// corrupt when this fires, which is why the whole block is abandoned.
    #[error("row layout invariant broken: {0}")]
    InvariantBroken(String),

    /// Invalid user input or API parameter.
    ///
    /// Covers out-of-bounds mask indices, mismatched column lengths, and
    /// values whose encoding would overflow the 32-bit size field of a
    /// packed offset-and-size descriptor.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),
}
