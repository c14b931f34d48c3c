//! Common value types for the sparkrow serializer.
//!
//! This crate hosts [`RowValue`], the tagged representation a column value
//! takes once it has been materialized out of its Arrow array. Scalar
//! columns are serialized straight from their backing buffers and never
//! pass through here; nested columns (lists, maps, structs) are pulled into
//! `RowValue` trees so the recursive length and write passes can walk them
//! without re-deriving Arrow offsets at every level.

pub mod value;

pub use value::RowValue;
