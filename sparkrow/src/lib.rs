//! Columnar-to-row serialization of Arrow record batches.
//!
//! Sparkrow converts a batch of typed Arrow columns into one contiguous
//! buffer of Spark-compatible UnsafeRow records, plus per-row offsets and
//! lengths so a consumer — typically JVM-hosted execution on the far side
//! of a native boundary — can index individual rows in place.
//!
//! The conversion runs in two passes that must agree byte-for-byte: a
//! length pass ([`calc`]) computes every row's exact encoded size, then a
//! write pass ([`fixed`], [`variable`]) materializes each row at its
//! precomputed offset, recursively laying out lists, maps, and structs in
//! each row's backing region. [`convert`] orchestrates the passes and
//! [`row_set::RowSet`] carries the result.
//!
//! ```
//! use arrow::array::{ArrayRef, Int32Array, StringArray};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use std::sync::Arc;
//!
//! let schema = Schema::new(vec![
//!     Field::new("id", DataType::Int32, false),
//!     Field::new("name", DataType::Utf8, false),
//! ]);
//! let batch = RecordBatch::try_new(
//!     Arc::new(schema),
//!     vec![
//!         Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef,
//!         Arc::new(StringArray::from(vec!["a", "b"])) as ArrayRef,
//!     ],
//! )
//! .unwrap();
//!
//! let rows = sparkrow::batch_to_rows(&batch, None).unwrap();
//! assert_eq!(rows.num_rows(), 2);
//! assert_eq!(rows.total_bytes(), rows.lengths().iter().sum::<i64>());
//! ```

pub mod calc;
pub mod classify;
pub mod convert;
pub mod fixed;
pub mod layout;
pub mod row_set;
pub mod variable;

pub use convert::{batch_to_rows, block_to_rows};
pub use row_set::{RawParts, RowSet};

pub use sparkrow_result::{Error, Result};
