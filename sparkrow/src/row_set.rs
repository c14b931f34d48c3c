//! The serialized output artifact.

use arrow::buffer::MutableBuffer;
use arrow::datatypes::DataType;

use crate::layout::bitset_width_bytes;

/// A block serialized into contiguous row-format records.
///
/// Owns the row buffer and the per-row offset/length vectors; nothing in
/// here borrows from the input columns. Rows are indexable in place:
/// row `i` spans `buffer()[offsets[i] .. offsets[i] + lengths[i]]`.
#[derive(Debug)]
pub struct RowSet {
    types: Vec<DataType>,
    num_rows: usize,
    num_cols: usize,
    null_bitset_width: i64,
    offsets: Vec<i64>,
    lengths: Vec<i64>,
    total_bytes: i64,
    buffer: MutableBuffer,
}

impl RowSet {
    pub(crate) fn new(
        types: Vec<DataType>,
        offsets: Vec<i64>,
        lengths: Vec<i64>,
        buffer: MutableBuffer,
        total_bytes: i64,
    ) -> Self {
        let num_cols = types.len();
        let num_rows = offsets.len();
        Self {
            null_bitset_width: bitset_width_bytes(num_cols),
            types,
            num_rows,
            num_cols,
            offsets,
            lengths,
            total_bytes,
            buffer,
        }
    }

    /// Column element types, passed through from the input schema for
    /// downstream decoding.
    pub fn data_types(&self) -> &[DataType] {
        &self.types
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Width in bytes of each row's null bitmap.
    pub fn null_bitset_width(&self) -> i64 {
        self.null_bitset_width
    }

    /// Byte offset of each row within the buffer.
    pub fn offsets(&self) -> &[i64] {
        &self.offsets
    }

    /// Exact byte length of each row.
    pub fn lengths(&self) -> &[i64] {
        &self.lengths
    }

    pub fn total_bytes(&self) -> i64 {
        self.total_bytes
    }

    /// The contiguous row data; 64-byte-aligned at its base.
    pub fn buffer(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Byte offset of column `col_idx`'s slot within any row.
    pub fn field_offset(&self, col_idx: usize) -> i64 {
        self.null_bitset_width + 8 * col_idx as i64
    }

    /// The five long-typed values handed across the native boundary.
    pub fn raw_parts(&self) -> RawParts {
        RawParts {
            offsets_ptr: self.offsets.as_ptr() as i64,
            lengths_ptr: self.lengths.as_ptr() as i64,
            buffer_address: self.buffer.as_ptr() as i64,
            num_cols: self.num_cols as i64,
            total_bytes: self.total_bytes,
        }
    }
}

/// Raw handoff values for a cross-language consumer.
///
/// The pointers stay valid only while the originating [`RowSet`] is alive;
/// the receiving side must not outlive it.
#[derive(Debug, Clone, Copy)]
pub struct RawParts {
    pub offsets_ptr: i64,
    pub lengths_ptr: i64,
    pub buffer_address: i64,
    pub num_cols: i64,
    pub total_bytes: i64,
}
