//! Two-phase assembly of a columnar block into a [`RowSet`].
//!
//! Phase 1 walks every variable-length column and accumulates each output
//! row's exact byte length; string-family and wide-decimal columns report
//! their payload sizes straight from the array buffers, while nested
//! columns are materialized into [`RowValue`] trees for the recursive
//! calculator. Phase 2 allocates one zeroed, 64-byte-aligned buffer and
//! writes column-major: fixed-length columns copy native bytes into their
//! header slots, variable-length columns append payloads at the per-row
//! cursors and store packed descriptors.
//!
//! Both phases are sequential; the per-row cursor is the only mutable
//! state the writers share, and the assembler verifies at the end that
//! every cursor landed exactly where Phase 1 predicted.

use arrow::array::{
    Array, ArrayRef, BinaryArray, Date32Array, Decimal32Array, Decimal64Array, Decimal128Array,
    FixedSizeBinaryArray, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array,
    Int64Array, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray, UInt8Array, UInt16Array, UInt32Array,
    UInt64Array,
};
use arrow::buffer::MutableBuffer;
use arrow::datatypes::{DataType, FieldRef, TimeUnit};
use arrow::record_batch::RecordBatch;

use sparkrow_result::{Error, Result};
use sparkrow_types::RowValue;

use crate::calc::BackingLengthCalculator;
use crate::classify;
use crate::fixed::FixedWriter;
use crate::layout::{bit_set, bitset_width_bytes, fixed_size_per_row, round_up_to_word,
    swap_decimal128_endianness};
use crate::row_set::RowSet;
use crate::variable::VariableWriter;

/// Serialize a record batch, optionally selecting and ordering rows with a
/// mask of source indices.
pub fn batch_to_rows(batch: &RecordBatch, mask: Option<&[usize]>) -> Result<RowSet> {
    let schema = batch.schema();
    block_to_rows(schema.fields(), batch.columns(), mask)
}

/// Serialize an ordered list of `(field, array)` columns.
///
/// All arrays must share one length. When `mask` is supplied the output has
/// `mask.len()` rows and output row `i` is materialized from source row
/// `mask[i]`; duplicates and reorderings are permitted.
pub fn block_to_rows(
    fields: &[FieldRef],
    columns: &[ArrayRef],
    mask: Option<&[usize]>,
) -> Result<RowSet> {
    if fields.is_empty() || columns.is_empty() {
        return Err(Error::EmptySchema);
    }
    if fields.len() != columns.len() {
        return Err(Error::InvalidArgumentError(format!(
            "{} fields for {} columns",
            fields.len(),
            columns.len()
        )));
    }

    let source_rows = columns[0].len();
    for (field, column) in fields.iter().zip(columns) {
        if column.len() != source_rows {
            return Err(Error::InvalidArgumentError(format!(
                "column {} has {} rows, expected {source_rows}",
                field.name(),
                column.len()
            )));
        }
    }
    if let Some(mask) = mask {
        for &idx in mask {
            if idx >= source_rows {
                return Err(Error::InvalidArgumentError(format!(
                    "mask index {idx} out of bounds for {source_rows} source rows"
                )));
            }
        }
    }

    let num_cols = fields.len();
    let num_rows = mask.map_or(source_rows, <[usize]>::len);
    let null_bitset_width = bitset_width_bytes(num_cols);
    let fixed_per_row = fixed_size_per_row(num_cols);

    tracing::trace!("serializing block: {num_cols} columns, {num_rows} rows");

    // Phase 1: per-row byte lengths. Fixed-length columns contribute only
    // their header slot, which is already part of `fixed_per_row`.
    let mut lengths = vec![fixed_per_row; num_rows];
    for (field, column) in fields.iter().zip(columns) {
        let dtype = field.data_type();
        if classify::is_fixed_length(dtype) {
            continue;
        }
        if !classify::is_variable_length(dtype) {
            return Err(Error::UnsupportedType(format!(
                "column {} has type {dtype:?}, which is neither fixed nor variable length",
                field.name()
            )));
        }

        if classify::supports_raw_copy(dtype) {
            accumulate_raw_lengths(dtype, column, mask, &mut lengths)?;
        } else {
            let calculator = BackingLengthCalculator::try_new(dtype.clone())?;
            for (i, length) in lengths.iter_mut().enumerate() {
                let src = source_index(mask, i);
                if column.is_null(src) {
                    continue;
                }
                let value = RowValue::from_array(column.as_ref(), src)?;
                *length += calculator.calculate(&value)?;
            }
        }
    }
    for (row, &length) in lengths.iter().enumerate() {
        if length - fixed_per_row > u32::MAX as i64 {
            return Err(Error::InvalidArgumentError(format!(
                "row {row} backing data of {} bytes exceeds the 32-bit descriptor size field",
                length - fixed_per_row
            )));
        }
    }

    let mut offsets = vec![0i64; num_rows];
    for i in 1..num_rows {
        offsets[i] = offsets[i - 1] + lengths[i - 1];
    }
    let total_bytes: i64 = lengths.iter().sum();

    tracing::debug!("row buffer sized: {total_bytes} bytes across {num_rows} rows");

    // Phase 2: one zeroed, 64-byte-aligned allocation, then column-major
    // writes at the precomputed offsets.
    let mut buffer = MutableBuffer::from_len_zeroed(total_bytes as usize);
    let mut cursors = vec![fixed_per_row; num_rows];
    {
        let buf = buffer.as_slice_mut();
        let mut writer = VariableWriter::new(&offsets, &mut cursors);
        for (col_idx, (field, column)) in fields.iter().zip(columns).enumerate() {
            let field_offset = null_bitset_width + 8 * col_idx as i64;
            let dtype = field.data_type();
            if classify::is_fixed_length(dtype) {
                write_fixed_column(buf, &offsets, field_offset, col_idx, dtype, column, mask)?;
            } else if classify::supports_raw_copy(dtype) {
                write_raw_variable_column(
                    buf,
                    &mut writer,
                    &offsets,
                    field_offset,
                    col_idx,
                    dtype,
                    column,
                    mask,
                )?;
            } else {
                write_nested_column(
                    buf,
                    &mut writer,
                    &offsets,
                    field_offset,
                    col_idx,
                    dtype,
                    column,
                    mask,
                )?;
            }
        }
    }

    for (row, (&cursor, &length)) in cursors.iter().zip(lengths.iter()).enumerate() {
        if cursor != length {
            return Err(Error::InvariantBroken(format!(
                "row {row} cursor ended at {cursor}, length pass predicted {length}"
            )));
        }
    }

    let types = fields.iter().map(|f| f.data_type().clone()).collect();
    Ok(RowSet::new(types, offsets, lengths, buffer, total_bytes))
}

#[inline]
fn source_index(mask: Option<&[usize]>, out_idx: usize) -> usize {
    match mask {
        Some(mask) => mask[out_idx],
        None => out_idx,
    }
}

fn downcast<'a, T: 'static>(column: &'a ArrayRef) -> Result<&'a T> {
    column.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::UnsupportedType(format!(
            "array downcast failed for declared type {:?}",
            column.data_type()
        ))
    })
}

/// Phase-1 byte lengths for raw-copyable variable-length columns, read
/// straight from the array buffers without materializing values.
fn accumulate_raw_lengths(
    dtype: &DataType,
    column: &ArrayRef,
    mask: Option<&[usize]>,
    lengths: &mut [i64],
) -> Result<()> {
    match dtype {
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(column)?;
            let value_offsets = arr.value_offsets();
            for (i, length) in lengths.iter_mut().enumerate() {
                let src = source_index(mask, i);
                if !arr.is_null(src) {
                    *length +=
                        round_up_to_word((value_offsets[src + 1] - value_offsets[src]) as i64);
                }
            }
        }
        DataType::Binary => {
            let arr = downcast::<BinaryArray>(column)?;
            let value_offsets = arr.value_offsets();
            for (i, length) in lengths.iter_mut().enumerate() {
                let src = source_index(mask, i);
                if !arr.is_null(src) {
                    *length +=
                        round_up_to_word((value_offsets[src + 1] - value_offsets[src]) as i64);
                }
            }
        }
        DataType::FixedSizeBinary(width) => {
            let padded = round_up_to_word(*width as i64);
            for (i, length) in lengths.iter_mut().enumerate() {
                let src = source_index(mask, i);
                if !column.is_null(src) {
                    *length += padded;
                }
            }
        }
        DataType::Decimal128(_, _) => {
            for (i, length) in lengths.iter_mut().enumerate() {
                let src = source_index(mask, i);
                if !column.is_null(src) {
                    *length += 16;
                }
            }
        }
        other => {
            return Err(Error::UnsupportedType(format!(
                "type {other:?} has no raw length path"
            )));
        }
    }
    Ok(())
}

macro_rules! write_fixed_rows {
    ($array_ty:ty, $column:expr, $writer:expr, $buf:expr, $offsets:expr, $field_offset:expr,
     $col_idx:expr, $mask:expr) => {{
        let arr = downcast::<$array_ty>($column)?;
        if arr.null_count() == 0 {
            for (i, &row_base) in $offsets.iter().enumerate() {
                let src = source_index($mask, i);
                let slot = (row_base + $field_offset) as usize;
                $writer.write_raw(&arr.value(src).to_le_bytes(), &mut $buf[slot..slot + 8]);
            }
        } else {
            for (i, &row_base) in $offsets.iter().enumerate() {
                let src = source_index($mask, i);
                if arr.is_null(src) {
                    bit_set(&mut $buf[row_base as usize..], $col_idx);
                } else {
                    let slot = (row_base + $field_offset) as usize;
                    $writer.write_raw(&arr.value(src).to_le_bytes(), &mut $buf[slot..slot + 8]);
                }
            }
        }
    }};
}

fn write_fixed_column(
    buf: &mut [u8],
    offsets: &[i64],
    field_offset: i64,
    col_idx: usize,
    dtype: &DataType,
    column: &ArrayRef,
    mask: Option<&[usize]>,
) -> Result<()> {
    let writer = FixedWriter::try_new(dtype.clone())?;
    match dtype {
        // Every value of the empty marker type is null.
        DataType::Null => {
            for &row_base in offsets {
                bit_set(&mut buf[row_base as usize..], col_idx);
            }
        }
        DataType::Int8 => {
            write_fixed_rows!(Int8Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::Int16 => {
            write_fixed_rows!(Int16Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::Int32 => {
            write_fixed_rows!(Int32Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::Int64 => {
            write_fixed_rows!(Int64Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::UInt8 => {
            write_fixed_rows!(UInt8Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::UInt16 => {
            write_fixed_rows!(UInt16Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::UInt32 => {
            write_fixed_rows!(UInt32Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::UInt64 => {
            write_fixed_rows!(UInt64Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::Date32 => {
            write_fixed_rows!(Date32Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::Float32 => {
            write_fixed_rows!(Float32Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::Float64 => {
            write_fixed_rows!(Float64Array, column, writer, buf, offsets, field_offset, col_idx, mask)
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            write_fixed_rows!(
                TimestampSecondArray, column, writer, buf, offsets, field_offset, col_idx, mask
            )
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            write_fixed_rows!(
                TimestampMillisecondArray, column, writer, buf, offsets, field_offset, col_idx,
                mask
            )
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            write_fixed_rows!(
                TimestampMicrosecondArray, column, writer, buf, offsets, field_offset, col_idx,
                mask
            )
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            write_fixed_rows!(
                TimestampNanosecondArray, column, writer, buf, offsets, field_offset, col_idx, mask
            )
        }
        DataType::Decimal64(_, _) => {
            write_fixed_rows!(
                Decimal64Array, column, writer, buf, offsets, field_offset, col_idx, mask
            )
        }
        // 32-bit decimals widen to a sign-extended long, so they take the
        // typed write rather than a native-width copy.
        DataType::Decimal32(_, _) => {
            let arr = downcast::<Decimal32Array>(column)?;
            for (i, &row_base) in offsets.iter().enumerate() {
                let src = source_index(mask, i);
                if arr.is_null(src) {
                    bit_set(&mut buf[row_base as usize..], col_idx);
                } else {
                    let slot = (row_base + field_offset) as usize;
                    let value = RowValue::Decimal(arr.value(src) as i128);
                    writer.write_value(&value, &mut buf[slot..slot + 8])?;
                }
            }
        }
        other => {
            return Err(Error::UnsupportedType(format!(
                "type {other:?} has no fixed-length write path"
            )));
        }
    }
    Ok(())
}

macro_rules! write_raw_variable_rows {
    ($arr:expr, $value_bytes:expr, $writer:expr, $buf:expr, $offsets:expr, $field_offset:expr,
     $col_idx:expr, $mask:expr) => {{
        for (i, &row_base) in $offsets.iter().enumerate() {
            let src = source_index($mask, i);
            if $arr.is_null(src) {
                bit_set(&mut $buf[row_base as usize..], $col_idx);
                continue;
            }
            let descriptor = $writer.write_unaligned_bytes($buf, i, $value_bytes(src), 0);
            store_descriptor($buf, row_base, $field_offset, descriptor);
        }
    }};
}

#[allow(clippy::too_many_arguments)]
fn write_raw_variable_column(
    buf: &mut [u8],
    writer: &mut VariableWriter<'_>,
    offsets: &[i64],
    field_offset: i64,
    col_idx: usize,
    dtype: &DataType,
    column: &ArrayRef,
    mask: Option<&[usize]>,
) -> Result<()> {
    match dtype {
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(column)?;
            write_raw_variable_rows!(
                arr,
                |src| arr.value(src).as_bytes(),
                writer,
                buf,
                offsets,
                field_offset,
                col_idx,
                mask
            );
        }
        DataType::Binary => {
            let arr = downcast::<BinaryArray>(column)?;
            write_raw_variable_rows!(
                arr,
                |src| arr.value(src),
                writer,
                buf,
                offsets,
                field_offset,
                col_idx,
                mask
            );
        }
        DataType::FixedSizeBinary(_) => {
            let arr = downcast::<FixedSizeBinaryArray>(column)?;
            write_raw_variable_rows!(
                arr,
                |src| arr.value(src),
                writer,
                buf,
                offsets,
                field_offset,
                col_idx,
                mask
            );
        }
        DataType::Decimal128(_, _) => {
            let arr = downcast::<Decimal128Array>(column)?;
            for (i, &row_base) in offsets.iter().enumerate() {
                let src = source_index(mask, i);
                if arr.is_null(src) {
                    bit_set(&mut buf[row_base as usize..], col_idx);
                    continue;
                }
                let mut bytes = arr.value(src).to_le_bytes();
                swap_decimal128_endianness(&mut bytes);
                let descriptor = writer.write_unaligned_bytes(buf, i, &bytes, 0);
                store_descriptor(buf, row_base, field_offset, descriptor);
            }
        }
        other => {
            return Err(Error::UnsupportedType(format!(
                "type {other:?} has no raw variable-length write path"
            )));
        }
    }
    Ok(())
}

/// Lists, maps, and structs: materialize each row's value and hand it to
/// the recursive writer with a zero parent offset (descriptors in the row
/// header are relative to the row start).
#[allow(clippy::too_many_arguments)]
fn write_nested_column(
    buf: &mut [u8],
    writer: &mut VariableWriter<'_>,
    offsets: &[i64],
    field_offset: i64,
    col_idx: usize,
    dtype: &DataType,
    column: &ArrayRef,
    mask: Option<&[usize]>,
) -> Result<()> {
    for (i, &row_base) in offsets.iter().enumerate() {
        let src = source_index(mask, i);
        if column.is_null(src) {
            bit_set(&mut buf[row_base as usize..], col_idx);
            continue;
        }
        let value = RowValue::from_array(column.as_ref(), src)?;
        let descriptor = writer.write(buf, i, dtype, &value, 0)?;
        store_descriptor(buf, row_base, field_offset, descriptor);
    }
    Ok(())
}

#[inline]
fn store_descriptor(buf: &mut [u8], row_base: i64, field_offset: i64, descriptor: i64) {
    let at = (row_base + field_offset) as usize;
    buf[at..at + 8].copy_from_slice(&descriptor.to_le_bytes());
}
