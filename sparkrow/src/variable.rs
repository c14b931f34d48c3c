//! Writer for variable-length values, the second of the two passes.
//!
//! The writer appends payload bytes at each row's cursor and returns packed
//! offset-and-size descriptors for the caller to place in the enclosing
//! slot. Offsets inside a descriptor are relative to `parent_offset` — the
//! start of the enclosing composite, or zero for top-level columns — so a
//! consumer can address a nested subtree without knowing its absolute
//! position within the row.
//!
//! The only mutable state is the per-row cursor vector shared with the
//! assembler. Cursors never decrease, and within one row writes never
//! overlap; every write advances the cursor by exactly the amount the
//! length pass predicted for the same value.

use arrow::datatypes::{DataType, FieldRef, Fields};

use sparkrow_result::{Error, Result};
use sparkrow_types::RowValue;

use crate::classify;
use crate::fixed::FixedWriter;
use crate::layout::{
    bit_set, bitset_width_bytes, pack_offset_and_size, round_up_to_word,
    swap_decimal128_endianness, unpack_size,
};

/// Emits variable-length payloads into rows' backing regions.
///
/// The output buffer is threaded through every call rather than held by the
/// writer, which keeps the writer re-entrant across recursion levels and
/// leaves the buffer free for header-slot stores between calls.
pub struct VariableWriter<'a> {
    /// Byte offset of each row within the output buffer.
    offsets: &'a [i64],
    /// Next free position within each row, relative to the row start.
    cursors: &'a mut [i64],
}

impl<'a> VariableWriter<'a> {
    pub fn new(offsets: &'a [i64], cursors: &'a mut [i64]) -> Self {
        debug_assert_eq!(offsets.len(), cursors.len());
        Self { offsets, cursors }
    }

    /// Write `value` into row `row`'s backing region and return its packed
    /// descriptor. A null value writes nothing and returns zero.
    pub fn write(
        &mut self,
        buffer: &mut [u8],
        row: usize,
        dtype: &DataType,
        value: &RowValue,
        parent_offset: i64,
    ) -> Result<i64> {
        if value.is_null() {
            return Ok(0);
        }

        match dtype {
            DataType::Utf8 | DataType::Binary | DataType::FixedSizeBinary(_) => {
                let bytes = value
                    .as_bytes()
                    .ok_or_else(|| mismatch(dtype, value))?;
                Ok(self.write_unaligned_bytes(buffer, row, bytes, parent_offset))
            }
            DataType::Decimal128(_, _) => {
                let decimal = value
                    .as_decimal()
                    .ok_or_else(|| mismatch(dtype, value))?;
                let mut bytes = decimal.to_le_bytes();
                swap_decimal128_endianness(&mut bytes);
                Ok(self.write_unaligned_bytes(buffer, row, &bytes, parent_offset))
            }
            DataType::List(elem_field) => {
                let RowValue::List(elems) = value else {
                    return Err(mismatch(dtype, value));
                };
                self.write_list(buffer, row, elem_field, elems, parent_offset)
            }
            DataType::Map(_, _) => {
                let RowValue::Map(pairs) = value else {
                    return Err(mismatch(dtype, value));
                };
                let (key_field, val_field) = classify::map_entry_fields(dtype)?;
                self.write_map(buffer, row, key_field, val_field, pairs, parent_offset)
            }
            DataType::Struct(fields) => {
                let RowValue::Struct(members) = value else {
                    return Err(mismatch(dtype, value));
                };
                self.write_struct(buffer, row, fields, members, parent_offset)
            }
            other => Err(Error::UnsupportedType(format!(
                "VariableWriter does not support type {other:?}"
            ))),
        }
    }

    /// Copy `src` at the row cursor and advance by its word-rounded length.
    /// The pad bytes are already zero from the pre-zeroed buffer.
    pub fn write_unaligned_bytes(
        &mut self,
        buffer: &mut [u8],
        row: usize,
        src: &[u8],
        parent_offset: i64,
    ) -> i64 {
        let at = (self.offsets[row] + self.cursors[row]) as usize;
        buffer[at..at + src.len()].copy_from_slice(src);
        let descriptor = pack_offset_and_size(self.cursors[row] - parent_offset, src.len() as i64);
        self.cursors[row] += round_up_to_word(src.len() as i64);
        descriptor
    }

    /// Layout: num_elems word | element null bitmap | values region |
    /// child backing data.
    fn write_list(
        &mut self,
        buffer: &mut [u8],
        row: usize,
        elem_field: &FieldRef,
        elems: &[RowValue],
        parent_offset: i64,
    ) -> Result<i64> {
        let row_base = self.offsets[row];
        let start = self.cursors[row];
        let num_elems = elems.len();

        let at = (row_base + start) as usize;
        buffer[at..at + 8].copy_from_slice(&(num_elems as i64).to_le_bytes());
        self.cursors[row] += 8;
        if num_elems == 0 {
            return Ok(pack_offset_and_size(start - parent_offset, 8));
        }

        let elem_type = elem_field.data_type();
        debug_assert!(
            classify::is_fixed_length(elem_type) || classify::is_variable_length(elem_type),
            "element stride is only meaningful for classified types"
        );

        // Bitmap and values region are pre-zeroed; reserve them and fill in
        // place below.
        let bitmap_len = bitset_width_bytes(num_elems);
        self.cursors[row] += bitmap_len;
        let elem_size = classify::array_element_size(elem_type);
        self.cursors[row] += round_up_to_word(elem_size * num_elems as i64);

        let bitmap_at = (row_base + start + 8) as usize;
        let values_base = row_base + start + 8 + bitmap_len;

        if classify::is_fixed_length(elem_type) {
            let writer = FixedWriter::try_new(elem_type.clone())?;
            for (i, elem) in elems.iter().enumerate() {
                if elem.is_null() {
                    bit_set(&mut buffer[bitmap_at..], i);
                } else {
                    let slot = (values_base + i as i64 * elem_size) as usize;
                    writer.write_value(elem, &mut buffer[slot..slot + elem_size as usize])?;
                }
            }
        } else {
            for (i, elem) in elems.iter().enumerate() {
                if elem.is_null() {
                    bit_set(&mut buffer[bitmap_at..], i);
                } else {
                    let descriptor = self.write(buffer, row, elem_type, elem, start)?;
                    let slot = (values_base + i as i64 * elem_size) as usize;
                    buffer[slot..slot + 8].copy_from_slice(&descriptor.to_le_bytes());
                }
            }
        }

        Ok(pack_offset_and_size(
            start - parent_offset,
            self.cursors[row] - start,
        ))
    }

    /// Layout: key-array byte length word | key array | value array, with
    /// each half encoded exactly like a standalone list. The length word is
    /// back-patched once the key array's size is known. An empty map still
    /// writes both (empty) halves.
    fn write_map(
        &mut self,
        buffer: &mut [u8],
        row: usize,
        key_field: &FieldRef,
        val_field: &FieldRef,
        pairs: &[(RowValue, RowValue)],
        parent_offset: i64,
    ) -> Result<i64> {
        let row_base = self.offsets[row];
        let start = self.cursors[row];
        self.cursors[row] += 8;

        let keys: Vec<RowValue> = pairs.iter().map(|(k, _)| k.clone()).collect();
        let vals: Vec<RowValue> = pairs.iter().map(|(_, v)| v.clone()).collect();

        let key_descriptor = self.write_list(buffer, row, key_field, &keys, start + 8)?;
        let key_array_size = unpack_size(key_descriptor);

        let at = (row_base + start) as usize;
        buffer[at..at + 8].copy_from_slice(&key_array_size.to_le_bytes());

        self.write_list(buffer, row, val_field, &vals, start + 8 + key_array_size)?;

        Ok(pack_offset_and_size(
            start - parent_offset,
            self.cursors[row] - start,
        ))
    }

    /// Layout: field null bitmap | one 8-byte slot per field | child
    /// backing data. A zero-field struct has a zero-size encoding.
    fn write_struct(
        &mut self,
        buffer: &mut [u8],
        row: usize,
        fields: &Fields,
        members: &[RowValue],
        parent_offset: i64,
    ) -> Result<i64> {
        let row_base = self.offsets[row];
        let start = self.cursors[row];
        let num_fields = fields.len();

        if members.len() != num_fields {
            return Err(Error::UnsupportedType(format!(
                "struct value has {} members for {} fields",
                members.len(),
                num_fields
            )));
        }
        if num_fields == 0 {
            return Ok(pack_offset_and_size(start - parent_offset, 0));
        }

        let bitmap_len = bitset_width_bytes(num_fields);
        self.cursors[row] += bitmap_len + 8 * num_fields as i64;

        let bitmap_at = (row_base + start) as usize;
        let slots_base = row_base + start + bitmap_len;

        for (i, (field, member)) in fields.iter().zip(members).enumerate() {
            if member.is_null() {
                bit_set(&mut buffer[bitmap_at..], i);
                continue;
            }

            let slot = (slots_base + 8 * i as i64) as usize;
            let field_type = field.data_type();
            if classify::is_fixed_length(field_type) {
                let writer = FixedWriter::try_new(field_type.clone())?;
                writer.write_value(member, &mut buffer[slot..slot + 8])?;
            } else {
                let descriptor = self.write(buffer, row, field_type, member, start)?;
                buffer[slot..slot + 8].copy_from_slice(&descriptor.to_le_bytes());
            }
        }

        Ok(pack_offset_and_size(
            start - parent_offset,
            self.cursors[row] - start,
        ))
    }
}

fn mismatch(dtype: &DataType, value: &RowValue) -> Error {
    Error::UnsupportedType(format!(
        "{} value does not match column type {dtype:?}",
        value.type_name()
    ))
}
