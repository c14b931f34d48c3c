//! Writer for fixed-length scalars.
//!
//! A fixed-length value occupies the low bytes of its 8-byte slot; the high
//! bytes stay zero because the whole buffer is zeroed before the write pass
//! begins. Null values never reach this writer — the caller sets the null
//! bit and leaves the slot untouched.

use arrow::datatypes::DataType;

use sparkrow_result::{Error, Result};
use sparkrow_types::RowValue;

use crate::classify;

/// Writes one fixed-length scalar into a row slot or a list values region.
pub struct FixedWriter {
    dtype: DataType,
}

impl FixedWriter {
    /// Fails with [`Error::UnsupportedType`] when `dtype` is not
    /// fixed-length under the classification table.
    pub fn try_new(dtype: DataType) -> Result<Self> {
        if !classify::is_fixed_length(&dtype) {
            return Err(Error::UnsupportedType(format!(
                "FixedWriter does not support type {dtype:?}"
            )));
        }
        Ok(Self { dtype })
    }

    pub fn data_type(&self) -> &DataType {
        &self.dtype
    }

    /// Write a materialized value at its natural width, little-endian.
    ///
    /// 32-bit decimals are the one width exception: the row format widens
    /// them to a sign-extended 64-bit integer.
    pub fn write_value(&self, value: &RowValue, dst: &mut [u8]) -> Result<()> {
        match &self.dtype {
            DataType::Null => Ok(()),
            DataType::Int8 => {
                let v = self.int_value(value)? as i8;
                dst[..1].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::Int16 => {
                let v = self.int_value(value)? as i16;
                dst[..2].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::Int32 => {
                let v = self.int_value(value)? as i32;
                dst[..4].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::Int64 => {
                let v = self.int_value(value)? as i64;
                dst[..8].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::UInt8 => {
                let v = self.int_value(value)? as u8;
                dst[..1].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::UInt16 => {
                let v = self.int_value(value)? as u16;
                dst[..2].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::UInt32 => {
                let v = self.int_value(value)? as u32;
                dst[..4].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::UInt64 => {
                let v = self.int_value(value)? as u64;
                dst[..8].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::Date32 => {
                let v = self.int_value(value)? as i32;
                dst[..4].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::Timestamp(_, _) => {
                let v = self.int_value(value)? as i64;
                dst[..8].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::Float32 => {
                let v = value.as_float().ok_or_else(|| self.mismatch(value))? as f32;
                dst[..4].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::Float64 => {
                let v = value.as_float().ok_or_else(|| self.mismatch(value))?;
                dst[..8].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            DataType::Decimal32(_, _) => {
                // Sign-extend to 64 bits; the slot carries a long.
                let v = value.as_decimal().ok_or_else(|| self.mismatch(value))? as i32;
                dst[..8].copy_from_slice(&(v as i64).to_le_bytes());
                Ok(())
            }
            DataType::Decimal64(_, _) => {
                let v = value.as_decimal().ok_or_else(|| self.mismatch(value))? as i64;
                dst[..8].copy_from_slice(&v.to_le_bytes());
                Ok(())
            }
            other => Err(Error::UnsupportedType(format!(
                "FixedWriter does not support type {other:?}"
            ))),
        }
    }

    /// Copy a value's native little-endian bytes straight from column
    /// storage. `src` must already be exactly the type's natural width.
    pub fn write_raw(&self, src: &[u8], dst: &mut [u8]) {
        debug_assert_eq!(src.len(), classify::fixed_value_width(&self.dtype));
        dst[..src.len()].copy_from_slice(src);
    }

    fn int_value(&self, value: &RowValue) -> Result<i128> {
        value.as_int().ok_or_else(|| self.mismatch(value))
    }

    fn mismatch(&self, value: &RowValue) -> Error {
        Error::UnsupportedType(format!(
            "{} value does not match column type {:?}",
            value.type_name(),
            self.dtype
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_variable_length_types() {
        assert!(matches!(
            FixedWriter::try_new(DataType::Utf8),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn writes_natural_widths() {
        let mut slot = [0u8; 8];
        let writer = FixedWriter::try_new(DataType::Int16).unwrap();
        writer.write_value(&RowValue::Int(-2), &mut slot).unwrap();
        assert_eq!(slot, [0xFE, 0xFF, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn decimal32_sign_extends_to_long() {
        let mut slot = [0u8; 8];
        let writer = FixedWriter::try_new(DataType::Decimal32(9, 2)).unwrap();
        writer
            .write_value(&RowValue::Decimal(-1), &mut slot)
            .unwrap();
        assert_eq!(slot, [0xFF; 8]);
    }

    #[test]
    fn raw_write_copies_native_bytes() {
        let mut slot = [0u8; 8];
        let writer = FixedWriter::try_new(DataType::UInt32).unwrap();
        writer.write_raw(&0xDEAD_BEEFu32.to_le_bytes(), &mut slot);
        assert_eq!(slot, [0xEF, 0xBE, 0xAD, 0xDE, 0, 0, 0, 0]);
    }
}
