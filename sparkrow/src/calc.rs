//! Backing-region size computation, the first of the two passes.
//!
//! [`BackingLengthCalculator::calculate`] reports how many bytes a value
//! adds to its row beyond the fixed header. The write pass advances the
//! row cursor by exactly this amount for the same value; any disagreement
//! between the two is caught by the assembler's invariant check.

use arrow::datatypes::DataType;

use sparkrow_result::{Error, Result};
use sparkrow_types::RowValue;

use crate::classify;
use crate::layout::{bitset_width_bytes, round_up_to_word};

/// Computes the backing-data size a value of one column type occupies.
pub struct BackingLengthCalculator {
    dtype: DataType,
}

impl BackingLengthCalculator {
    /// Fails with [`Error::UnsupportedType`] when `dtype` is neither
    /// fixed-length nor variable-length.
    pub fn try_new(dtype: DataType) -> Result<Self> {
        if !classify::is_fixed_length(&dtype) && !classify::is_variable_length(&dtype) {
            return Err(Error::UnsupportedType(format!(
                "BackingLengthCalculator does not support type {dtype:?}"
            )));
        }
        Ok(Self { dtype })
    }

    pub fn data_type(&self) -> &DataType {
        &self.dtype
    }

    /// Size in bytes `value` contributes to the row's backing region.
    ///
    /// Nulls and fixed-length scalars contribute nothing — they live in
    /// their header slot (or as a null bit). Composites account for their
    /// own sub-headers plus their children, recursively.
    pub fn calculate(&self, value: &RowValue) -> Result<i64> {
        if value.is_null() {
            return Ok(0);
        }

        if classify::is_fixed_length(&self.dtype) {
            return Ok(0);
        }

        match &self.dtype {
            DataType::Utf8 | DataType::Binary | DataType::FixedSizeBinary(_) => {
                let bytes = value.as_bytes().ok_or_else(|| self.mismatch(value))?;
                checked_value_size(round_up_to_word(bytes.len() as i64))
            }
            DataType::Decimal128(_, _) => Ok(16),
            DataType::List(elem_field) => {
                // num_elems word | element null bitmap | values region | child backing
                let RowValue::List(elems) = value else {
                    return Err(self.mismatch(value));
                };
                let num_elems = elems.len();
                let mut size = 8 + bitset_width_bytes(num_elems);

                let elem_type = elem_field.data_type();
                size +=
                    round_up_to_word(classify::array_element_size(elem_type) * num_elems as i64);

                let child = BackingLengthCalculator::try_new(elem_type.clone())?;
                for elem in elems {
                    size += child.calculate(elem)?;
                }
                checked_value_size(size)
            }
            DataType::Map(_, _) => {
                // key-array length word | key array | value array
                let RowValue::Map(pairs) = value else {
                    return Err(self.mismatch(value));
                };
                let (key_field, val_field) = classify::map_entry_fields(&self.dtype)?;

                let keys: Vec<RowValue> = pairs.iter().map(|(k, _)| k.clone()).collect();
                let vals: Vec<RowValue> = pairs.iter().map(|(_, v)| v.clone()).collect();

                let key_calc =
                    BackingLengthCalculator::try_new(DataType::List(key_field.clone()))?;
                let val_calc =
                    BackingLengthCalculator::try_new(DataType::List(val_field.clone()))?;

                let size = 8
                    + key_calc.calculate(&RowValue::List(keys))?
                    + val_calc.calculate(&RowValue::List(vals))?;
                checked_value_size(size)
            }
            DataType::Struct(fields) => {
                // field null bitmap | one 8-byte slot per field | child backing
                let RowValue::Struct(members) = value else {
                    return Err(self.mismatch(value));
                };
                if members.len() != fields.len() {
                    return Err(Error::UnsupportedType(format!(
                        "struct value has {} members for {} fields",
                        members.len(),
                        fields.len()
                    )));
                }
                let num_fields = fields.len();
                let mut size = bitset_width_bytes(num_fields) + 8 * num_fields as i64;
                for (field, member) in fields.iter().zip(members) {
                    let child = BackingLengthCalculator::try_new(field.data_type().clone())?;
                    size += child.calculate(member)?;
                }
                checked_value_size(size)
            }
            other => Err(Error::UnsupportedType(format!(
                "BackingLengthCalculator does not support type {other:?}"
            ))),
        }
    }

    fn mismatch(&self, value: &RowValue) -> Error {
        Error::UnsupportedType(format!(
            "{} value does not match column type {:?}",
            value.type_name(),
            self.dtype
        ))
    }
}

/// The descriptor's size field is 32 bits; a single value larger than that
/// is unrepresentable and must fail here in the length pass, before any
/// buffer is allocated.
fn checked_value_size(size: i64) -> Result<i64> {
    if size > u32::MAX as i64 {
        return Err(Error::InvalidArgumentError(format!(
            "value encoding of {size} bytes exceeds the 32-bit descriptor size field"
        )));
    }
    Ok(size)
}
