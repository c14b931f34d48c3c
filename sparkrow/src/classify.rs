//! Classification of Arrow types under the row format.
//!
//! The row format splits every supported type into fixed-length (the value
//! lives entirely inside its 8-byte header slot) or variable-length (the
//! slot holds a packed offset-and-size descriptor pointing into the row's
//! backing region). These predicates are queried in per-row loops, so they
//! are plain matches over the closed `DataType` enum rather than anything
//! dynamic.

use arrow::datatypes::{DataType, FieldRef};

use sparkrow_result::{Error, Result};

/// True when values of `dtype` occupy only their header slot.
pub fn is_fixed_length(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Null
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Date32
            | DataType::Timestamp(_, _)
            | DataType::Decimal32(_, _)
            | DataType::Decimal64(_, _)
    )
}

/// True when values of `dtype` spill payload bytes into the backing region.
pub fn is_variable_length(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Utf8
            | DataType::Binary
            | DataType::FixedSizeBinary(_)
            | DataType::Decimal128(_, _)
            | DataType::List(_)
            | DataType::Map(_, _)
            | DataType::Struct(_)
    )
}

/// True when the value's native bytes equal its row-format bytes (possibly
/// after a single endian swap), permitting a straight copy from the array's
/// storage without materializing a tagged value.
pub fn supports_raw_copy(dtype: &DataType) -> bool {
    is_fixed_length(dtype)
        || matches!(
            dtype,
            DataType::Utf8 | DataType::Binary | DataType::FixedSizeBinary(_) | DataType::Decimal128(_, _)
        )
}

/// True when the row format stores the value big-endian while Arrow stores
/// it little-endian. Only 128-bit decimals qualify.
pub fn needs_endian_swap(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Decimal128(_, _))
}

/// Stride of one element slot inside a serialized list's values region.
///
/// Fixed-length elements are packed at their natural width; every
/// variable-length element type takes the 8-byte descriptor slot, which is
/// why the fall-through arm returns 8. An unsupported element type also
/// lands on 8 here, but the writer rejects it before any value is emitted,
/// so the stride is never observed for such types.
pub fn array_element_size(dtype: &DataType) -> i64 {
    match dtype {
        DataType::Int8 | DataType::UInt8 => 1,
        DataType::Int16 | DataType::UInt16 => 2,
        DataType::Int32 | DataType::UInt32 | DataType::Float32 | DataType::Date32 => 4,
        _ => 8,
    }
}

/// Native in-memory width of a fixed-length scalar, used by raw-copy
/// writes. The empty marker type has no bytes at all.
pub fn fixed_value_width(dtype: &DataType) -> usize {
    match dtype {
        DataType::Null => 0,
        DataType::Int8 | DataType::UInt8 => 1,
        DataType::Int16 | DataType::UInt16 => 2,
        DataType::Int32
        | DataType::UInt32
        | DataType::Float32
        | DataType::Date32
        | DataType::Decimal32(_, _) => 4,
        _ => 8,
    }
}

/// Key and value fields of a map type's entries struct.
pub(crate) fn map_entry_fields(dtype: &DataType) -> Result<(&FieldRef, &FieldRef)> {
    if let DataType::Map(entries, _) = dtype
        && let DataType::Struct(fields) = entries.data_type()
        && fields.len() == 2
    {
        return Ok((&fields[0], &fields[1]));
    }
    Err(Error::UnsupportedType(format!(
        "malformed map entries for type {dtype:?}"
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::datatypes::{Field, TimeUnit};

    use super::*;

    #[test]
    fn classification_is_a_partition() {
        let fixed = [
            DataType::Int8,
            DataType::UInt16,
            DataType::Int64,
            DataType::Date32,
            DataType::Timestamp(TimeUnit::Microsecond, None),
            DataType::Decimal32(9, 2),
            DataType::Decimal64(18, 4),
            DataType::Float64,
            DataType::Null,
        ];
        let variable = [
            DataType::Utf8,
            DataType::Binary,
            DataType::FixedSizeBinary(16),
            DataType::Decimal128(38, 10),
            DataType::List(Arc::new(Field::new("item", DataType::Int32, true))),
            DataType::Struct(vec![Field::new("a", DataType::Int32, false)].into()),
        ];

        for dtype in &fixed {
            assert!(is_fixed_length(dtype), "{dtype:?}");
            assert!(!is_variable_length(dtype), "{dtype:?}");
            assert!(supports_raw_copy(dtype), "{dtype:?}");
        }
        for dtype in &variable {
            assert!(is_variable_length(dtype), "{dtype:?}");
            assert!(!is_fixed_length(dtype), "{dtype:?}");
        }

        // Bit-packed booleans cannot satisfy the raw-copy contract.
        assert!(!is_fixed_length(&DataType::Boolean));
        assert!(!is_variable_length(&DataType::Boolean));
    }

    #[test]
    fn raw_copy_covers_string_family_and_wide_decimal() {
        assert!(supports_raw_copy(&DataType::Utf8));
        assert!(supports_raw_copy(&DataType::Decimal128(38, 0)));
        assert!(!supports_raw_copy(&DataType::List(Arc::new(Field::new(
            "item",
            DataType::Int32,
            true
        )))));
    }

    #[test]
    fn element_strides() {
        assert_eq!(array_element_size(&DataType::Int8), 1);
        assert_eq!(array_element_size(&DataType::UInt16), 2);
        assert_eq!(array_element_size(&DataType::Float32), 4);
        assert_eq!(array_element_size(&DataType::Date32), 4);
        assert_eq!(array_element_size(&DataType::Int64), 8);
        // 32-bit decimals widen to a full slot inside lists.
        assert_eq!(array_element_size(&DataType::Decimal32(9, 2)), 8);
        // Variable-length elements store descriptors.
        assert_eq!(array_element_size(&DataType::Utf8), 8);
    }

    #[test]
    fn endian_swap_only_for_decimal128() {
        assert!(needs_endian_swap(&DataType::Decimal128(20, 2)));
        assert!(!needs_endian_swap(&DataType::Decimal64(18, 2)));
        assert!(!needs_endian_swap(&DataType::Utf8));
    }
}
