//! Tagged values materialized from Arrow arrays.
//!
//! A [`RowValue`] captures one cell of a column in a type-erased form. The
//! serializer's recursive passes dispatch on the column's `DataType` and
//! read the payload out of the matching variant, so the variants are
//! intentionally wider than any single Arrow type: every integer-backed
//! scalar (including dates and timestamps) lands in [`RowValue::Int`], both
//! float widths land in [`RowValue::Float`], and all decimal widths carry
//! their unscaled value in [`RowValue::Decimal`].

use arrow::array::{
    Array, ArrayRef, BinaryArray, Date32Array, Decimal32Array, Decimal64Array, Decimal128Array,
    FixedSizeBinaryArray, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array,
    Int64Array, ListArray, MapArray, StringArray, StructArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray, UInt8Array,
    UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, TimeUnit};

use sparkrow_result::{Error, Result};

/// One materialized cell of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    Null,
    /// Any integer-backed scalar: signed/unsigned integers, days since
    /// epoch, timestamp ticks.
    Int(i128),
    /// Either float width; `f32` round-trips through `f64` exactly.
    Float(f64),
    /// Unscaled decimal value of any precision.
    Decimal(i128),
    /// UTF-8 or binary payload bytes.
    Bytes(Vec<u8>),
    List(Vec<RowValue>),
    /// Order-preserving key/value pairs.
    Map(Vec<(RowValue, RowValue)>),
    /// Field values in schema order.
    Struct(Vec<RowValue>),
}

macro_rules! impl_from_for_row_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for RowValue {
                fn from(v: $t) -> Self {
                    RowValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_row_value!(Int, i8, i16, i32, i64, i128, u8, u16, u32, u64);
impl_from_for_row_value!(Float, f32, f64);
impl_from_for_row_value!(Bytes, Vec<u8>);

impl From<&str> for RowValue {
    fn from(v: &str) -> Self {
        RowValue::Bytes(v.as_bytes().to_vec())
    }
}

impl RowValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RowValue::Null)
    }

    /// Variant name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            RowValue::Null => "null",
            RowValue::Int(_) => "integer",
            RowValue::Float(_) => "float",
            RowValue::Decimal(_) => "decimal",
            RowValue::Bytes(_) => "bytes",
            RowValue::List(_) => "list",
            RowValue::Map(_) => "map",
            RowValue::Struct(_) => "struct",
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            RowValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<i128> {
        match self {
            RowValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RowValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Materialize the value at `index` of `array`, recursing into nested
    /// children for lists, maps, and structs.
    ///
    /// Struct children are full-length arrays, so `index` applies to them
    /// directly; list and map children arrive pre-sliced from
    /// `ListArray::value` / `MapArray::value` and are walked from zero.
    pub fn from_array(array: &dyn Array, index: usize) -> Result<RowValue> {
        if array.is_null(index) {
            return Ok(RowValue::Null);
        }

        match array.data_type() {
            DataType::Null => Ok(RowValue::Null),
            DataType::Int8 => {
                let arr = downcast::<Int8Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::Int16 => {
                let arr = downcast::<Int16Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::Int32 => {
                let arr = downcast::<Int32Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::Int64 => {
                let arr = downcast::<Int64Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::UInt8 => {
                let arr = downcast::<UInt8Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::UInt16 => {
                let arr = downcast::<UInt16Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::UInt32 => {
                let arr = downcast::<UInt32Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::UInt64 => {
                let arr = downcast::<UInt64Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::Date32 => {
                let arr = downcast::<Date32Array>(array)?;
                Ok(RowValue::Int(arr.value(index) as i128))
            }
            DataType::Timestamp(unit, _) => {
                let ticks = match unit {
                    TimeUnit::Second => downcast::<TimestampSecondArray>(array)?.value(index),
                    TimeUnit::Millisecond => {
                        downcast::<TimestampMillisecondArray>(array)?.value(index)
                    }
                    TimeUnit::Microsecond => {
                        downcast::<TimestampMicrosecondArray>(array)?.value(index)
                    }
                    TimeUnit::Nanosecond => {
                        downcast::<TimestampNanosecondArray>(array)?.value(index)
                    }
                };
                Ok(RowValue::Int(ticks as i128))
            }
            DataType::Float32 => {
                let arr = downcast::<Float32Array>(array)?;
                Ok(RowValue::Float(arr.value(index) as f64))
            }
            DataType::Float64 => {
                let arr = downcast::<Float64Array>(array)?;
                Ok(RowValue::Float(arr.value(index)))
            }
            DataType::Decimal32(_, _) => {
                let arr = downcast::<Decimal32Array>(array)?;
                Ok(RowValue::Decimal(arr.value(index) as i128))
            }
            DataType::Decimal64(_, _) => {
                let arr = downcast::<Decimal64Array>(array)?;
                Ok(RowValue::Decimal(arr.value(index) as i128))
            }
            DataType::Decimal128(_, _) => {
                let arr = downcast::<Decimal128Array>(array)?;
                Ok(RowValue::Decimal(arr.value(index)))
            }
            DataType::Utf8 => {
                let arr = downcast::<StringArray>(array)?;
                Ok(RowValue::Bytes(arr.value(index).as_bytes().to_vec()))
            }
            DataType::Binary => {
                let arr = downcast::<BinaryArray>(array)?;
                Ok(RowValue::Bytes(arr.value(index).to_vec()))
            }
            DataType::FixedSizeBinary(_) => {
                let arr = downcast::<FixedSizeBinaryArray>(array)?;
                Ok(RowValue::Bytes(arr.value(index).to_vec()))
            }
            DataType::List(_) => {
                let arr = downcast::<ListArray>(array)?;
                let elems = arr.value(index);
                let mut values = Vec::with_capacity(elems.len());
                for i in 0..elems.len() {
                    values.push(RowValue::from_array(elems.as_ref(), i)?);
                }
                Ok(RowValue::List(values))
            }
            DataType::Map(_, _) => {
                let arr = downcast::<MapArray>(array)?;
                let entries = arr.value(index);
                let keys = entries.column(0);
                let vals = entries.column(1);
                let mut pairs = Vec::with_capacity(entries.len());
                for i in 0..entries.len() {
                    let key = RowValue::from_array(keys.as_ref(), i)?;
                    let val = RowValue::from_array(vals.as_ref(), i)?;
                    pairs.push((key, val));
                }
                Ok(RowValue::Map(pairs))
            }
            DataType::Struct(fields) => {
                let arr = downcast::<StructArray>(array)?;
                let mut members = Vec::with_capacity(fields.len());
                for i in 0..fields.len() {
                    members.push(RowValue::from_array(arr.column(i).as_ref(), index)?);
                }
                Ok(RowValue::Struct(members))
            }
            other => Err(Error::UnsupportedType(format!(
                "cannot materialize value of type {other:?}"
            ))),
        }
    }

    /// Convenience wrapper over [`RowValue::from_array`] for `ArrayRef`.
    pub fn from_array_ref(array: &ArrayRef, index: usize) -> Result<RowValue> {
        Self::from_array(array.as_ref(), index)
    }
}

fn downcast<T: 'static>(array: &dyn Array) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::UnsupportedType(format!(
            "array downcast failed for declared type {:?}",
            array.data_type()
        ))
    })
}
