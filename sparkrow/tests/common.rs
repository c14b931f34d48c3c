//! Shared fixtures for the integration tests.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Decimal128Array, Float64Array, Int32Array, Int32Builder, Int64Array,
    ListBuilder, StringArray, StructArray, UInt16Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rand::Rng;
use rand::rngs::StdRng;

fn random_string(rng: &mut StdRng) -> String {
    let len = rng.random_range(0..12);
    (0..len)
        .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
        .collect()
}

/// A batch covering every classification the serializer dispatches on:
/// nullable and non-nullable scalars, the string family, wide decimals,
/// and nested list/struct columns.
pub fn random_batch(rng: &mut StdRng, num_rows: usize) -> RecordBatch {
    let int32: Int32Array = (0..num_rows)
        .map(|_| rng.random_bool(0.85).then(|| rng.random::<i32>()))
        .collect();
    let uint16 = UInt16Array::from(
        (0..num_rows)
            .map(|_| rng.random::<u16>())
            .collect::<Vec<_>>(),
    );
    let int64 = Int64Array::from(
        (0..num_rows)
            .map(|_| rng.random::<i64>())
            .collect::<Vec<_>>(),
    );
    let float64: Float64Array = (0..num_rows)
        .map(|_| rng.random_bool(0.9).then(|| rng.random::<f64>()))
        .collect();
    let utf8: StringArray = (0..num_rows)
        .map(|_| rng.random_bool(0.8).then(|| random_string(rng)))
        .collect();
    let decimal = Decimal128Array::from(
        (0..num_rows)
            .map(|_| rng.random_bool(0.8).then(|| rng.random::<i64>() as i128))
            .collect::<Vec<_>>(),
    )
    .with_precision_and_scale(38, 10)
    .expect("valid precision and scale");

    let mut list = ListBuilder::new(Int32Builder::new());
    for _ in 0..num_rows {
        if rng.random_bool(0.85) {
            let len = rng.random_range(0..5);
            for _ in 0..len {
                if rng.random_bool(0.9) {
                    list.values().append_value(rng.random());
                } else {
                    list.values().append_null();
                }
            }
            list.append(true);
        } else {
            list.append(false);
        }
    }
    let list = list.finish();

    let strukt = StructArray::from(vec![
        (
            Arc::new(Field::new("a", DataType::Int64, false)),
            Arc::new(Int64Array::from(
                (0..num_rows)
                    .map(|_| rng.random::<i64>())
                    .collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
        (
            Arc::new(Field::new("b", DataType::Utf8, true)),
            Arc::new(
                (0..num_rows)
                    .map(|_| rng.random_bool(0.7).then(|| random_string(rng)))
                    .collect::<StringArray>(),
            ) as ArrayRef,
        ),
    ]);

    let schema = Schema::new(vec![
        Field::new("int32", DataType::Int32, true),
        Field::new("uint16", DataType::UInt16, false),
        Field::new("int64", DataType::Int64, false),
        Field::new("float64", DataType::Float64, true),
        Field::new("utf8", DataType::Utf8, true),
        Field::new("decimal", DataType::Decimal128(38, 10), true),
        Field::new("list", list.data_type().clone(), true),
        Field::new("struct", strukt.data_type().clone(), false),
    ]);

    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(int32),
            Arc::new(uint16),
            Arc::new(int64),
            Arc::new(float64),
            Arc::new(utf8),
            Arc::new(decimal),
            Arc::new(list),
            Arc::new(strukt),
        ],
    )
    .expect("fixture batch is well formed")
}
