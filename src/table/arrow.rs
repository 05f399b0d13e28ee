// src/table/arrow.rs

use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Array, Float64Array, StringArray},
    datatypes::{DataType, Date32Type, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use super::{columns, CanonicalRecord, CanonicalTable, Lift, Weight};

/// Arrow schema of the canonical column contract.
///
/// - Name, NameNormalized, Equipment, Federation → Utf8 (non-null)
/// - MeetDate                                     → Date32
/// - every *Kg / *Lb and Age                      → Float64
/// - MeetName                                     → Utf8 (nullable)
pub fn canonical_schema() -> Arc<Schema> {
    let float = |name: &str| Field::new(name, DataType::Float64, true);
    Arc::new(Schema::new(vec![
        Field::new(columns::NAME, DataType::Utf8, false),
        Field::new(columns::NAME_NORMALIZED, DataType::Utf8, false),
        Field::new(columns::MEET_DATE, DataType::Date32, true),
        float(columns::SQUAT_KG),
        float(columns::SQUAT_LB),
        float(columns::BENCH_KG),
        float(columns::BENCH_LB),
        float(columns::DEADLIFT_KG),
        float(columns::DEADLIFT_LB),
        float(columns::TOTAL_KG),
        float(columns::TOTAL_LB),
        Field::new(columns::EQUIPMENT, DataType::Utf8, false),
        Field::new(columns::FEDERATION, DataType::Utf8, false),
        float(columns::BODYWEIGHT_KG),
        float(columns::BODYWEIGHT_LB),
        float(columns::AGE),
        Field::new(columns::MEET_NAME, DataType::Utf8, true),
    ]))
}

/// Lay the table out column-wise in `canonical_schema` order.
pub fn to_record_batch(table: &CanonicalTable) -> Result<RecordBatch> {
    let recs = table.records();

    let text = |f: fn(&CanonicalRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(recs.iter().map(f)))
    };
    let weight = |f: fn(&CanonicalRecord) -> Option<Weight>, lb: bool| -> ArrayRef {
        Arc::new(Float64Array::from_iter(recs.iter().map(|r| {
            f(r).map(|w| if lb { w.lb() } else { w.kg() })
        })))
    };
    let lift_pair = |lift: Lift| -> [ArrayRef; 2] {
        let kg: ArrayRef = Arc::new(Float64Array::from_iter(
            recs.iter().map(|r| r.lift(lift).map(|w| w.kg())),
        ));
        let lb: ArrayRef = Arc::new(Float64Array::from_iter(
            recs.iter().map(|r| r.lift(lift).map(|w| w.lb())),
        ));
        [kg, lb]
    };

    let dates: ArrayRef = Arc::new(Date32Array::from_iter(
        recs.iter().map(|r| r.date.map(Date32Type::from_naive_date)),
    ));

    let mut cols: Vec<ArrayRef> = vec![
        text(CanonicalRecord::identity),
        text(CanonicalRecord::identity_key),
        dates,
    ];
    for lift in Lift::ALL {
        cols.extend(lift_pair(lift));
    }
    cols.push(text(|r| r.equipment.as_str()));
    cols.push(text(|r| r.federation.as_str()));
    cols.push(weight(|r| r.bodyweight, false));
    cols.push(weight(|r| r.bodyweight, true));
    cols.push(Arc::new(Float64Array::from_iter(recs.iter().map(|r| r.age))));
    cols.push(Arc::new(StringArray::from_iter(
        recs.iter().map(|r| r.meet.as_deref()),
    )));

    RecordBatch::try_new(canonical_schema(), cols).context("building canonical record batch")
}

/// Rebuild records from a batch with the canonical columns.
///
/// Derived columns (NameNormalized and every *Lb) are not read back; they
/// are recomputed from Name and the *Kg values.
pub fn from_record_batch(batch: &RecordBatch) -> Result<Vec<CanonicalRecord>> {
    let names = string_column(batch, columns::NAME)?;
    let dates = typed_column::<Date32Array>(batch, columns::MEET_DATE)?;
    let squat = typed_column::<Float64Array>(batch, columns::SQUAT_KG)?;
    let bench = typed_column::<Float64Array>(batch, columns::BENCH_KG)?;
    let deadlift = typed_column::<Float64Array>(batch, columns::DEADLIFT_KG)?;
    let total = typed_column::<Float64Array>(batch, columns::TOTAL_KG)?;
    let equipment = string_column(batch, columns::EQUIPMENT)?;
    let federation = string_column(batch, columns::FEDERATION)?;
    let bodyweight = typed_column::<Float64Array>(batch, columns::BODYWEIGHT_KG)?;
    let age = typed_column::<Float64Array>(batch, columns::AGE)?;
    let meet = string_column(batch, columns::MEET_NAME)?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let mut rec = CanonicalRecord::new(opt_str(names, i).unwrap_or_default());
        rec.date = if dates.is_valid(i) {
            dates.value_as_date(i)
        } else {
            None
        };
        rec.set_lift(Lift::Squat, opt_f64(squat, i));
        rec.set_lift(Lift::Bench, opt_f64(bench, i));
        rec.set_lift(Lift::Deadlift, opt_f64(deadlift, i));
        rec.set_lift(Lift::Total, opt_f64(total, i));
        rec.equipment = opt_str(equipment, i).unwrap_or_default();
        rec.federation = opt_str(federation, i).unwrap_or_default();
        rec.bodyweight = opt_f64(bodyweight, i).map(Weight::from_kg);
        rec.age = opt_f64(age, i);
        rec.meet = opt_str(meet, i);
        out.push(rec);
    }
    Ok(out)
}

fn typed_column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("missing column `{}`", name))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("column `{}` has unexpected type", name))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    typed_column::<StringArray>(batch, name)
}

fn opt_str(arr: &StringArray, i: usize) -> Option<String> {
    arr.is_valid(i).then(|| arr.value(i).to_string())
}

fn opt_f64(arr: &Float64Array, i: usize) -> Option<f64> {
    arr.is_valid(i).then(|| arr.value(i))
}
