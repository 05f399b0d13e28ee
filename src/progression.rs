// src/progression.rs

use chrono::NaiveDate;
use serde::Serialize;

use crate::table::{CanonicalTable, Lift, Unit};

/// One lift result of one lifter on one meet date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionPoint {
    pub date: NaiveDate,
    pub lift: Lift,
    pub weight: f64,
    pub unit: Unit,
    pub meet: Option<String>,
    pub federation: String,
    pub age: Option<f64>,
    pub bodyweight_kg: Option<f64>,
}

/// Chronological lift series for the records whose identity is exactly
/// `identity`. Records without a date and lifts without a value are skipped;
/// records sharing a date keep their table order.
pub fn progression(
    table: &CanonicalTable,
    identity: &str,
    lifts: &[Lift],
    unit: Unit,
) -> Vec<ProgressionPoint> {
    let mut dated: Vec<_> = table
        .iter()
        .filter(|r| r.identity() == identity)
        .filter_map(|r| r.date.map(|d| (d, r)))
        .collect();
    dated.sort_by_key(|(d, _)| *d);

    let mut points = Vec::new();
    for (date, rec) in dated {
        for &lift in lifts {
            if let Some(w) = rec.lift(lift) {
                points.push(ProgressionPoint {
                    date,
                    lift,
                    weight: w.in_unit(unit),
                    unit,
                    meet: rec.meet.clone(),
                    federation: rec.federation.clone(),
                    age: rec.age,
                    bodyweight_kg: rec.bodyweight.map(|b| b.kg()),
                });
            }
        }
    }
    points
}
