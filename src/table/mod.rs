// src/table/mod.rs

pub mod arrow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::process::utils::normalize_name;

pub use self::arrow::{canonical_schema, from_record_batch, to_record_batch};

pub const KG_TO_LB: f64 = 2.20462;

/// Column-name contract of the canonical table.
pub mod columns {
    pub const NAME: &str = "Name";
    pub const NAME_NORMALIZED: &str = "NameNormalized";
    pub const MEET_DATE: &str = "MeetDate";
    pub const SQUAT_KG: &str = "SquatKg";
    pub const SQUAT_LB: &str = "SquatLb";
    pub const BENCH_KG: &str = "BenchKg";
    pub const BENCH_LB: &str = "BenchLb";
    pub const DEADLIFT_KG: &str = "DeadliftKg";
    pub const DEADLIFT_LB: &str = "DeadliftLb";
    pub const TOTAL_KG: &str = "TotalKg";
    pub const TOTAL_LB: &str = "TotalLb";
    pub const EQUIPMENT: &str = "Equipment";
    pub const FEDERATION: &str = "Federation";
    pub const BODYWEIGHT_KG: &str = "BodyweightKg";
    pub const BODYWEIGHT_LB: &str = "BodyweightLb";
    pub const AGE: &str = "Age";
    pub const MEET_NAME: &str = "MeetName";
}

/// Round `v` to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// A mass in both units. The pound value only ever comes from `from_kg`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weight {
    kg: f64,
    lb: f64,
}

impl Weight {
    pub fn from_kg(kg: f64) -> Self {
        Self {
            kg,
            lb: round2(kg * KG_TO_LB),
        }
    }

    pub fn kg(&self) -> f64 {
        self.kg
    }

    pub fn lb(&self) -> f64 {
        self.lb
    }

    pub fn in_unit(&self, unit: Unit) -> f64 {
        match unit {
            Unit::Kg => self.kg,
            Unit::Lb => self.lb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Lb,
}

impl Unit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" => Some(Unit::Kg),
            "lb" | "lbs" => Some(Unit::Lb),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Lb => "lb",
        }
    }
}

/// The three primary lifts plus their aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lift {
    Squat,
    Bench,
    Deadlift,
    Total,
}

impl Lift {
    pub const ALL: [Lift; 4] = [Lift::Squat, Lift::Bench, Lift::Deadlift, Lift::Total];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "squat" | "sq" => Some(Lift::Squat),
            "bench" | "bp" => Some(Lift::Bench),
            "deadlift" | "dl" => Some(Lift::Deadlift),
            "total" => Some(Lift::Total),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lift::Squat => "Squat",
            Lift::Bench => "Bench",
            Lift::Deadlift => "Deadlift",
            Lift::Total => "Total",
        }
    }

    /// Canonical column holding this lift in `unit`.
    pub fn column(&self, unit: Unit) -> &'static str {
        use columns::*;
        match (self, unit) {
            (Lift::Squat, Unit::Kg) => SQUAT_KG,
            (Lift::Squat, Unit::Lb) => SQUAT_LB,
            (Lift::Bench, Unit::Kg) => BENCH_KG,
            (Lift::Bench, Unit::Lb) => BENCH_LB,
            (Lift::Deadlift, Unit::Kg) => DEADLIFT_KG,
            (Lift::Deadlift, Unit::Lb) => DEADLIFT_LB,
            (Lift::Total, Unit::Kg) => TOTAL_KG,
            (Lift::Total, Unit::Lb) => TOTAL_LB,
        }
    }
}

/// One normalized competition result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    identity: String,
    identity_key: String,
    pub date: Option<NaiveDate>,
    pub squat: Option<Weight>,
    pub bench: Option<Weight>,
    pub deadlift: Option<Weight>,
    pub total: Option<Weight>,
    /// Empty when the source has no equipment column.
    pub equipment: String,
    /// Empty when the source has no federation column.
    pub federation: String,
    pub bodyweight: Option<Weight>,
    pub age: Option<f64>,
    pub meet: Option<String>,
}

impl CanonicalRecord {
    /// A record with every other field absent or empty.
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        let identity_key = normalize_name(&identity);
        Self {
            identity,
            identity_key,
            date: None,
            squat: None,
            bench: None,
            deadlift: None,
            total: None,
            equipment: String::new(),
            federation: String::new(),
            bodyweight: None,
            age: None,
            meet: None,
        }
    }

    /// Display name, casing as the source gave it.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Matching key derived from `identity`.
    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    pub fn lift(&self, lift: Lift) -> Option<Weight> {
        match lift {
            Lift::Squat => self.squat,
            Lift::Bench => self.bench,
            Lift::Deadlift => self.deadlift,
            Lift::Total => self.total,
        }
    }

    pub fn set_lift(&mut self, lift: Lift, kg: Option<f64>) {
        let w = kg.map(Weight::from_kg);
        match lift {
            Lift::Squat => self.squat = w,
            Lift::Bench => self.bench = w,
            Lift::Deadlift => self.deadlift = w,
            Lift::Total => self.total = w,
        }
    }
}

/// Canonical rows in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalTable {
    records: Vec<CanonicalRecord>,
}

impl CanonicalTable {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&CanonicalRecord> {
        self.records.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Distinct non-empty identities, in first-appearance order.
    pub fn unique_identities(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .map(|r| r.identity())
            .filter(|name| !name.is_empty() && seen.insert(*name))
            .collect()
    }
}

impl Index<usize> for CanonicalTable {
    type Output = CanonicalRecord;

    fn index(&self, idx: usize) -> &CanonicalRecord {
        &self.records[idx]
    }
}

impl<'a> IntoIterator for &'a CanonicalTable {
    type Item = &'a CanonicalRecord;
    type IntoIter = std::slice::Iter<'a, CanonicalRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
