// src/schema/fields.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of semantic attributes every canonical row exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticField {
    Identity,
    Date,
    Squat,
    Bench,
    Deadlift,
    Total,
    Equipment,
    Federation,
    Bodyweight,
    Age,
    Meet,
}

impl SemanticField {
    pub const ALL: [SemanticField; 11] = [
        SemanticField::Identity,
        SemanticField::Date,
        SemanticField::Squat,
        SemanticField::Bench,
        SemanticField::Deadlift,
        SemanticField::Total,
        SemanticField::Equipment,
        SemanticField::Federation,
        SemanticField::Bodyweight,
        SemanticField::Age,
        SemanticField::Meet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticField::Identity => "identity",
            SemanticField::Date => "date",
            SemanticField::Squat => "squat",
            SemanticField::Bench => "bench",
            SemanticField::Deadlift => "deadlift",
            SemanticField::Total => "total",
            SemanticField::Equipment => "equipment",
            SemanticField::Federation => "federation",
            SemanticField::Bodyweight => "bodyweight",
            SemanticField::Age => "age",
            SemanticField::Meet => "meet",
        }
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to try once none of a field's candidates matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Leave the field unresolved.
    Unresolved,
    /// First label containing the keyword.
    Contains(&'static str),
    /// First label starting with the keyword.
    StartsWith(&'static str),
    /// Bind to the first column of the dataset.
    FirstColumn,
}

/// One row of the resolution table: lowercase candidate substrings in
/// priority order (most specific first), then a single fallback.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: SemanticField,
    pub candidates: &'static [&'static str],
    pub fallback: Fallback,
}

/// Evaluated top to bottom; each rule is independent of the others.
pub static RESOLUTION_TABLE: &[FieldRule] = &[
    FieldRule {
        field: SemanticField::Identity,
        candidates: &["name", "lifter"],
        fallback: Fallback::FirstColumn,
    },
    FieldRule {
        field: SemanticField::Date,
        candidates: &["meetdate", "date"],
        fallback: Fallback::Contains("date"),
    },
    FieldRule {
        field: SemanticField::Squat,
        candidates: &["best3squatkg", "best3sqkg", "squatkg", "squat", "sq"],
        fallback: Fallback::Contains("squat"),
    },
    FieldRule {
        field: SemanticField::Bench,
        candidates: &["best3benchkg", "best3bnkg", "benchkg", "bench"],
        fallback: Fallback::Contains("bench"),
    },
    FieldRule {
        field: SemanticField::Deadlift,
        candidates: &[
            "best3deadliftkg",
            "best3dlkg",
            "deadliftkg",
            "deadlift",
            "dead",
        ],
        fallback: Fallback::Contains("dl"),
    },
    FieldRule {
        field: SemanticField::Total,
        candidates: &["totalkg", "total"],
        fallback: Fallback::StartsWith("total"),
    },
    FieldRule {
        field: SemanticField::Equipment,
        candidates: &["equipment", "gear"],
        fallback: Fallback::Unresolved,
    },
    FieldRule {
        field: SemanticField::Federation,
        candidates: &["federation", "fed"],
        fallback: Fallback::Unresolved,
    },
    FieldRule {
        field: SemanticField::Bodyweight,
        candidates: &["bodyweightkg", "bodyweight", "bodywt", "weight"],
        fallback: Fallback::Unresolved,
    },
    FieldRule {
        field: SemanticField::Age,
        candidates: &["age"],
        fallback: Fallback::Unresolved,
    },
    FieldRule {
        field: SemanticField::Meet,
        candidates: &["meetname", "competition"],
        fallback: Fallback::Unresolved,
    },
];
