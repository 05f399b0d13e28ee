use tracing::debug;

use crate::process::{date_parser, raw_table::RawTable};
use crate::schema::{FieldMapping, SemanticField};
use crate::table::{CanonicalRecord, CanonicalTable, Lift, Weight};

/// Convert raw rows into canonical records using a resolved mapping.
///
/// Never fails: cells that do not parse as their field's type become absent,
/// unresolved fields are absent (numeric/date) or empty (text) in every row.
pub fn convert_to_canonical(raw: &RawTable, mapping: &FieldMapping) -> CanonicalTable {
    let col = |f: SemanticField| mapping.index(f);
    let identity = col(SemanticField::Identity);
    let date = col(SemanticField::Date);
    let lifts = [
        (Lift::Squat, col(SemanticField::Squat)),
        (Lift::Bench, col(SemanticField::Bench)),
        (Lift::Deadlift, col(SemanticField::Deadlift)),
        (Lift::Total, col(SemanticField::Total)),
    ];
    let equipment = col(SemanticField::Equipment);
    let federation = col(SemanticField::Federation);
    let bodyweight = col(SemanticField::Bodyweight);
    let age = col(SemanticField::Age);
    let meet = col(SemanticField::Meet);

    let text = |row: usize, c: Option<usize>| -> String {
        c.and_then(|c| raw.cell(row, c).as_text()).unwrap_or_default()
    };
    let number = |row: usize, c: Option<usize>| -> Option<f64> {
        c.and_then(|c| raw.cell(row, c).as_number())
    };

    let mut records = Vec::with_capacity(raw.num_rows());
    let mut bad_dates = 0usize;
    for row in 0..raw.num_rows() {
        let mut rec = CanonicalRecord::new(text(row, identity));

        if let Some(c) = date {
            let cell = raw.cell(row, c);
            rec.date = cell.as_text().and_then(|s| date_parser::parse_meet_date(&s));
            if rec.date.is_none() && !cell.is_missing() {
                bad_dates += 1;
            }
        }
        for (lift, c) in lifts {
            rec.set_lift(lift, number(row, c));
        }
        rec.equipment = text(row, equipment).trim().to_string();
        rec.federation = text(row, federation).trim().to_string();
        rec.bodyweight = number(row, bodyweight).map(Weight::from_kg);
        rec.age = number(row, age);
        rec.meet = meet
            .and_then(|c| raw.cell(row, c).as_text())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        records.push(rec);
    }

    if bad_dates > 0 {
        debug!(bad_dates, "unparseable dates left absent");
    }
    CanonicalTable::new(records)
}
