// src/process/mod.rs
pub mod convert;
pub mod date_parser;
pub mod raw_table;
pub mod utils;

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::schema::{resolve_fields, SemanticField};
use crate::table::CanonicalTable;

pub use convert::convert_to_canonical;
pub use raw_table::{RawTable, RawValue};
pub use utils::normalize_name;

/// Resolve the schema of `raw` and normalize it into canonical records.
pub fn process_table(raw: &RawTable) -> CanonicalTable {
    let mapping = resolve_fields(&raw.headers);

    let unresolved = mapping.unresolved();
    if !unresolved.is_empty() {
        let names: Vec<&str> = unresolved.iter().map(SemanticField::as_str).collect();
        warn!(fields = ?names, "fields not found in source; columns left empty");
    }

    let table = convert_to_canonical(raw, &mapping);
    info!(rows = table.len(), "normalized table");
    table
}

/// Read a CSV file (at most `nrows` data rows) and normalize it.
///
/// Only failing to open or parse the file itself is an error.
#[tracing::instrument(level = "info", skip(csv_path), fields(path = %csv_path.as_ref().display()))]
pub fn process_file<P: AsRef<Path>>(csv_path: P, nrows: Option<usize>) -> Result<CanonicalTable> {
    let raw = RawTable::from_csv_path(&csv_path, nrows)?;
    Ok(process_table(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Lift;
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,liftscope::process=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn csv_file(content: &str) -> Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(content.as_bytes())?;
        Ok(tmp)
    }

    #[test]
    fn normalizes_a_standard_export() -> Result<()> {
        init_test_logging();
        let tmp = csv_file(
            "Name,Date,Best3SquatKg,Best3BenchKg,Best3DeadliftKg,TotalKg\n\
             Jane Doe,2020-01-01,100,50,120,270\n",
        )?;
        let table = process_file(tmp.path(), None)?;

        assert_eq!(table.len(), 1);
        let r = &table[0];
        assert_eq!(r.identity(), "Jane Doe");
        assert_eq!(r.identity_key(), "jane doe");
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(r.squat.map(|w| w.kg()), Some(100.0));
        assert_eq!(r.squat.map(|w| w.lb()), Some(220.46));
        assert_eq!(r.bench.map(|w| w.lb()), Some(110.23));
        assert_eq!(r.deadlift.map(|w| w.lb()), Some(264.55));
        assert_eq!(r.total.map(|w| w.kg()), Some(270.0));
        assert_eq!(r.total.map(|w| w.lb()), Some(595.25));
        Ok(())
    }

    #[test]
    fn unparseable_date_is_absent() -> Result<()> {
        init_test_logging();
        let tmp = csv_file("Name,Date,TotalKg\nJane Doe,n/a,270\n")?;
        let table = process_file(tmp.path(), None)?;
        assert_eq!(table.len(), 1);
        assert!(table[0].date.is_none());
        assert_eq!(table[0].total.map(|w| w.kg()), Some(270.0));
        Ok(())
    }

    #[test]
    fn missing_bench_column_leaves_bench_absent() -> Result<()> {
        init_test_logging();
        let tmp = csv_file(
            "Name,Date,SquatKg,DeadliftKg,TotalKg\n\
             A,2020-01-01,100,120,220\n\
             B,2021-05-05,150,200,350\n",
        )?;
        let table = process_file(tmp.path(), None)?;
        assert_eq!(table.len(), 2);
        for r in &table {
            assert!(r.bench.is_none());
            assert!(r.squat.is_some());
        }
        Ok(())
    }

    #[test]
    fn source_order_is_preserved() -> Result<()> {
        let tmp = csv_file("Lifter\nZed\nAmy\nMo\n")?;
        let table = process_file(tmp.path(), None)?;
        let names: Vec<&str> = table.iter().map(|r| r.identity()).collect();
        assert_eq!(names, vec!["Zed", "Amy", "Mo"]);
        Ok(())
    }

    #[test]
    fn normalizing_twice_gives_the_same_table() {
        let raw = RawTable::new(
            vec!["Name".into(), "Squat".into(), "Date".into(), "Fed".into()],
            vec![
                vec!["A b".into(), "100.5".into(), "2020-01-01".into(), "IPF".into()],
                vec!["C".into(), "x".into(), "bad".into(), RawValue::Missing],
            ],
        );
        assert_eq!(process_table(&raw), process_table(&raw));
    }

    #[test]
    fn pounds_present_iff_kilograms_present() {
        let raw = RawTable::new(
            vec!["Name".into(), "SquatKg".into(), "BenchKg".into(), "BodyweightKg".into()],
            vec![
                vec!["A".into(), "102.5".into(), "".into(), "74.3".into()],
                vec!["B".into(), "".into(), "67.5".into(), "oops".into()],
            ],
        );
        for r in process_table(&raw).iter() {
            for w in Lift::ALL.iter().filter_map(|l| r.lift(*l)).chain(r.bodyweight) {
                assert_eq!(w.lb(), crate::table::round2(w.kg() * crate::table::KG_TO_LB));
            }
        }
    }

    #[test]
    fn bundled_sample_normalizes() -> Result<()> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample.csv");
        let table = process_file(path, None)?;
        assert_eq!(table.len(), 8);
        assert_eq!(table[0].equipment, "Raw");
        assert_eq!(table[0].bodyweight.map(|w| w.kg()), Some(62.3));
        assert_eq!(table[0].meet.as_deref(), Some("Winter Classic"));
        assert!(table[3].date.is_none());
        assert!(table[3].age.is_none());
        assert!(table[4].squat.is_none());
        assert_eq!(table[7].identity(), "");

        let hits = crate::search::fuzzy_search_names(&table, "jane doe", 5);
        assert_eq!(hits[0].identity, "Jane Doe");
        assert_eq!(hits[0].score, 100);
        Ok(())
    }

    #[test]
    fn unreadable_file_is_an_error() {
        assert!(process_file("/no/such/file.csv", None).is_err());
    }
}
