use anyhow::{bail, Context, Result};
use liftscope::{
    cache::{CacheLookup, MissReason, TableCache},
    table::{columns, CanonicalRecord, CanonicalTable, Lift, Unit},
};
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{env, fs::File, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: path to a cache file.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <CACHE_PARQUET>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_cache(Path::new(&args[1])) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print file-level Parquet metadata, then how many rows carry each canonical column.
fn inspect_cache(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = SerializedFileReader::new(file).context("reading parquet metadata")?;
    let meta = reader.metadata();
    let file_meta = meta.file_metadata();

    println!("=== Cache File: {} ===", path.display());
    println!(
        "Created by:           {}",
        file_meta.created_by().unwrap_or("<unknown>")
    );
    println!("Total rows:           {}", file_meta.num_rows());
    println!("Number of row groups: {}", meta.num_row_groups());
    println!("File-size on disk:    {} bytes", std::fs::metadata(path)?.len());
    println!();

    let table = match TableCache::new(path).lookup() {
        CacheLookup::Hit(t) => t,
        CacheLookup::Miss(MissReason::Absent) => bail!("{} does not exist", path.display()),
        CacheLookup::Miss(MissReason::Unreadable(reason)) => {
            bail!("not a canonical table: {}", reason)
        }
        CacheLookup::Miss(MissReason::Stale) => bail!("{} is stale", path.display()),
    };

    println!("=== Columns (present / total) ===");
    for (name, present) in presence(&table) {
        println!("- {:<16} {:>8} / {}", name, present, table.len());
    }
    println!();
    println!("Distinct lifters:     {}", table.unique_identities().len());
    Ok(())
}

fn presence(table: &CanonicalTable) -> Vec<(&'static str, usize)> {
    let count = |f: &dyn Fn(&CanonicalRecord) -> bool| table.iter().filter(|r| f(r)).count();

    let mut out = vec![
        (columns::NAME, count(&|r| !r.identity().is_empty())),
        (columns::MEET_DATE, count(&|r| r.date.is_some())),
    ];
    for lift in Lift::ALL {
        out.push((lift.column(Unit::Kg), count(&|r| r.lift(lift).is_some())));
    }
    out.push((columns::EQUIPMENT, count(&|r| !r.equipment.is_empty())));
    out.push((columns::FEDERATION, count(&|r| !r.federation.is_empty())));
    out.push((columns::BODYWEIGHT_KG, count(&|r| r.bodyweight.is_some())));
    out.push((columns::AGE, count(&|r| r.age.is_some())));
    out.push((columns::MEET_NAME, count(&|r| r.meet.is_some())));
    out
}
