// src/cache/mod.rs

use anyhow::{Context, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::table::{canonical_schema, from_record_batch, to_record_batch, CanonicalTable};

/// Outcome of a cache read.
#[derive(Debug)]
pub enum CacheLookup {
    Hit(CanonicalTable),
    Miss(MissReason),
}

#[derive(Debug)]
pub enum MissReason {
    /// No artifact at the cache location.
    Absent,
    /// An artifact exists but could not be read or decoded.
    Unreadable(String),
    /// The source file was modified after the artifact was written.
    Stale,
}

/// A canonical table persisted as a single Parquet file.
///
/// Holds no locks: callers serialize access to one location themselves.
#[derive(Debug, Clone)]
pub struct TableCache {
    path: PathBuf,
}

impl TableCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached table. Any failure is reported as a miss.
    pub fn lookup(&self) -> CacheLookup {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "cache absent");
            return CacheLookup::Miss(MissReason::Absent);
        }
        match self.read() {
            Ok(table) => {
                info!(path = %self.path.display(), rows = table.len(), "cache hit");
                CacheLookup::Hit(table)
            }
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "cache unreadable");
                CacheLookup::Miss(MissReason::Unreadable(format!("{:#}", e)))
            }
        }
    }

    /// Like `lookup`, but a local `source` modified after the artifact turns
    /// the read into a miss. A source that cannot be stat'ed does not
    /// invalidate the artifact.
    pub fn lookup_for_source(&self, source: &Path) -> CacheLookup {
        let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
        if let (Some(src), Some(artifact)) = (modified(source), modified(&self.path)) {
            if src > artifact {
                debug!(
                    path = %self.path.display(),
                    source = %source.display(),
                    "cache older than source"
                );
                return CacheLookup::Miss(MissReason::Stale);
            }
        }
        self.lookup()
    }

    fn read(&self) -> Result<CanonicalTable> {
        let file = File::open(&self.path)
            .with_context(|| format!("opening cache {}", self.path.display()))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .context("reading cache metadata")?
            .build()
            .context("building cache reader")?;

        let mut records = Vec::new();
        for batch in reader {
            let batch = batch.context("reading cache batch")?;
            records.extend(from_record_batch(&batch)?);
        }
        Ok(CanonicalTable::new(records))
    }

    /// Persist `table`, replacing any previous artifact.
    ///
    /// Writes to a sibling temp file first so a failed write never leaves a
    /// truncated artifact behind.
    pub fn store(&self, table: &CanonicalTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("parquet.tmp");
        let batch = to_record_batch(table)?;
        let file =
            File::create(&tmp).with_context(|| format!("creating cache file {}", tmp.display()))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(file, canonical_schema(), Some(props))
            .context("creating parquet writer for cache")?;
        writer.write(&batch).context("writing cache batch")?;
        writer.close().context("closing cache writer")?;

        fs::rename(&tmp, &self.path)
            .with_context(|| format!("moving cache into place at {}", self.path.display()))?;
        info!(path = %self.path.display(), rows = table.len(), "cache written");
        Ok(())
    }
}

/// Deterministic cache file for a source key (a path or URL) under `cache_dir`.
pub fn cache_path_for(source_key: &str, cache_dir: &Path) -> PathBuf {
    const MAX_STEM: usize = 96;

    let mut stem = String::with_capacity(source_key.len());
    for c in source_key.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem: String = stem.trim_matches('_').chars().take(MAX_STEM).collect();

    if stem.is_empty() {
        cache_dir.join("processed.parquet")
    } else {
        cache_dir.join(format!("processed-{}.parquet", stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{CanonicalRecord, Lift};
    use chrono::NaiveDate;
    use std::time::Duration;
    use tempfile::tempdir;

    fn sample() -> CanonicalTable {
        let mut a = CanonicalRecord::new("Jane Doe");
        a.date = NaiveDate::from_ymd_opt(2020, 1, 1);
        a.set_lift(Lift::Squat, Some(100.0));
        a.federation = "IPF".into();
        CanonicalTable::new(vec![a, CanonicalRecord::new("John Roe")])
    }

    #[test]
    fn absent_artifact_is_a_miss() -> Result<()> {
        let dir = tempdir()?;
        let cache = TableCache::new(dir.path().join("nope.parquet"));
        assert!(matches!(cache.lookup(), CacheLookup::Miss(MissReason::Absent)));
        Ok(())
    }

    #[test]
    fn stored_table_is_a_hit() -> Result<()> {
        let dir = tempdir()?;
        let cache = TableCache::new(dir.path().join("nested/dir/cache.parquet"));
        let table = sample();
        cache.store(&table)?;
        match cache.lookup() {
            CacheLookup::Hit(back) => assert_eq!(back, table),
            other => panic!("expected hit, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn corrupt_artifact_is_a_miss() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("cache.parquet");
        fs::write(&path, b"definitely not parquet")?;
        let cache = TableCache::new(&path);
        assert!(matches!(
            cache.lookup(),
            CacheLookup::Miss(MissReason::Unreadable(_))
        ));
        Ok(())
    }

    #[test]
    fn source_edited_after_store_is_stale() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("results.csv");
        fs::write(&source, "Name\nJane Doe\n")?;
        let cache = TableCache::new(dir.path().join("cache.parquet"));
        cache.store(&sample())?;
        assert!(matches!(cache.lookup_for_source(&source), CacheLookup::Hit(_)));

        let later = fs::metadata(cache.path())?.modified()? + Duration::from_secs(60);
        File::options().write(true).open(&source)?.set_modified(later)?;
        assert!(matches!(
            cache.lookup_for_source(&source),
            CacheLookup::Miss(MissReason::Stale)
        ));

        // a vanished source leaves the artifact usable
        fs::remove_file(&source)?;
        assert!(matches!(cache.lookup_for_source(&source), CacheLookup::Hit(_)));
        Ok(())
    }

    #[test]
    fn store_into_unwritable_location_fails() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x")?;
        // parent "directory" is a regular file
        let cache = TableCache::new(blocker.join("cache.parquet"));
        assert!(cache.store(&sample()).is_err());
        Ok(())
    }

    #[test]
    fn cache_paths_are_deterministic_and_distinct() {
        let dir = Path::new("data");
        let a = cache_path_for("data/sample.csv", dir);
        assert_eq!(a, cache_path_for("data/sample.csv", dir));
        assert_eq!(a, Path::new("data/processed-data_sample_csv.parquet"));
        assert_ne!(a, cache_path_for("data/other.csv", dir));
        assert_eq!(cache_path_for("///", dir), Path::new("data/processed.parquet"));
    }
}
