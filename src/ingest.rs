// src/ingest.rs

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

use crate::cache::{CacheLookup, MissReason, TableCache};
use crate::config::{DataSource, LoadOptions};
use crate::error::IngestError;
use crate::fetch;
use crate::process;
use crate::table::CanonicalTable;

/// Load a canonical table for `opts`, fetching a remote source first.
///
/// Order: resolve the source (configuration error if there is none), try the
/// cache unless `refresh` is set or a local source is newer than the
/// artifact, download when remote, normalize on the
/// blocking pool, then write the cache. Cache failures never fail the load.
#[tracing::instrument(level = "info", skip_all)]
pub async fn load_dataset(client: &Client, opts: &LoadOptions) -> Result<CanonicalTable> {
    let source = opts.source()?;
    let cache = opts.cache_for(&source);
    if let Some(table) = try_cache(&cache, &source, opts) {
        return Ok(table);
    }

    let csv_path = match &source {
        DataSource::Local(p) => p.clone(),
        DataSource::Remote(url) => fetch::download_csv(client, url, &opts.download_dir).await?,
    };

    let nrows = opts.nrows;
    let table = tokio::task::spawn_blocking(move || process::process_file(&csv_path, nrows))
        .await
        .context("normalizer task failed")??;

    persist(&cache, &table);
    Ok(table)
}

/// Synchronous load for sources that need no network.
///
/// A remote source is served only from its cache; on a miss this returns a
/// configuration error pointing at `load_dataset`.
#[tracing::instrument(level = "info", skip_all)]
pub fn load_local(opts: &LoadOptions) -> Result<CanonicalTable> {
    let source = opts.source()?;
    let cache = opts.cache_for(&source);
    if let Some(table) = try_cache(&cache, &source, opts) {
        return Ok(table);
    }

    let DataSource::Local(csv_path) = &source else {
        return Err(IngestError::Configuration(format!(
            "{} is remote and not cached; fetch it with load_dataset",
            source.key()
        ))
        .into());
    };

    let table = process::process_file(csv_path, opts.nrows)?;
    persist(&cache, &table);
    Ok(table)
}

fn try_cache(
    cache: &TableCache,
    source: &DataSource,
    opts: &LoadOptions,
) -> Option<CanonicalTable> {
    if opts.refresh {
        info!(path = %cache.path().display(), "refresh requested; skipping cache");
        return None;
    }
    let lookup = match source {
        DataSource::Local(path) => cache.lookup_for_source(path),
        DataSource::Remote(_) => cache.lookup(),
    };
    match lookup {
        CacheLookup::Hit(table) => Some(table),
        CacheLookup::Miss(MissReason::Absent) => None,
        CacheLookup::Miss(MissReason::Stale) => {
            info!(path = %cache.path().display(), "source changed since cache was written");
            None
        }
        CacheLookup::Miss(MissReason::Unreadable(reason)) => {
            warn!(path = %cache.path().display(), %reason, "ignoring unreadable cache");
            None
        }
    }
}

fn persist(cache: &TableCache, table: &CanonicalTable) {
    if let Err(e) = cache.store(table) {
        warn!(path = %cache.path().display(), error = %format!("{:#}", e), "cache write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf, time::Duration};
    use tempfile::{tempdir, TempDir};

    const CSV: &str = "Name,Date,Best3SquatKg,Best3BenchKg,Best3DeadliftKg,TotalKg\n\
                       Jane Doe,2020-01-01,100,50,120,270\n\
                       John Roe,2021-06-12,180,120,220,520\n";

    fn workspace() -> Result<(TempDir, LoadOptions)> {
        let dir = tempdir()?;
        let csv = dir.path().join("results.csv");
        fs::write(&csv, CSV)?;
        let opts = LoadOptions {
            csv_path: Some(csv),
            cache_dir: dir.path().join("cache"),
            download_dir: dir.path().join("downloads"),
            ..LoadOptions::default()
        };
        Ok((dir, opts))
    }

    #[test]
    fn neither_source_is_a_configuration_error() {
        let err = load_local(&LoadOptions::default()).unwrap_err();
        let ingest = err.downcast_ref::<IngestError>().expect("typed error");
        assert!(ingest.is_configuration());
    }

    #[test]
    fn second_load_is_served_from_cache() -> Result<()> {
        let (_dir, opts) = workspace()?;
        let first = load_local(&opts)?;
        assert_eq!(first.len(), 2);

        let source = opts.source()?;
        assert!(opts.cache_for(&source).path().exists());

        // the source is gone; only the cache can answer
        fs::remove_file(opts.csv_path.as_ref().unwrap())?;
        let second = load_local(&opts)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn refresh_bypasses_the_cache() -> Result<()> {
        let (_dir, mut opts) = workspace()?;
        load_local(&opts)?;

        let csv = opts.csv_path.clone().unwrap();
        fs::write(&csv, "Name,TotalKg\nOnly One,300\n")?;
        opts.refresh = true;
        let fresh = load_local(&opts)?;
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].identity(), "Only One");
        Ok(())
    }

    #[test]
    fn edited_source_is_reloaded_without_refresh() -> Result<()> {
        let (_dir, opts) = workspace()?;
        assert_eq!(load_local(&opts)?.len(), 2);

        let csv = opts.csv_path.clone().unwrap();
        fs::write(&csv, "Name,TotalKg\nOnly One,300\n")?;
        let cache_written = fs::metadata(opts.cache_for(&opts.source()?).path())?.modified()?;
        fs::File::options()
            .write(true)
            .open(&csv)?
            .set_modified(cache_written + Duration::from_secs(60))?;

        let reloaded = load_local(&opts)?;
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].identity(), "Only One");
        Ok(())
    }

    #[test]
    fn cache_write_failure_does_not_fail_the_load() -> Result<()> {
        let (dir, mut opts) = workspace()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x")?;
        opts.cache_path = Some(blocker.join("cache.parquet"));
        let table = load_local(&opts)?;
        assert_eq!(table.len(), 2);
        Ok(())
    }

    #[test]
    fn corrupt_cache_falls_back_to_source() -> Result<()> {
        let (dir, mut opts) = workspace()?;
        let cache_path = dir.path().join("bad.parquet");
        fs::write(&cache_path, b"garbage")?;
        opts.cache_path = Some(cache_path);
        assert_eq!(load_local(&opts)?.len(), 2);
        Ok(())
    }

    #[test]
    fn uncached_remote_source_needs_fetching() -> Result<()> {
        let dir = tempdir()?;
        let opts = LoadOptions {
            cache_dir: dir.path().to_path_buf(),
            ..LoadOptions::from_url("https://example.com/openpl.csv")
        };
        let err = load_local(&opts).unwrap_err();
        assert!(err
            .downcast_ref::<IngestError>()
            .is_some_and(IngestError::is_configuration));
        Ok(())
    }

    #[test]
    fn missing_local_file_is_an_error() {
        let opts = LoadOptions {
            refresh: true,
            ..LoadOptions::from_path(PathBuf::from("/no/such/results.csv"))
        };
        assert!(load_local(&opts).is_err());
    }

    #[tokio::test]
    async fn async_load_reads_local_files() -> Result<()> {
        let (_dir, opts) = workspace()?;
        let table = load_dataset(&Client::new(), &opts).await?;
        assert_eq!(table.len(), 2);
        assert_eq!(table[1].total.map(|w| w.lb()), Some(1146.4));
        Ok(())
    }

    #[tokio::test]
    async fn async_load_without_source_is_a_configuration_error() {
        let err = load_dataset(&Client::new(), &LoadOptions::default())
            .await
            .unwrap_err();
        assert!(err
            .downcast_ref::<IngestError>()
            .is_some_and(IngestError::is_configuration));
    }
}
