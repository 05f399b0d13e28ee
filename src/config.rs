// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

use crate::cache::{cache_path_for, TableCache};
use crate::error::IngestError;

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Everything one load call needs. Valid for that call only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoadOptions {
    /// Local CSV to read. Takes precedence over `csv_url`.
    pub csv_path: Option<PathBuf>,
    /// Remote CSV, downloaded into `download_dir` before reading.
    pub csv_url: Option<String>,
    /// Explicit cache artifact; derived per source under `cache_dir` when unset.
    pub cache_path: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub download_dir: PathBuf,
    /// Read at most this many data rows.
    pub nrows: Option<usize>,
    /// Skip the cache read and rebuild from the source.
    pub refresh: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            csv_path: None,
            csv_url: None,
            cache_path: None,
            cache_dir: default_data_dir(),
            download_dir: default_data_dir(),
            nrows: None,
            refresh: false,
        }
    }
}

impl LoadOptions {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            csv_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Load options from a YAML file; absent keys take their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.as_ref().display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.as_ref().display()))
    }

    /// Where the data comes from. Blank strings count as not supplied.
    pub fn source(&self) -> Result<DataSource, IngestError> {
        let path = self
            .csv_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty());
        let url = self
            .csv_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());

        match (path, url) {
            (Some(p), _) => Ok(DataSource::Local(p.clone())),
            (None, Some(u)) => Url::parse(u).map(DataSource::Remote).map_err(|e| {
                IngestError::Configuration(format!("invalid csv_url {:?}: {}", u, e))
            }),
            (None, None) => Err(IngestError::Configuration(
                "either csv_path or csv_url must be provided".into(),
            )),
        }
    }

    /// Cache for `source`: the explicit `cache_path`, or one derived from the source.
    pub fn cache_for(&self, source: &DataSource) -> TableCache {
        match &self.cache_path {
            Some(p) => TableCache::new(p),
            None => TableCache::new(cache_path_for(&source.key(), &self.cache_dir)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Local(PathBuf),
    Remote(Url),
}

impl DataSource {
    /// Identity of the input, used to key the cache.
    pub fn key(&self) -> String {
        match self {
            DataSource::Local(p) => p.display().to_string(),
            DataSource::Remote(u) => u.to_string(),
        }
    }
}
