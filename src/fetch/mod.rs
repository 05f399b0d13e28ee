// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use url::Url;

use crate::error::IngestError;

const DEFAULT_FILE_NAME: &str = "raw.csv";

/// Download `url` into `dest_dir`, named after the last URL path segment.
/// Returns the full path of the saved file.
///
/// Connection failures and non-success statuses surface as
/// `IngestError::Transport`; nothing is retried.
#[tracing::instrument(level = "info", skip(client, url, dest_dir), fields(url = %url))]
pub async fn download_csv(
    client: &Client,
    url: &Url,
    dest_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest_path = dest_dir.as_ref().join(file_name_for(url));

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating download directory {}", parent.display()))?;
    }

    let transport = |e: reqwest::Error| IngestError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let resp = client
        .get(url.as_str())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(transport)?;
    let bytes = resp.bytes().await.map_err(transport)?;

    fs::write(&dest_path, &bytes)
        .await
        .with_context(|| format!("writing download to {}", dest_path.display()))?;
    info!(path = %dest_path.display(), bytes = bytes.len(), "downloaded");

    Ok(dest_path)
}

/// Last non-empty path segment of `url`, or `raw.csv`.
pub fn file_name_for(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_name_from_url() {
        let u = Url::parse("https://example.com/dl/openpowerlifting.csv").unwrap();
        assert_eq!(file_name_for(&u), "openpowerlifting.csv");
        let u = Url::parse("https://example.com/dl/").unwrap();
        assert_eq!(file_name_for(&u), "dl");
        let u = Url::parse("https://example.com").unwrap();
        assert_eq!(file_name_for(&u), "raw.csv");
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() -> Result<()> {
        let dir = tempdir()?;
        // port 9 on localhost: nothing listens there
        let url = Url::parse("http://127.0.0.1:9/data.csv")?;
        let err = download_csv(&Client::new(), &url, dir.path())
            .await
            .unwrap_err();
        let ingest = err
            .downcast_ref::<IngestError>()
            .expect("transport failures are typed");
        assert!(ingest.is_transport());
        Ok(())
    }
}
