use crate::core::staging::StagedFile;
use crate::error::DownloadError;
use crate::utils::constants::FALLBACK_DOWNLOAD_NAME;
use crate::utils::urls::{is_fetchable, last_path_segment, to_url};
use futures::TryStreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

/// Streams `raw_url` into a fresh staged file. The client's timeout bounds the
/// whole transfer and `max_bytes` its size. Nothing is left on disk when this
/// returns an error.
pub async fn fetch_to_staging(
    client: &Client,
    raw_url: &str,
    upload_dir: &Path,
    max_bytes: usize,
) -> Result<StagedFile, DownloadError> {
    let url = to_url(raw_url).map_err(|e| DownloadError::InvalidUrl {
        url: raw_url.to_string(),
        reason: e.to_string(),
    })?;
    if !is_fetchable(&url) {
        return Err(DownloadError::InvalidUrl {
            url: raw_url.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| DownloadError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let too_large = || DownloadError::TooLarge {
        url: url.to_string(),
        limit: max_bytes,
    };
    if response
        .content_length()
        .is_some_and(|len| len > max_bytes as u64)
    {
        return Err(too_large());
    }

    let filename = last_path_segment(&url).unwrap_or_else(|| FALLBACK_DOWNLOAD_NAME.to_string());
    let (staged, mut file) = StagedFile::create(upload_dir, &filename).await?;

    let stream = response.bytes_stream().map_err(std::io::Error::other);
    // one byte past the cap is enough to tell an oversized body apart
    let reader = StreamReader::new(stream).take(max_bytes as u64 + 1);
    tokio::pin!(reader);
    let bytes = tokio::io::copy(&mut reader, &mut file).await?;
    if bytes > max_bytes as u64 {
        return Err(too_large());
    }
    file.flush().await?;

    tracing::info!(url = %url, path = %staged.path().display(), bytes, "downloaded remote file");
    Ok(staged)
}
