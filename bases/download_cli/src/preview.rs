// bases/download_cli/src/preview.rs
use color_eyre::Result;
use media_downloader::ThumbnailResolver;
use std::future::Future;

/// A fetched preview image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub url: String,
    pub bytes: Vec<u8>,
    /// The full size image was missing and the low resolution one was used
    pub fallback: bool,
}

/// Fetch the preview for `source_url`, falling back to the low resolution
/// image when the full size one is not there.
///
/// `get` returns `None` for any non-200 response.
pub async fn fetch_thumbnail<F, Fut>(
    resolver: &ThumbnailResolver,
    source_url: &str,
    get: F,
) -> Result<Option<Thumbnail>>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Option<Vec<u8>>>>,
{
    let Some(url) = resolver.resolve(source_url) else {
        return Ok(None);
    };

    if let Some(bytes) = get(url.clone()).await? {
        return Ok(Some(Thumbnail {
            url,
            bytes,
            fallback: false,
        }));
    }

    tracing::debug!("{} not available, trying the low resolution preview", url);
    let Some(url) = resolver.fallback_for(source_url) else {
        return Ok(None);
    };

    Ok(get(url.clone()).await?.map(|bytes| Thumbnail {
        url,
        bytes,
        fallback: true,
    }))
}

/// Plain HTTP GET, `None` unless the server answers 200
pub async fn http_get(client: &reqwest::Client, url: String) -> Result<Option<Vec<u8>>> {
    let response = client.get(&url).send().await?;
    if response.status() != reqwest::StatusCode::OK {
        tracing::debug!("GET {} returned {}", url, response.status());
        return Ok(None);
    }
    Ok(Some(response.bytes().await?.to_vec()))
}
