//! Fetch a source image and decode it.
//!
//! The network side sits behind [`ImageSource`] so that the pipeline can
//! run against something other than the real internet (tests, mainly).

use std::{fmt::Debug, io::Cursor};

use async_trait::async_trait;
use image::{io::Limits, RgbaImage};
use reqwest::Url;

use crate::{
    config::Config,
    primitive::{
        anyhow::{self, bail, Context},
        tracing::instrument,
        *,
    },
};

/// Cause for any URL we refuse to even try.
pub const URL_NOT_FOUND: &str = "url not found";
/// Cause for a retrieval or decode failure.
pub const NOT_AN_IMAGE: &str = "url is not an image";
/// Cause for a body over the configured size.
pub const TOO_LARGE: &str = "image is too large";

/// Why a retrieval failed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The body is (or would be) larger than allowed.
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    /// Anything else: connection, timeout, upstream status.
    #[error(transparent)]
    Retrieval(#[from] anyhow::Error),
}

/// Where source images come from.
#[async_trait]
pub trait ImageSource: Debug + Send + Sync {
    /// Retrieve the raw bytes behind `url`, at most `limit` of them.
    async fn retrieve(
        &self,
        url: &Url,
        limit: usize,
    ) -> std::result::Result<Vec<u8>, SourceError>;
}

/// Real HTTP(S) retrieval with a connection pool and a total timeout.
#[derive(Debug, Clone)]
pub struct HttpSource(reqwest::Client);

impl HttpSource {
    /// Build the client from the configured timeout.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .context("build reqwest client")?;
        Ok(Self(client))
    }
}

#[async_trait]
impl ImageSource for HttpSource {
    #[instrument(level = "debug", skip(self, url), fields(url = %url))]
    async fn retrieve(
        &self,
        url: &Url,
        limit: usize,
    ) -> std::result::Result<Vec<u8>, SourceError> {
        let mut response = self
            .0
            .get(url.clone())
            .send()
            .await
            .context("send request")?;
        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "upstream status {}",
                response.status()
            )
            .into());
        }
        if let Some(length) = response.content_length() {
            if length > limit as u64 {
                return Err(SourceError::TooLarge { limit });
            }
        }

        // Dropping `response` on any return below closes the body.
        let mut buf = Vec::with_capacity(limit.min(64 * 1024));
        while let Some(chunk) = response.chunk().await.context("read body")? {
            if buf.len() + chunk.len() > limit {
                return Err(SourceError::TooLarge { limit });
            }
            buf.extend_from_slice(&chunk);
        }
        tracing::debug!(size = buf.len(), "fetched source");
        Ok(buf)
    }
}

/// Check that `raw` is an absolute http(s) URL.
pub fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .with_context(|| format!("parse {raw:?} as absolute URL"))
        .map_err(|e| PipelineError::fetch(URL_NOT_FOUND, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PipelineError::fetch(
            URL_NOT_FOUND,
            anyhow::anyhow!("unsupported scheme {:?}", url.scheme()),
        ));
    }
    Ok(url)
}

/// Decode bytes with whatever registered codec recognizes them.
///
/// The decoder refuses sources larger than `max_dimension` on either
/// axis before allocating for them.
pub fn decode(
    bytes: Vec<u8>,
    max_dimension: u32,
) -> anyhow::Result<RgbaImage> {
    let mut reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("guess image format")?;
    if reader.format().is_none() {
        bail!("unrecognized image format");
    }
    let mut limits = Limits::default();
    limits.max_image_width = Some(max_dimension);
    limits.max_image_height = Some(max_dimension);
    reader.limits(limits);
    let image = reader.decode().context("decode image")?;
    Ok(image.into_rgba8())
}

/// Fetch `raw_url` through `source` and decode it into a raster.
///
/// Decoding happens on the blocking pool.
#[instrument(level = "debug", skip(source, config), err(Display))]
pub async fn fetch_image(
    source: &dyn ImageSource,
    raw_url: &str,
    config: &Config,
) -> Result<RgbaImage> {
    let url = parse_url(raw_url)?;
    let bytes = source
        .retrieve(&url, config.max_fetch_bytes)
        .await
        .map_err(|e| match e {
            SourceError::TooLarge { .. } => {
                PipelineError::fetch(TOO_LARGE, e.into())
            }
            SourceError::Retrieval(e) => PipelineError::fetch(NOT_AN_IMAGE, e),
        })?;

    let max_dimension = config.max_source_dimension;
    tokio::task::spawn_blocking(move || decode(bytes, max_dimension))
        .await
        .context("fetch_image: thread join fail")
        .and_then(|decoded| decoded)
        .map_err(|e| PipelineError::fetch(NOT_AN_IMAGE, e))
}
