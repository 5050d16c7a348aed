//! Validate thumbnail requests before any network or image work.

use crate::{
    config::Config,
    primitive::{tracing::instrument, *},
};

/// Source URL parameter
pub const URL: &str = "url";
/// Canvas width parameter
pub const WIDTH: &str = "width";
/// Canvas height parameter
pub const HEIGHT: &str = "height";

/// A request that passed validation.
///
/// The URL is still an unchecked string; whether it is a well-formed
/// absolute URL is for the fetcher to decide. Width and height may be
/// zero or negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRequest {
    pub url: String,
    pub width: i64,
    pub height: i64,
}

/// Look up the first non-empty value of a query parameter.
fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

/// Parse a required base-10 integer parameter.
fn dimension(params: &[(String, String)], key: &str) -> Result<i64> {
    let raw = first(params, key).ok_or_else(|| {
        PipelineError::input(format!("{key} parameter is required"))
    })?;
    raw.parse::<i64>().map_err(|_| {
        PipelineError::input(format!("{key} parameter must be a number"))
    })
}

/// Check the query parameters in order: url, width, height.
/// Only the first failure is reported.
///
/// Also enforces the configured canvas bounds so that a client cannot
/// make us allocate an arbitrarily large canvas.
#[instrument(level = "debug", skip_all, err(Display))]
pub fn validate(
    params: &[(String, String)],
    config: &Config,
) -> Result<ThumbnailRequest> {
    let url = first(params, URL)
        .ok_or_else(|| {
            PipelineError::input(format!("{URL} parameter is required"))
        })?
        .to_owned();
    let width = dimension(params, WIDTH)?;
    let height = dimension(params, HEIGHT)?;

    if width > config.max_width {
        return Err(PipelineError::input(format!(
            "{WIDTH} exceeds maximum of {}",
            config.max_width
        )));
    }
    if height > config.max_height {
        return Err(PipelineError::input(format!(
            "{HEIGHT} exceeds maximum of {}",
            config.max_height
        )));
    }

    Ok(ThumbnailRequest { url, width, height })
}
