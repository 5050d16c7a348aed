//! Process and react to thumbnail service requests.
//!
//! One request runs one pipeline:
//!
//! `Start -> Validated -> Fetched -> Fit -> Resampled -> Padded ->
//! Encoded -> Responded`
//!
//! Every stage returns a [`Result`]; the first error ends the request
//! and becomes the response. Nothing is written to the client before
//! the pipeline has either finished or failed.

use std::fmt::{Display, Formatter};

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use image::{
    buffer::ConvertBuffer, codecs::jpeg::JpegEncoder, RgbImage, Rgba,
    RgbaImage,
};
use tracing::{field, Span};

use crate::{
    app::AppState,
    canvas::{pad, resize},
    config::{Config, Filter},
    fetch::{fetch_image, ImageSource},
    geometry::{canvas_axis, fit_inside, Fit},
    primitive::{
        anyhow::{self, Context},
        tracing::instrument,
        *,
    },
    validate::validate,
};

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Validated,
    Fetched,
    Fit,
    Resampled,
    Padded,
    Encoded,
    Responded,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Validated => "validated",
            Stage::Fetched => "fetched",
            Stage::Fit => "fit",
            Stage::Resampled => "resampled",
            Stage::Padded => "padded",
            Stage::Encoded => "encoded",
            Stage::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// Log the cause and the last stage reached, then pass the error on.
fn failed_after(
    reached: Stage,
) -> impl FnOnce(PipelineError) -> PipelineError {
    move |e| {
        tracing::warn!(%reached, cause = %e.cause(), "pipeline failed");
        e
    }
}

/// How to draw the thumbnail, taken from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub filter: Filter,
    pub background: Rgba<u8>,
    pub jpeg_quality: u8,
}

impl From<&Config> for Style {
    fn from(config: &Config) -> Self {
        Self {
            filter: config.filter,
            background: config.background,
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// Fit, resample if needed, and pad `source` onto a `width`x`height`
/// canvas. Non-positive sizes give an empty canvas.
pub fn render(
    source: &RgbaImage,
    width: i64,
    height: i64,
    style: Style,
) -> RgbaImage {
    let (canvas_w, canvas_h) = (canvas_axis(width), canvas_axis(height));
    let fit = fit_inside(source.width(), source.height(), width, height);
    tracing::debug!(stage = %Stage::Fit, ?fit);

    let canvas = match fit {
        Fit::Native => pad(source, canvas_w, canvas_h, style.background),
        Fit::Scale {
            width: inner_w,
            height: inner_h,
        } => {
            let inner = resize(source, inner_w, inner_h, style.filter);
            tracing::debug!(stage = %Stage::Resampled, inner_w, inner_h);
            pad(&inner, canvas_w, canvas_h, style.background)
        }
    };
    tracing::debug!(
        stage = %Stage::Padded,
        width = canvas.width(),
        height = canvas.height()
    );
    canvas
}

/// Encode as baseline JPEG. Alpha is dropped.
///
/// A zero-area canvas has no JPEG representation; it encodes to an
/// empty body.
pub fn encode_jpeg(
    canvas: &RgbaImage,
    quality: u8,
) -> anyhow::Result<Vec<u8>> {
    if canvas.width() == 0 || canvas.height() == 0 {
        return Ok(vec![]);
    }
    let rgb: RgbImage = canvas.convert();
    let mut out = vec![];
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .context("encode_jpeg: cannot write image")?;
    Ok(out)
}

/// Run the whole pipeline for one set of query parameters and return
/// the encoded thumbnail.
pub async fn thumbnail(
    params: &[(String, String)],
    source: &dyn ImageSource,
    config: &Config,
) -> Result<Vec<u8>> {
    let span = Span::current();
    tracing::debug!(stage = %Stage::Start);

    let request =
        validate(params, config).map_err(failed_after(Stage::Start))?;
    span.record("url", request.url.as_str());
    span.record("width", request.width);
    span.record("height", request.height);
    tracing::debug!(stage = %Stage::Validated);

    let raster = fetch_image(source, &request.url, config)
        .await
        .map_err(failed_after(Stage::Validated))?;
    tracing::debug!(
        stage = %Stage::Fetched,
        src_w = raster.width(),
        src_h = raster.height()
    );

    // Pixel work is CPU-bound; keep it off the async workers but inside
    // this request's span.
    let style = Style::from(config);
    let (width, height) = (request.width, request.height);
    let join = tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            let canvas = render(&raster, width, height, style);
            encode_jpeg(&canvas, style.jpeg_quality)
        })
    });
    let encoded = join
        .await
        .context("thumbnail: thread join fail")
        .and_then(|encoded| encoded)
        .map_err(|e| PipelineError::encoding("unable to encode image", e))
        .map_err(failed_after(Stage::Fetched))?;
    tracing::debug!(stage = %Stage::Encoded, size = encoded.len());
    Ok(encoded)
}

/// Serve `GET /thumbnail?url=..&width=..&height=..` as a JPEG of exactly
/// `width`x`height` pixels.
#[instrument(
    skip_all,
    fields(url = field::Empty, width = field::Empty, height = field::Empty)
)]
pub async fn serve_thumbnail(
    State(state): State<AppState>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response> {
    let Query(params) = query
        .map_err(|e| PipelineError::Input {
            cause: "malformed query string".to_owned(),
            source: Some(anyhow::anyhow!("{e}")),
        })
        .map_err(failed_after(Stage::Start))?;

    let encoded =
        thumbnail(&params, state.source.as_ref(), &state.config).await?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CONTENT_LENGTH, encoded.len())
        .body(axum::body::Body::from(encoded))
        .context("thumb jpeg send make response")
        .map_err(|e| PipelineError::encoding("unable to write image", e))
        .map_err(failed_after(Stage::Encoded))?;
    tracing::debug!(stage = %Stage::Responded);
    Ok(response.into_response())
}
