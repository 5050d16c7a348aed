//! Command line and environment configuration

use std::time::Duration;

use clap::{Parser, ValueEnum};
use image::{imageops::FilterType, Rgba};

/// Serve fixed-canvas JPEG thumbnails of remote images.
#[derive(Debug, Clone, Parser)]
#[command(version)]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Largest canvas width a client may ask for
    #[arg(long, env = "THUMBPAD_MAX_WIDTH", default_value_t = 4096)]
    pub max_width: i64,

    /// Largest canvas height a client may ask for
    #[arg(long, env = "THUMBPAD_MAX_HEIGHT", default_value_t = 4096)]
    pub max_height: i64,

    /// Largest source body to download, bytes
    #[arg(
        long,
        env = "THUMBPAD_MAX_FETCH_BYTES",
        default_value_t = 25 * 1024 * 1024
    )]
    pub max_fetch_bytes: usize,

    /// Largest source width or height the decoder accepts
    #[arg(
        long,
        env = "THUMBPAD_MAX_SOURCE_DIMENSION",
        default_value_t = 16384
    )]
    pub max_source_dimension: u32,

    /// Total timeout for fetching the source image, seconds
    #[arg(long, env = "THUMBPAD_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub fetch_timeout_secs: u64,

    /// JPEG quality of the thumbnail
    #[arg(
        long,
        env = "THUMBPAD_JPEG_QUALITY",
        default_value_t = 75,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub jpeg_quality: u8,

    /// Resampling filter used when downscaling
    #[arg(
        long,
        env = "THUMBPAD_FILTER",
        value_enum,
        default_value_t = Filter::Lanczos3
    )]
    pub filter: Filter,

    /// Letterbox color as hex RRGGBB
    #[arg(
        long,
        env = "THUMBPAD_BACKGROUND",
        default_value = "000000",
        value_parser = parse_background
    )]
    pub background: Rgba<u8>,
}

impl Config {
    /// The outbound fetch timeout.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Resampling filter.
///
/// The kernels themselves live in [`image::imageops`]; this is the
/// closed set of them we let operators pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Filter {
    /// Nearest neighbor
    Nearest,
    /// Linear (tent), support 1
    Triangle,
    /// Cubic, support 2
    CatmullRom,
    /// Gaussian, support 3
    Gaussian,
    /// Windowed sinc, support 3
    Lanczos3,
}

impl From<Filter> for FilterType {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Nearest => FilterType::Nearest,
            Filter::Triangle => FilterType::Triangle,
            Filter::CatmullRom => FilterType::CatmullRom,
            Filter::Gaussian => FilterType::Gaussian,
            Filter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Parse an opaque color from `RRGGBB`, with or without a leading `#`.
fn parse_background(s: &str) -> Result<Rgba<u8>, String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(format!("expected RRGGBB, got {s:?}"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|e| format!("bad hex in {s:?}: {e}"))
    };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 0xff]))
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config::parse_from(["thumbpad"])
}
