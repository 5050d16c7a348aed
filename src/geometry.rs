//! Aspect-fit and letterbox geometry.
//!
//! Pure arithmetic, no pixels. Requested sizes come straight from the
//! client and may be zero or negative; a non-positive axis is treated
//! as empty and never divides.

/// Clamp a requested canvas axis to a pixel count.
pub fn canvas_axis(requested: i64) -> u32 {
    requested.clamp(0, u32::MAX as i64) as u32
}

/// Outcome of fitting a source into the requested box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// The source already fits on both axes: pad it at native size.
    Native,
    /// Downscale to this inner size first, then pad.
    Scale { width: u32, height: u32 },
}

/// Decide how a `src_w`x`src_h` source goes into a `target_w`x`target_h`
/// canvas, preserving the source aspect ratio ("contain").
///
/// With `ratio = src_w / src_h`, the width binds when
/// `target_h * ratio > target_w`, giving `(target_w, target_w / ratio)`;
/// otherwise the height binds, giving `(target_h * ratio, target_h)`.
/// Fractions are truncated. A non-empty axis never truncates below one
/// pixel, so extreme ratios become a line rather than nothing.
///
/// An empty target or source axis gives an inner size of 0 on that axis
/// only; there is no ratio to keep, so the other axis is the source
/// clipped to the target.
pub fn fit_inside(src_w: u32, src_h: u32, target_w: i64, target_h: i64) -> Fit {
    let (tw, th) = (canvas_axis(target_w), canvas_axis(target_h));
    if src_w <= tw && src_h <= th {
        return Fit::Native;
    }
    if tw == 0 || th == 0 || src_w == 0 || src_h == 0 {
        return Fit::Scale {
            width: src_w.min(tw),
            height: src_h.min(th),
        };
    }

    let ratio = src_w as f64 / src_h as f64;
    let (width, height) = if th as f64 * ratio > tw as f64 {
        (tw, (tw as f64 / ratio) as u32)
    } else {
        ((th as f64 * ratio) as u32, th)
    };
    Fit::Scale {
        width: width.clamp(1, tw),
        height: height.clamp(1, th),
    }
}

/// Offsets that center an `inner_w`x`inner_h` raster on a
/// `outer_w`x`outer_h` canvas.
///
/// Integer division truncates toward zero, so an odd leftover pixel
/// always lands on the right or bottom edge.
pub fn center_offsets(
    outer_w: u32,
    outer_h: u32,
    inner_w: u32,
    inner_h: u32,
) -> (i64, i64) {
    (
        (outer_w as i64 - inner_w as i64) / 2,
        (outer_h as i64 - inner_h as i64) / 2,
    )
}
