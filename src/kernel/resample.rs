//! Bilinear resampling of channel-major feature planes.
//!
//! Uses the half-pixel centre convention (no "align corners"): target
//! coordinate `t` on an axis of length `n_dst` maps to the continuous source
//! coordinate `g = (t + 0.5) * n_src / n_dst - 0.5`. Sampling positions that
//! fall outside the first or last source sample are clamped to that edge
//! sample with a zero blend weight.

/// Source taps and blend weight for one target coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f32,
}

fn tap(t: usize, n_src: usize, n_dst: usize) -> Tap {
    let g = (t as f32 + 0.5) * n_src as f32 / n_dst as f32 - 0.5;
    let i0 = g.floor() as isize;
    let i1 = i0 + 1;
    if i0 < 0 {
        Tap {
            i0: 0,
            i1: 0,
            frac: 0.0,
        }
    } else if i1 as usize >= n_src {
        Tap {
            i0: n_src - 1,
            i1: n_src - 1,
            frac: 0.0,
        }
    } else {
        Tap {
            i0: i0 as usize,
            i1: i1 as usize,
            frac: g - i0 as f32,
        }
    }
}

/// Resize a `(channels, height, width)` channel-major buffer to
/// `(channels, out_height, out_width)`.
///
/// Every channel is resampled independently with the same taps.
///
/// # Panics
/// Panics if `src.len() != channels * height * width` or if a source
/// extent is zero while the target is not.
pub fn resize_bilinear(
    src: &[f32],
    channels: usize,
    height: usize,
    width: usize,
    out_height: usize,
    out_width: usize,
) -> Vec<f32> {
    assert_eq!(
        src.len(),
        channels * height * width,
        "Source buffer does not match ({}, {}, {})",
        channels,
        height,
        width
    );

    let mut dst = vec![0.0f32; channels * out_height * out_width];
    if dst.is_empty() {
        return dst;
    }

    // Taps depend only on the axis, not on the channel.
    let rows: Vec<Tap> = (0..out_height).map(|y| tap(y, height, out_height)).collect();
    let cols: Vec<Tap> = (0..out_width).map(|x| tap(x, width, out_width)).collect();

    let src_plane = height * width;
    let dst_plane = out_height * out_width;
    for (plane, out) in src
        .chunks_exact(src_plane)
        .zip(dst.chunks_exact_mut(dst_plane))
    {
        for (y, ty) in rows.iter().enumerate() {
            let top = &plane[ty.i0 * width..(ty.i0 + 1) * width];
            let bottom = &plane[ty.i1 * width..(ty.i1 + 1) * width];
            let out_row = &mut out[y * out_width..(y + 1) * out_width];

            for (v, tx) in out_row.iter_mut().zip(cols.iter()) {
                let v00 = top[tx.i0];
                let v01 = top[tx.i1];
                let v10 = bottom[tx.i0];
                let v11 = bottom[tx.i1];

                let vx0 = v00 + (v01 - v00) * tx.frac;
                let vx1 = v10 + (v11 - v10) * tx.frac;
                *v = vx0 + (vx1 - vx0) * ty.frac;
            }
        }
    }

    dst
}
