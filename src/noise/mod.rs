//! Deterministic CPU-side noise texture synthesis.
//!
//! Produces an RGBA8 fractal simplex-noise field for upload as a repeating
//! texture. Sampling a pre-baked texture is much cheaper on low-end mobile
//! GPUs than evaluating simplex noise per fragment.

mod simplex;

use serde::{Deserialize, Serialize};
use simplex::Permutation;

/// Phase offsets of the G and B channels relative to R.
const CHANNEL_OFFSETS: [f64; 3] = [0.0, 100.0, 200.0];

/// Parameters for [`generate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseOptions {
    /// Texture width in pixels.
    pub width: u32,
    /// Texture height in pixels.
    pub height: u32,
    /// Base frequency across the texture.
    pub scale: f64,
    /// Number of fractal octaves. Zero is treated as one.
    pub octaves: u32,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Permutation seed.
    pub seed: u32,
}

impl Default for NoiseOptions {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            scale: 4.0,
            octaves: 4,
            persistence: 0.5,
            seed: 0,
        }
    }
}

/// An RGBA8 texture in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseTexture {
    /// `width * height * 4` bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Generate a fractal simplex-noise texture.
///
/// R holds the noise field; G and B hold phase-shifted copies of the same
/// field, useful for two-axis distortion. Alpha is always 255. Each channel
/// is normalized by the total octave amplitude so it spans the full byte
/// range regardless of octave count.
#[must_use]
pub fn generate(options: &NoiseOptions) -> NoiseTexture {
    let NoiseOptions {
        width,
        height,
        scale,
        persistence,
        seed,
        ..
    } = *options;
    let octaves = options.octaves.max(1);
    let perm = Permutation::seeded(seed);

    let mut data = vec![0u8; width as usize * height as usize * 4];
    if data.is_empty() {
        return NoiseTexture {
            data,
            width,
            height,
        };
    }

    for (idx, pixel) in data.chunks_exact_mut(4).enumerate() {
        let x = (idx % width as usize) as f64;
        let y = (idx / width as usize) as f64;
        let nx = x / f64::from(width) * scale;
        let ny = y / f64::from(height) * scale;

        let mut sums = [0.0f64; 3];
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;
        for _ in 0..octaves {
            for (sum, offset) in sums.iter_mut().zip(CHANNEL_OFFSETS) {
                *sum += perm.simplex2d(
                    nx * frequency + offset,
                    ny * frequency + offset,
                ) * amplitude;
            }
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        for (channel, sum) in pixel.iter_mut().zip(sums) {
            *channel = to_byte(sum, max_amplitude);
        }
        pixel[3] = 255;
    }

    NoiseTexture {
        data,
        width,
        height,
    }
}

fn to_byte(sum: f64, max_amplitude: f64) -> u8 {
    if max_amplitude <= 0.0 || !max_amplitude.is_finite() {
        return 128;
    }
    let unit = (sum / max_amplitude) * 0.5 + 0.5;
    if unit.is_nan() {
        return 128;
    }
    (unit * 255.0).floor().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u32) -> NoiseOptions {
        NoiseOptions {
            width: 16,
            height: 16,
            seed,
            ..NoiseOptions::default()
        }
    }

    #[test]
    fn same_inputs_give_identical_bytes() {
        assert_eq!(generate(&small(7)), generate(&small(7)));
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(generate(&small(0)).data, generate(&small(42)).data);
    }

    #[test]
    fn shape_and_alpha() {
        for (w, h) in [(16, 16), (7, 3), (1, 1), (33, 2)] {
            let tex = generate(&NoiseOptions {
                width: w,
                height: h,
                ..NoiseOptions::default()
            });
            assert_eq!(tex.data.len(), (w * h * 4) as usize);
            assert!(tex.data.chunks_exact(4).all(|px| px[3] == 255));
        }
    }

    #[test]
    fn zero_dimensions_yield_empty_texture() {
        let tex = generate(&NoiseOptions {
            width: 0,
            height: 64,
            ..NoiseOptions::default()
        });
        assert!(tex.data.is_empty());
        assert_eq!(tex.height, 64);
    }

    #[test]
    fn channels_are_correlated_but_distinct() {
        let tex = generate(&NoiseOptions {
            width: 32,
            height: 32,
            ..NoiseOptions::default()
        });
        let differs = tex
            .data
            .chunks_exact(4)
            .any(|px| px[0] != px[1] || px[1] != px[2]);
        assert!(differs);
    }

    #[test]
    fn zero_octaves_behaves_like_one() {
        let zero = generate(&NoiseOptions {
            octaves: 0,
            ..small(3)
        });
        let one = generate(&NoiseOptions {
            octaves: 1,
            ..small(3)
        });
        assert_eq!(zero, one);
    }

    #[test]
    fn output_uses_a_wide_byte_range() {
        let tex = generate(&NoiseOptions {
            width: 128,
            height: 128,
            octaves: 6,
            ..NoiseOptions::default()
        });
        let reds: Vec<u8> = tex.data.chunks_exact(4).map(|px| px[0]).collect();
        let min = reds.iter().copied().min().unwrap();
        let max = reds.iter().copied().max().unwrap();
        assert!(min < 100, "min {min}");
        assert!(max > 155, "max {max}");
    }
}
