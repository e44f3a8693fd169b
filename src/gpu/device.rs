//! GPU tier classification from the unmasked renderer string.

use serde::{Deserialize, Serialize};

/// Coarse GPU capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuTier {
    /// Discrete or recent Apple silicon.
    High,
    /// Mainstream integrated graphics.
    Medium,
    /// Old, mobile-low-end, or software renderers.
    Low,
    /// No usable GPU context.
    None,
}

/// What the device probe found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCapabilities {
    /// Classified tier.
    pub tier: GpuTier,
    /// Renderer string (`"unknown"` when the debug extension is missing).
    pub renderer: String,
    /// Whether WebGL 2 was available.
    pub webgl2: bool,
    /// `MAX_TEXTURE_SIZE` of the probe context.
    pub max_texture_size: u32,
    /// The user asked the OS to reduce motion.
    pub prefers_reduced_motion: bool,
}

impl DeviceCapabilities {
    /// Capabilities of an environment without any GPU context.
    #[must_use]
    pub fn unsupported(renderer: &str, prefers_reduced_motion: bool) -> Self {
        Self {
            tier: GpuTier::None,
            renderer: renderer.to_owned(),
            webgl2: false,
            max_texture_size: 0,
            prefers_reduced_motion,
        }
    }
}

/// Shader budget suggested for a tier.
#[must_use]
pub const fn recommended_max_shaders(tier: GpuTier) -> usize {
    match tier {
        GpuTier::High => 4,
        GpuTier::Medium => 3,
        GpuTier::Low => 1,
        GpuTier::None => 0,
    }
}

/// Classify a renderer. Unrecognized renderers are assumed to be medium.
#[must_use]
pub fn classify_gpu(
    renderer: &str,
    max_texture_size: u32,
    webgl2: bool,
) -> GpuTier {
    if !webgl2 && max_texture_size < 4096 {
        return GpuTier::Low;
    }
    let r = renderer.to_ascii_lowercase();
    if is_high(&r) {
        GpuTier::High
    } else if is_medium(&r) {
        GpuTier::Medium
    } else if is_low(&r) {
        GpuTier::Low
    } else {
        GpuTier::Medium
    }
}

fn is_high(r: &str) -> bool {
    tails(r, "apple m").any(|t| starts_with_digit_in(t, b'1'..=b'9'))
        || ordered(r, &["nvidia", "rtx"])
        || after(r, "nvidia").is_some_and(|rest| {
            tails(rest, "gtx").any(|t| {
                let d = t.trim_start().as_bytes();
                match d {
                    [b'1', b'6'..=b'9', ..] => true,
                    [b'2'..=b'9', b'0'..=b'9', ..] => true,
                    _ => false,
                }
            })
        })
        || after(r, "amd").and_then(|rest| after(rest, "radeon")).is_some_and(
            |rest| {
                tails(rest, "rx").any(|t| {
                    let d = t.trim_start().as_bytes();
                    matches!(d, [b'5', b'6'..=b'9', ..] | [b'6' | b'7', ..])
                })
            },
        )
        || ordered(r, &["amd", "radeon", "pro"])
        || r.contains("apple gpu")
}

fn is_medium(r: &str) -> bool {
    ordered(r, &["intel", "iris"])
        || ordered(r, &["intel", "uhd"])
        || ordered(r, &["amd", "radeon"])
        || ordered(r, &["nvidia", "gtx"])
        || after(r, "adreno").is_some_and(|rest| rest.contains('6'))
        || r.contains("mali-g7")
}

fn is_low(r: &str) -> bool {
    after(r, "intel").is_some_and(|rest| {
        tails(rest, "hd").any(|t| t.trim_start().starts_with("graphics"))
    }) || after(r, "adreno").is_some_and(|rest| {
        rest.bytes().any(|b| (b'2'..=b'5').contains(&b))
    }) || tails(r, "mali-").any(|t| {
        matches!(t.as_bytes(), [b'g' | b't', b'2'..=b'5', ..])
    }) || ["powervr", "swiftshader", "llvmpipe", "mesa"]
        .iter()
        .any(|needle| r.contains(needle))
}

/// Text following the first occurrence of `needle`.
fn after<'a>(hay: &'a str, needle: &str) -> Option<&'a str> {
    hay.find(needle).map(|at| &hay[at + needle.len()..])
}

/// Text following every occurrence of `needle`.
fn tails<'a>(hay: &'a str, needle: &'a str) -> impl Iterator<Item = &'a str> {
    hay.match_indices(needle)
        .map(move |(at, _)| &hay[at + needle.len()..])
}

/// Whether `needles` occur in order (the `a.*b.*c` shape).
fn ordered(hay: &str, needles: &[&str]) -> bool {
    let mut rest = hay;
    for needle in needles {
        match after(rest, needle) {
            Some(tail) => rest = tail,
            None => return false,
        }
    }
    true
}

fn starts_with_digit_in(s: &str, range: std::ops::RangeInclusive<u8>) -> bool {
    s.as_bytes().first().is_some_and(|b| range.contains(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(renderer: &str) -> GpuTier {
        classify_gpu(renderer, 16_384, true)
    }

    #[test]
    fn high_end_renderers() {
        assert_eq!(tier("Apple M2 Pro"), GpuTier::High);
        assert_eq!(tier("ANGLE (NVIDIA GeForce RTX 3080 Direct3D11)"), GpuTier::High);
        assert_eq!(tier("NVIDIA GeForce GTX 1660 SUPER"), GpuTier::High);
        assert_eq!(tier("NVIDIA GeForce GTX 970"), GpuTier::High);
        assert_eq!(tier("AMD Radeon RX 6800 XT"), GpuTier::High);
        assert_eq!(tier("AMD Radeon Pro 5500M"), GpuTier::High);
        assert_eq!(tier("Apple GPU"), GpuTier::High);
    }

    #[test]
    fn medium_renderers() {
        assert_eq!(tier("Intel(R) Iris(R) Xe Graphics"), GpuTier::Medium);
        assert_eq!(tier("Intel(R) UHD Graphics 620"), GpuTier::Medium);
        assert_eq!(tier("NVIDIA GeForce GTX 1050"), GpuTier::Medium);
        assert_eq!(tier("AMD Radeon RX 480"), GpuTier::Medium);
        assert_eq!(tier("Adreno (TM) 640"), GpuTier::Medium);
        assert_eq!(tier("Mali-G76 MC4"), GpuTier::Medium);
    }

    #[test]
    fn low_renderers() {
        assert_eq!(tier("Intel(R) HD Graphics 4000"), GpuTier::Low);
        assert_eq!(tier("Adreno (TM) 530"), GpuTier::Low);
        assert_eq!(tier("Mali-G52 MC2"), GpuTier::Low);
        assert_eq!(tier("Mali-T450 MP2"), GpuTier::Low);
        assert_eq!(tier("PowerVR Rogue GE8320"), GpuTier::Low);
        assert_eq!(tier("Google SwiftShader"), GpuTier::Low);
        assert_eq!(tier("llvmpipe (LLVM 15.0.7, 256 bits)"), GpuTier::Low);
    }

    #[test]
    fn unknown_renderer_is_medium() {
        assert_eq!(tier("unknown"), GpuTier::Medium);
        assert_eq!(tier("Some Future GPU 9000"), GpuTier::Medium);
        // Outside every pattern table.
        assert_eq!(tier("Mali-T830"), GpuTier::Medium);
        assert_eq!(tier("Mali-T720"), GpuTier::Medium);
    }

    #[test]
    fn old_webgl1_hardware_is_low() {
        assert_eq!(classify_gpu("Apple M1", 2048, false), GpuTier::Low);
        assert_eq!(classify_gpu("Apple M1", 8192, false), GpuTier::High);
    }

    #[test]
    fn budgets_per_tier() {
        assert_eq!(recommended_max_shaders(GpuTier::High), 4);
        assert_eq!(recommended_max_shaders(GpuTier::Medium), 3);
        assert_eq!(recommended_max_shaders(GpuTier::Low), 1);
        assert_eq!(recommended_max_shaders(GpuTier::None), 0);
    }
}
