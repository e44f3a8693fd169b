use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Page palette as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ThemeColors {
    /// Main brand colour.
    pub primary: String,
    /// Secondary brand colour.
    pub secondary: String,
    /// Highlight colour.
    pub accent: String,
    /// Page background.
    pub background: String,
    /// Text colour.
    pub foreground: String,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            primary: "#5100ff".to_owned(),
            secondary: "#00ff80".to_owned(),
            accent: "#ffcc00".to_owned(),
            background: "#0a0a0f".to_owned(),
            foreground: "#ffffff".to_owned(),
        }
    }
}

impl ThemeColors {
    /// Primary, secondary, and accent as shader colours. Unparseable
    /// entries become black.
    pub fn triad(&self) -> [[f32; 3]; 3] {
        [&self.primary, &self.secondary, &self.accent]
            .map(|hex| hex_to_rgb(hex).unwrap_or([0.0; 3]))
    }
}

/// Parse `#rrggbb` (leading `#` optional) into `0..=1` floats.
pub fn hex_to_rgb(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |at: usize| {
        u8::from_str_radix(&digits[at..at + 2], 16)
            .ok()
            .map(|v| f32::from(v) / 255.0)
    };
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// `r,g,b` with each channel scaled to `0..=255`, for CSS `rgb()`/`rgba()`.
pub fn css_rgb(color: [f32; 3]) -> String {
    let [r, g, b] = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    format!("{r},{g},{b}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        let [r, g, b] = hex_to_rgb("#5100ff").unwrap();
        assert!((r - 0.318).abs() < 1e-3);
        assert_eq!(g, 0.0);
        assert_eq!(b, 1.0);
        assert_eq!(hex_to_rgb("ffffff"), Some([1.0, 1.0, 1.0]));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(hex_to_rgb("#fff"), None);
        assert_eq!(hex_to_rgb("#gg0000"), None);
        assert_eq!(hex_to_rgb(""), None);
        assert_eq!(hex_to_rgb("#ééé"), None);
    }

    #[test]
    fn css_rgb_rounds_and_clamps() {
        assert_eq!(css_rgb([0.318, 0.0, 1.0]), "81,0,255");
        assert_eq!(css_rgb([-1.0, 2.0, 0.5]), "0,255,128");
    }
}
