//! Per-section shader selection with typed parameters.
//!
//! On the wire a section is `{shader, priority, params, fallback}` where the
//! shape of `params` depends on `shader`. In memory the pair collapses into
//! one [`ShaderParams`] variant, so a section can never carry parameters for
//! the wrong effect.

use std::borrow::Cow;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};

use crate::registry::ShaderPriority;

/// Effect names accepted in `shader`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ShaderKind {
    /// Noise-driven three-colour gradient.
    MeshGradient,
    /// Film-grain overlay.
    NoiseGrain,
    /// Soft glowing orb, optionally following the pointer.
    GlowOrb,
    /// No shader; fallback content only.
    None,
}

/// Section importance as written in themes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Hero sections.
    High,
    /// Regular sections.
    #[default]
    Medium,
    /// Decoration.
    Low,
}

impl Priority {
    /// Numeric registry tier.
    pub const fn registry_priority(self) -> i32 {
        match self {
            Self::High => ShaderPriority::High.value(),
            Self::Medium => ShaderPriority::Medium.value(),
            Self::Low => ShaderPriority::Low.value(),
        }
    }
}

/// Static content used when the shader cannot run.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SectionFallback {
    /// A CSS `background` value.
    Css {
        /// The background string.
        value: String,
    },
    /// Nothing; the effect's own default fallback applies.
    #[default]
    None,
}

/// Mesh-gradient parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(title = "Mesh Gradient")]
pub struct MeshGradientParams {
    /// First colour, RGB in `0..=1`.
    pub color1: [f32; 3],
    /// Second colour.
    pub color2: [f32; 3],
    /// Third colour.
    pub color3: [f32; 3],
    /// Animation speed.
    #[schemars(title = "Speed", range(min = 0.0), extend("step" = 0.1))]
    pub speed: f32,
    /// Distortion strength.
    #[schemars(title = "Distortion", range(min = 0.0), extend("step" = 0.1))]
    pub distortion: f32,
    /// Noise texture seed.
    pub seed: u32,
}

impl Default for MeshGradientParams {
    fn default() -> Self {
        Self {
            color1: [0.318, 0.0, 1.0],
            color2: [0.0, 1.0, 0.502],
            color3: [1.0, 0.8, 0.0],
            speed: 1.0,
            distortion: 1.2,
            seed: 0,
        }
    }
}

/// Film-grain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(title = "Noise Grain")]
pub struct NoiseGrainParams {
    /// Grain colour.
    pub color: [f32; 3],
    /// Grain density.
    #[schemars(title = "Density", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub density: f32,
    /// Animation speed; `0` keeps the grain static.
    #[schemars(title = "Speed", range(min = 0.0), extend("step" = 0.1))]
    pub speed: f32,
    /// Overlay opacity.
    #[schemars(title = "Opacity", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub opacity: f32,
}

impl Default for NoiseGrainParams {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            density: 0.05,
            speed: 0.0,
            opacity: 0.15,
        }
    }
}

/// Glow-orb parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
#[schemars(title = "Glow Orb")]
pub struct GlowOrbParams {
    /// Glow colour.
    pub glow_color: [f32; 3],
    /// Peak brightness.
    #[schemars(title = "Intensity", range(min = 0.0), extend("step" = 0.05))]
    pub intensity: f32,
    /// Radius in pixels.
    #[schemars(title = "Radius", range(min = 0.0), extend("step" = 10))]
    pub radius: f32,
    /// Drift speed.
    #[schemars(title = "Speed", range(min = 0.0), extend("step" = 0.1))]
    pub speed: f32,
    /// Follow the pointer.
    pub track_mouse: bool,
}

impl Default for GlowOrbParams {
    fn default() -> Self {
        Self {
            glow_color: [0.318, 0.0, 1.0],
            intensity: 0.8,
            radius: 300.0,
            speed: 0.5,
            track_mouse: true,
        }
    }
}

/// Effect selection plus its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderParams {
    /// See [`MeshGradientParams`].
    MeshGradient(MeshGradientParams),
    /// See [`NoiseGrainParams`].
    NoiseGrain(NoiseGrainParams),
    /// See [`GlowOrbParams`].
    GlowOrb(GlowOrbParams),
    /// No shader.
    None,
}

impl ShaderParams {
    /// The effect this variant selects.
    pub const fn kind(&self) -> ShaderKind {
        match self {
            Self::MeshGradient(_) => ShaderKind::MeshGradient,
            Self::NoiseGrain(_) => ShaderKind::NoiseGrain,
            Self::GlowOrb(_) => ShaderKind::GlowOrb,
            Self::None => ShaderKind::None,
        }
    }

    /// Default parameters for `kind`.
    pub fn defaults_for(kind: ShaderKind) -> Self {
        match kind {
            ShaderKind::MeshGradient => Self::MeshGradient(Default::default()),
            ShaderKind::NoiseGrain => Self::NoiseGrain(Default::default()),
            ShaderKind::GlowOrb => Self::GlowOrb(Default::default()),
            ShaderKind::None => Self::None,
        }
    }

    fn decode(
        kind: ShaderKind,
        params: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        if params.is_null() {
            return Ok(Self::defaults_for(kind));
        }
        Ok(match kind {
            ShaderKind::MeshGradient => {
                Self::MeshGradient(serde_json::from_value(params)?)
            }
            ShaderKind::NoiseGrain => {
                Self::NoiseGrain(serde_json::from_value(params)?)
            }
            ShaderKind::GlowOrb => Self::GlowOrb(serde_json::from_value(params)?),
            ShaderKind::None => Self::None,
        })
    }

    fn encode(&self) -> serde_json::Value {
        let value = match self {
            Self::MeshGradient(p) => serde_json::to_value(p),
            Self::NoiseGrain(p) => serde_json::to_value(p),
            Self::GlowOrb(p) => serde_json::to_value(p),
            Self::None => Ok(serde_json::Value::Null),
        };
        match value {
            Ok(serde_json::Value::Null) | Err(_) => {
                serde_json::Value::Object(serde_json::Map::new())
            }
            Ok(value) => value,
        }
    }
}

/// One page section's effect configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSection", into = "RawSection")]
pub struct SectionConfig {
    /// Registry priority tier.
    pub priority: Priority,
    /// Effect and its parameters.
    pub params: ShaderParams,
    /// Content used when the effect cannot run.
    pub fallback: SectionFallback,
}

impl SectionConfig {
    /// The selected effect.
    pub const fn shader(&self) -> ShaderKind {
        self.params.kind()
    }

    /// Numeric registry priority.
    pub const fn registry_priority(&self) -> i32 {
        self.priority.registry_priority()
    }
}

/// Wire shape of a [`SectionConfig`].
#[derive(Serialize, Deserialize, JsonSchema)]
struct RawSection {
    shader: ShaderKind,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    params: serde_json::Value,
    #[serde(default)]
    fallback: SectionFallback,
}

impl TryFrom<RawSection> for SectionConfig {
    type Error = String;

    fn try_from(raw: RawSection) -> Result<Self, Self::Error> {
        let params = ShaderParams::decode(raw.shader, raw.params)
            .map_err(|e| format!("invalid params for {:?}: {e}", raw.shader))?;
        Ok(Self {
            priority: raw.priority,
            params,
            fallback: raw.fallback,
        })
    }
}

impl From<SectionConfig> for RawSection {
    fn from(section: SectionConfig) -> Self {
        Self {
            shader: section.shader(),
            priority: section.priority,
            params: section.params.encode(),
            fallback: section.fallback,
        }
    }
}

impl JsonSchema for SectionConfig {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("SectionConfig")
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        RawSection::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_the_shader_tag() {
        let section: SectionConfig = serde_json::from_str(
            r#"{
                "shader": "glow-orb",
                "priority": "high",
                "params": { "glowColor": [1, 0, 0], "intensity": 0.3 },
                "fallback": { "type": "css", "value": "black" }
            }"#,
        )
        .unwrap();
        assert_eq!(section.shader(), ShaderKind::GlowOrb);
        assert_eq!(section.registry_priority(), 100);
        let ShaderParams::GlowOrb(params) = section.params else {
            panic!("wrong variant");
        };
        assert_eq!(params.glow_color, [1.0, 0.0, 0.0]);
        assert_eq!(params.intensity, 0.3);
        assert_eq!(params.radius, 300.0);
        assert!(params.track_mouse);
    }

    #[test]
    fn missing_params_take_effect_defaults() {
        let section: SectionConfig =
            serde_json::from_str(r#"{"shader":"noise-grain"}"#).unwrap();
        assert_eq!(
            section.params,
            ShaderParams::NoiseGrain(NoiseGrainParams::default())
        );
        assert_eq!(section.priority, Priority::Medium);
        assert_eq!(section.fallback, SectionFallback::None);
    }

    #[test]
    fn mistyped_params_are_rejected() {
        let result: Result<SectionConfig, _> = serde_json::from_str(
            r#"{"shader":"mesh-gradient","params":{"speed":"fast"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn none_shader_ignores_params() {
        let section: SectionConfig = serde_json::from_str(
            r#"{"shader":"none","priority":"low","params":{"whatever":1},"fallback":{"type":"none"}}"#,
        )
        .unwrap();
        assert_eq!(section.params, ShaderParams::None);
        let back = serde_json::to_value(&section).unwrap();
        assert_eq!(back["params"], serde_json::json!({}));
    }

    #[test]
    fn priority_tiers() {
        assert_eq!(Priority::High.registry_priority(), 100);
        assert_eq!(Priority::Medium.registry_priority(), 50);
        assert_eq!(Priority::Low.registry_priority(), 10);
    }
}
