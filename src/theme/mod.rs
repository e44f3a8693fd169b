//! Theme documents: palette, performance budget, and per-section effects.
//!
//! Themes are produced by external tooling and only consumed here. Decoding
//! fills defaults for missing fields; enforcing the schema is left to the
//! producer, which can use [`ThemeConfig::json_schema`].

mod colors;
mod performance;
/// Built-in themes.
pub mod presets;
mod section;

use std::collections::BTreeMap;
use std::path::Path;

pub use colors::{css_rgb, hex_to_rgb, ThemeColors};
pub use performance::{
    MobileStrategy, ThemePerformance, MAX_SHADER_INSTANCES_LIMIT,
};
use schemars::JsonSchema;
pub use section::{
    GlowOrbParams, MeshGradientParams, NoiseGrainParams, Priority,
    SectionConfig, SectionFallback, ShaderKind, ShaderParams,
};
use serde::{Deserialize, Serialize};

use crate::error::ShadefallError;
use crate::gpu::GpuTier;
use crate::registry::RegistryConfig;

/// A complete theme document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ThemeConfig {
    /// Theme identifier.
    pub name: String,
    /// Theme version.
    pub version: String,
    /// Free-form description.
    pub description: String,
    /// Page palette.
    pub colors: ThemeColors,
    /// Shader budget.
    pub performance: ThemePerformance,
    /// Effects keyed by section name.
    pub sections: BTreeMap<String, SectionConfig>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: "1.0.0".to_owned(),
            description: String::new(),
            colors: ThemeColors::default(),
            performance: ThemePerformance::default(),
            sections: BTreeMap::new(),
        }
    }
}

impl ThemeConfig {
    /// Generate JSON Schema describing theme documents.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ThemeConfig)
    }

    /// Decode a JSON theme. Missing fields use defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ShadefallError> {
        serde_json::from_str(source)
            .map_err(|e| ShadefallError::ThemeParse(e.to_string()))
    }

    /// Decode a TOML theme. Missing fields use defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ShadefallError> {
        toml::from_str(source)
            .map_err(|e| ShadefallError::ThemeParse(e.to_string()))
    }

    /// Pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ShadefallError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ShadefallError::ThemeParse(e.to_string()))
    }

    /// Pretty-printed TOML.
    pub fn to_toml_string(&self) -> Result<String, ShadefallError> {
        toml::to_string_pretty(self)
            .map_err(|e| ShadefallError::ThemeParse(e.to_string()))
    }

    /// Load a theme file. `.toml` files are read as TOML, anything else
    /// as JSON.
    pub fn load(path: &Path) -> Result<Self, ShadefallError> {
        let content = std::fs::read_to_string(path).map_err(ShadefallError::Io)?;
        if is_toml(path) {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// Save a theme file, choosing the format from the extension like
    /// [`load`](Self::load).
    pub fn save(&self, path: &Path) -> Result<(), ShadefallError> {
        let content = if is_toml(path) {
            self.to_toml_string()?
        } else {
            self.to_json_string()?
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ShadefallError::Io)?;
        }
        std::fs::write(path, content).map_err(ShadefallError::Io)
    }

    /// Section by name.
    pub fn section(&self, name: &str) -> Option<&SectionConfig> {
        self.sections.get(name)
    }

    /// Registry settings for a device of `tier`.
    pub fn registry_config(&self, tier: GpuTier, mobile: bool) -> RegistryConfig {
        RegistryConfig {
            max_instances: self.performance.effective_max_instances(tier, mobile),
            ..RegistryConfig::default()
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}
