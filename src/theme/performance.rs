use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::gpu::{recommended_max_shaders, GpuTier};

/// Upper bound accepted for `maxShaderInstances`.
pub const MAX_SHADER_INSTANCES_LIMIT: u8 = 8;

/// What to do on mobile devices.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum MobileStrategy {
    /// Keep at most one shader running.
    #[default]
    Simplify,
    /// Static CSS backgrounds only.
    CssOnly,
    /// No effects at all.
    Disable,
}

/// Theme-level performance budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemePerformance {
    /// Cap on concurrently running shaders (0 to 8).
    #[schemars(range(max = 8))]
    pub max_shader_instances: u8,
    /// Behaviour on mobile devices.
    pub mobile_strategy: MobileStrategy,
}

impl Default for ThemePerformance {
    fn default() -> Self {
        Self {
            max_shader_instances: 4,
            mobile_strategy: MobileStrategy::Simplify,
        }
    }
}

impl ThemePerformance {
    /// Registry cap for a device: the theme budget limited by what the GPU
    /// tier can sustain, then by the mobile strategy.
    pub fn effective_max_instances(self, tier: GpuTier, mobile: bool) -> usize {
        let budget = usize::from(
            self.max_shader_instances.min(MAX_SHADER_INSTANCES_LIMIT),
        );
        let cap = budget.min(recommended_max_shaders(tier));
        if !mobile {
            return cap;
        }
        match self.mobile_strategy {
            MobileStrategy::Simplify => cap.min(1),
            MobileStrategy::CssOnly | MobileStrategy::Disable => 0,
        }
    }
}
