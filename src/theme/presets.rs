use super::ThemeConfig;

const PRESETS: [(&str, &str); 3] = [
    (
        "nebula-tech",
        include_str!("../../assets/themes/nebula-tech.json"),
    ),
    ("soft-glow", include_str!("../../assets/themes/soft-glow.json")),
    (
        "minimal-pulse",
        include_str!("../../assets/themes/minimal-pulse.json"),
    ),
];

/// Names of the bundled themes.
pub fn names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

/// Decode a bundled theme by name.
pub fn builtin(name: &str) -> Option<ThemeConfig> {
    let (_, source) = PRESETS.iter().find(|(n, _)| *n == name)?;
    match ThemeConfig::from_json_str(source) {
        Ok(theme) => Some(theme),
        Err(e) => {
            log::error!("bundled theme {name} failed to parse: {e}");
            None
        }
    }
}

/// Every bundled theme, in declaration order.
pub fn all() -> Vec<ThemeConfig> {
    names().filter_map(builtin).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::theme::{hex_to_rgb, Priority, SectionFallback, ShaderParams};

    #[test]
    fn every_preset_parses_and_names_match() {
        let themes = all();
        assert_eq!(themes.len(), 3);
        for (theme, name) in themes.iter().zip(names()) {
            assert_eq!(theme.name, name);
            assert!(!theme.description.is_empty());
        }
        assert!(builtin("does-not-exist").is_none());
    }

    #[test]
    fn palettes_are_valid_hex_with_distinct_backgrounds() {
        let themes = all();
        for theme in &themes {
            let c = &theme.colors;
            for hex in [
                &c.primary,
                &c.secondary,
                &c.accent,
                &c.background,
                &c.foreground,
            ] {
                assert!(hex_to_rgb(hex).is_some(), "{}: bad colour {hex}", theme.name);
            }
        }
        let backgrounds: HashSet<_> =
            themes.iter().map(|t| t.colors.background.as_str()).collect();
        assert_eq!(backgrounds.len(), themes.len());
    }

    #[test]
    fn heroes_are_high_priority_with_css_fallbacks() {
        for theme in all() {
            let hero = theme.section("hero").unwrap();
            assert_eq!(hero.priority, Priority::High, "{}", theme.name);
            let SectionFallback::Css { value } = &hero.fallback else {
                panic!("{}: hero needs a CSS fallback", theme.name);
            };
            assert!(!value.is_empty());
        }
    }

    #[test]
    fn budgets_shrink_with_restraint() {
        let budgets: Vec<_> = all()
            .iter()
            .map(|t| t.performance.max_shader_instances)
            .collect();
        assert_eq!(budgets, vec![4, 3, 2]);
    }

    #[test]
    fn preset_characters() {
        let nebula = builtin("nebula-tech").unwrap();
        assert!(matches!(
            nebula.section("hero").unwrap().params,
            ShaderParams::MeshGradient(_)
        ));
        assert!(matches!(
            nebula.section("features").unwrap().params,
            ShaderParams::GlowOrb(_)
        ));
        assert!(matches!(
            nebula.section("footer").unwrap().params,
            ShaderParams::NoiseGrain(_)
        ));

        let soft = builtin("soft-glow").unwrap();
        let ShaderParams::MeshGradient(hero) = soft.section("hero").unwrap().params
        else {
            panic!("soft-glow hero should be a mesh gradient");
        };
        assert!(hero.distortion < 1.0);

        let minimal = builtin("minimal-pulse").unwrap();
        let ShaderParams::GlowOrb(orb) = minimal.section("hero").unwrap().params
        else {
            panic!("minimal-pulse hero should be a glow orb");
        };
        assert!(orb.intensity < 0.5);
    }
}
