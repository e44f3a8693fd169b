use glam::{Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;

use super::context::{GraphicsContext, ProgramHandle, UniformLocation};

/// A value written to a shader uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `int` / `sampler2D`
    Int(i32),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(Vec3::from_array(v))
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

/// Uniform names that every surface resolves.
pub const BUILTIN_UNIFORMS: [&str; 3] = ["u_time", "u_resolution", "u_mouse"];

/// Resolved uniform locations of one program.
#[derive(Debug, Clone, Default)]
pub struct UniformTable {
    locations: FxHashMap<String, UniformLocation>,
}

impl UniformTable {
    /// Resolve `names` on `program`. Names the program does not expose are
    /// left out.
    pub fn resolve<'a>(
        gl: &mut dyn GraphicsContext,
        program: ProgramHandle,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut locations = FxHashMap::default();
        for name in names {
            if locations.contains_key(name) {
                continue;
            }
            if let Some(location) = gl.uniform_location(program, name) {
                let _ = locations.insert(name.to_owned(), location);
            }
        }
        Self { locations }
    }

    /// Location of `name`, if resolved.
    pub fn get(&self, name: &str) -> Option<UniformLocation> {
        self.locations.get(name).copied()
    }

    /// Whether `name` was resolved.
    pub fn contains(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    /// Number of resolved uniforms.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Write `value` to `name`. Unknown names are ignored.
    pub fn set(
        &self,
        gl: &mut dyn GraphicsContext,
        name: &str,
        value: impl Into<UniformValue>,
    ) {
        if let Some(location) = self.get(name) {
            gl.set_uniform(location, value.into());
        }
    }
}

/// The built-in uniform names followed by `extra`, without duplicates.
pub fn uniform_names<S: AsRef<str>>(extra: &[S]) -> Vec<String> {
    let mut names: Vec<String> =
        BUILTIN_UNIFORMS.iter().map(|&n| n.to_owned()).collect();
    for name in extra {
        let name = name.as_ref();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_come_first_and_duplicates_drop() {
        let names = uniform_names(&["u_color", "u_time", "u_color", "u_noise"]);
        assert_eq!(
            names,
            ["u_time", "u_resolution", "u_mouse", "u_color", "u_noise"]
        );
    }

    #[test]
    fn conversions_pick_the_right_variant() {
        assert_eq!(UniformValue::from(1.5), UniformValue::Float(1.5));
        assert_eq!(
            UniformValue::from([1.0, 0.0, 0.5]),
            UniformValue::Vec3(Vec3::new(1.0, 0.0, 0.5))
        );
        assert_eq!(UniformValue::from(3), UniformValue::Int(3));
    }
}
