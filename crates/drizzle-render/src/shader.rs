//! Shader variants

use serde::{Deserialize, Serialize};

/// Which rain shader a drawer renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderType {
    /// Full distortion + relief + blur + bloom
    #[default]
    Expensive,
    /// Distortion only
    Cheap,
    /// Overlay texture + relief, no screen distortion
    NoDistortion,
}

impl ShaderType {
    pub fn shader_name(&self) -> &'static str {
        match self {
            ShaderType::Expensive => "RainDrop/Internal/RainDistortion (Forward)",
            ShaderType::Cheap => "RainDrop/Internal/RainDistortion (Mobile)",
            ShaderType::NoDistortion => "RainDrop/Internal/RainNoDistortion",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        shader: ShaderType,
    }

    #[test]
    fn parses_snake_case_names() {
        let h: Holder = toml::from_str(r#"shader = "no_distortion""#).unwrap();
        assert_eq!(h.shader, ShaderType::NoDistortion);
        assert_eq!(ShaderType::default(), ShaderType::Expensive);
    }

    #[test]
    fn names_are_distinct() {
        assert_ne!(ShaderType::Cheap.shader_name(), ShaderType::Expensive.shader_name());
    }
}
