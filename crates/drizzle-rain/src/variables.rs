//! Per-style tunables and the TOML rig description
//!
//! Each style's variables carry the defaults of the shipped effect. A TOML
//! table only needs to name the keys it changes; everything else keeps the
//! style's own default (see [`merge_over_defaults`]).

use crate::curves::{Keyframe, RainCurve};
use drizzle_core::{Color, DrizzleError, Result, Vec2, Vec3};
use drizzle_render::{MaterialParams, ShaderType, TextureHandle};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Swap an inverted min/max pair in place
fn order_range<T: PartialOrd>(min: &mut T, max: &mut T) {
    if *min > *max {
        std::mem::swap(min, max);
    }
}

/// Spawn timing and capacity shared by the streaming styles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnVariables {
    pub auto_start: bool,
    /// Stop emitting `duration` seconds after play
    pub play_once: bool,
    /// Emission window: `emission_rate` drops are spawned per `duration` seconds
    pub duration: f32,
    /// Seconds between `play` and the first spawn
    pub delay: f32,
    pub max_rain_spawn_count: usize,
    /// Vertical spawn bias in screen heights
    pub spawn_offset_y: f32,
    pub lifetime_min: f32,
    pub lifetime_max: f32,
    /// Integer rate; drawn from `[min, max)` (or exactly `min` when equal)
    pub emission_rate_min: i32,
    pub emission_rate_max: i32,
}

impl Default for SpawnVariables {
    fn default() -> Self {
        Self {
            auto_start: true,
            play_once: false,
            duration: 1.0,
            delay: 0.0,
            max_rain_spawn_count: 30,
            spawn_offset_y: 0.0,
            lifetime_min: 1.0,
            lifetime_max: 1.0,
            emission_rate_min: 4,
            emission_rate_max: 5,
        }
    }
}

impl SpawnVariables {
    pub fn repair(&mut self) {
        order_range(&mut self.lifetime_min, &mut self.lifetime_max);
        order_range(&mut self.emission_rate_min, &mut self.emission_rate_max);
    }
}

/// Material inputs shared by the streaming styles, each scaled by a curve
/// over the drop's lifetime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingVariables {
    pub overlay_color: Color,
    pub darkness: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_map: Option<TextureHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_texture: Option<TextureHandle>,
    pub alpha_over_lifetime: RainCurve,
    pub distortion_value: f32,
    pub distortion_over_lifetime: RainCurve,
    pub relief_value: f32,
    pub relief_over_lifetime: RainCurve,
    pub blur: f32,
    pub blur_over_lifetime: RainCurve,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_texture: Option<TextureHandle>,
    pub bloom: f32,
    pub bloom_over_lifetime: RainCurve,
}

impl Default for ShadingVariables {
    fn default() -> Self {
        Self {
            overlay_color: Color::GRAY,
            darkness: 0.0,
            normal_map: None,
            overlay_texture: None,
            alpha_over_lifetime: RainCurve::rise_and_fall(),
            distortion_value: 0.0,
            distortion_over_lifetime: RainCurve::rise_and_fall(),
            relief_value: 0.0,
            relief_over_lifetime: RainCurve::empty(),
            blur: 0.0,
            blur_over_lifetime: RainCurve::empty(),
            bloom_texture: None,
            bloom: 0.0,
            bloom_over_lifetime: RainCurve::empty(),
        }
    }
}

impl ShadingVariables {
    /// Material for a drop at `progress`, faded by the rig alpha
    pub fn material_at(
        &self,
        progress: f32,
        alpha: f32,
        shader: ShaderType,
        render_queue: i32,
    ) -> MaterialParams {
        MaterialParams {
            shader,
            render_queue,
            normal_map: self.normal_map.clone(),
            overlay_texture: self.overlay_texture.clone(),
            overlay_color: self
                .overlay_color
                .with_alpha(self.overlay_color.a * self.alpha_over_lifetime.evaluate(progress) * alpha),
            distortion: self.distortion_value * self.distortion_over_lifetime.evaluate(progress) * alpha,
            relief: self.relief_value * self.relief_over_lifetime.evaluate(progress) * alpha,
            blur: self.blur * self.blur_over_lifetime.evaluate(progress) * alpha,
            bloom_texture: self.bloom_texture.clone(),
            bloom: self.bloom * self.bloom_over_lifetime.evaluate(progress) * alpha,
            darkness: self.darkness * alpha,
        }
    }
}

/// Streaking trails with a sideways wobble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowRainVariables {
    #[serde(flatten)]
    pub spawn: SpawnVariables,
    #[serde(flatten)]
    pub shading: ShadingVariables,
    /// Trail sample density
    pub resolution: f32,
    pub size_min_x: f32,
    pub size_max_x: f32,
    pub trail_width: RainCurve,
    pub amplitude: f32,
    pub smooth: f32,
    pub fluctuation_rate_min: f32,
    pub fluctuation_rate_max: f32,
    pub initial_velocity: f32,
    pub acceleration_min: f32,
    pub acceleration_max: f32,
}

impl Default for FlowRainVariables {
    fn default() -> Self {
        Self {
            spawn: SpawnVariables {
                lifetime_min: 0.6,
                lifetime_max: 1.4,
                emission_rate_min: 2,
                emission_rate_max: 5,
                ..Default::default()
            },
            shading: ShadingVariables::default(),
            resolution: 200.0,
            size_min_x: 0.75,
            size_max_x: 0.75,
            trail_width: RainCurve::rise_and_fall(),
            amplitude: 5.0,
            smooth: 5.0,
            fluctuation_rate_min: 5.0,
            fluctuation_rate_max: 5.0,
            initial_velocity: 0.0,
            acceleration_min: 0.06,
            acceleration_max: 0.2,
        }
    }
}

impl FlowRainVariables {
    pub fn repair(&mut self) {
        self.spawn.repair();
        order_range(&mut self.size_min_x, &mut self.size_max_x);
        order_range(&mut self.fluctuation_rate_min, &mut self.fluctuation_rate_max);
        order_range(&mut self.acceleration_min, &mut self.acceleration_max);
    }
}

/// Trails dragged sideways by a friction texture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionFlowRainVariables {
    #[serde(flatten)]
    pub spawn: SpawnVariables,
    #[serde(flatten)]
    pub shading: ShadingVariables,
    /// Grayscale image, relative to the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friction_map: Option<PathBuf>,
    pub resolution: i32,
    pub size_min_x: f32,
    pub size_max_x: f32,
    pub trail_width: RainCurve,
    pub initial_velocity: f32,
    pub acceleration_min: f32,
    pub acceleration_max: f32,
}

impl Default for FrictionFlowRainVariables {
    fn default() -> Self {
        Self {
            spawn: SpawnVariables {
                spawn_offset_y: 0.2,
                lifetime_min: 1.9,
                lifetime_max: 2.2,
                emission_rate_min: 4,
                emission_rate_max: 5,
                ..Default::default()
            },
            shading: ShadingVariables {
                overlay_color: Color::new(1.0, 1.0, 1.0, 0.1),
                darkness: 4.0,
                distortion_value: 100.0,
                ..Default::default()
            },
            friction_map: None,
            resolution: 500,
            size_min_x: 0.5,
            size_max_x: 0.55,
            trail_width: RainCurve::rise_and_fall(),
            initial_velocity: 13.0,
            acceleration_min: 0.4,
            acceleration_max: 0.5,
        }
    }
}

impl FrictionFlowRainVariables {
    pub fn repair(&mut self) {
        self.spawn.repair();
        order_range(&mut self.size_min_x, &mut self.size_max_x);
        order_range(&mut self.acceleration_min, &mut self.acceleration_max);
    }
}

/// Single quads that pop in and fade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleRainVariables {
    #[serde(flatten)]
    pub spawn: SpawnVariables,
    #[serde(flatten)]
    pub shading: ShadingVariables,
    /// Give each drop a random roll
    pub auto_rotate: bool,
    pub size_min_x: f32,
    pub size_max_x: f32,
    pub size_min_y: f32,
    pub size_max_y: f32,
    pub size_over_lifetime: RainCurve,
    pub pos_y_over_lifetime: RainCurve,
}

impl Default for SimpleRainVariables {
    fn default() -> Self {
        Self {
            spawn: SpawnVariables {
                lifetime_min: 0.7,
                lifetime_max: 0.9,
                emission_rate_min: 15,
                emission_rate_max: 17,
                ..Default::default()
            },
            shading: ShadingVariables {
                overlay_color: Color::new(0.8, 0.8, 0.8, 0.2),
                darkness: 4.0,
                distortion_value: 100.0,
                relief_over_lifetime: RainCurve::rise_and_fall(),
                ..Default::default()
            },
            auto_rotate: true,
            size_min_x: 0.26,
            size_max_x: 0.35,
            size_min_y: 0.26,
            size_max_y: 0.35,
            size_over_lifetime: RainCurve::rise_and_fall(),
            pos_y_over_lifetime: RainCurve::empty(),
        }
    }
}

impl SimpleRainVariables {
    pub fn repair(&mut self) {
        self.spawn.repair();
        order_range(&mut self.size_min_x, &mut self.size_max_x);
        order_range(&mut self.size_min_y, &mut self.size_max_y);
    }
}

/// One screen-wide overlay that fades in and out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRainVariables {
    pub auto_start: bool,
    pub full_screen: bool,
    pub overlay_color: Color,
    pub darkness: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_texture: Option<TextureHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_map: Option<TextureHandle>,
    pub fade_time: f32,
    pub fadein_curve: RainCurve,
    pub size_x: f32,
    pub size_y: f32,
    pub spawn_offset_x: f32,
    pub spawn_offset_y: f32,
    pub distortion_value: f32,
    pub relief_value: f32,
    pub blur: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bloom_texture: Option<TextureHandle>,
    pub bloom: f32,
}

impl Default for StaticRainVariables {
    fn default() -> Self {
        Self {
            auto_start: true,
            full_screen: true,
            overlay_color: Color::GRAY,
            darkness: 0.0,
            overlay_texture: None,
            normal_map: None,
            fade_time: 2.0,
            fadein_curve: RainCurve::new(vec![
                Keyframe::new(0.0, 0.0, 1.0, 1.0),
                Keyframe::new(1.0, 1.0, 1.0, 1.0),
            ]),
            size_x: 1.0,
            size_y: 1.0,
            spawn_offset_x: 0.0,
            spawn_offset_y: 0.0,
            distortion_value: 0.0,
            relief_value: 0.0,
            blur: 0.0,
            bloom_texture: None,
            bloom: 0.0,
        }
    }
}

/// Rig-wide settings applied by the camera controller every frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Render queue of the first drop; later behaviours stack after it
    pub render_queue: i32,
    pub alpha: f32,
    pub global_wind: Vec2,
    pub gravity: Vec3,
    pub shader: ShaderType,
    /// Distance from the camera to the rain plane
    pub distance: f32,
    pub vr_mode: bool,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub seed: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            render_queue: 3000,
            alpha: 1.0,
            global_wind: Vec2::ZERO,
            gravity: Vec3::NEG_Y,
            shader: ShaderType::Expensive,
            distance: 8.3,
            vr_mode: false,
            fov: 60.0,
            aspect: 16.0 / 9.0,
            seed: crate::rand::DEFAULT_SEED,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("camera.alpha", self.alpha, 0.0, 1.0)?;
        check_range("camera.distance", self.distance, 0.02, 10.0)?;
        if self.aspect <= 0.0 {
            return Err(DrizzleError::ConfigError(format!(
                "camera.aspect must be positive, got {}",
                self.aspect
            )));
        }
        Ok(())
    }
}

fn check_range(field: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(DrizzleError::ValueOutOfRange {
            field: field.to_string(),
            min: min as f64,
            max: max as f64,
            value: value as f64,
        })
    }
}

/// Style-specific variables of one behaviour
#[derive(Debug, Clone, PartialEq)]
pub enum BehaviourStyle {
    Flow(FlowRainVariables),
    FrictionFlow(FrictionFlowRainVariables),
    Simple(SimpleRainVariables),
    Static(StaticRainVariables),
}

impl BehaviourStyle {
    pub fn style_name(&self) -> &'static str {
        match self {
            BehaviourStyle::Flow(_) => "flow",
            BehaviourStyle::FrictionFlow(_) => "friction_flow",
            BehaviourStyle::Simple(_) => "simple",
            BehaviourStyle::Static(_) => "static",
        }
    }
}

/// One `[[behaviour]]` table
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviourConfig {
    pub name: String,
    /// Draw order among behaviours; lower draws first
    pub depth: i32,
    pub style: BehaviourStyle,
}

impl BehaviourConfig {
    /// Parse a behaviour table. `style` selects the variables type; `name`
    /// and `depth` are optional.
    pub fn from_toml(table: &toml::Table, index: usize) -> Result<Self> {
        let style_name = table
            .get("style")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DrizzleError::ConfigError(format!("behaviour #{index} has no `style`")))?;

        let style = match style_name {
            "flow" => BehaviourStyle::Flow(merge_over_defaults(table)?),
            "friction_flow" => BehaviourStyle::FrictionFlow(merge_over_defaults(table)?),
            "simple" => BehaviourStyle::Simple(merge_over_defaults(table)?),
            "static" => BehaviourStyle::Static(merge_over_defaults(table)?),
            other => return Err(DrizzleError::UnknownBehaviour(other.to_string())),
        };

        let name = table
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{style_name}-{index}"));
        let depth = table
            .get("depth")
            .and_then(|v| v.as_integer())
            .unwrap_or(0) as i32;

        Ok(Self { name, depth, style })
    }
}

/// Whole rig: camera settings plus every behaviour under it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RainConfig {
    pub camera: CameraConfig,
    pub behaviours: Vec<BehaviourConfig>,
    /// Directory that relative asset paths resolve against
    pub base_dir: Option<PathBuf>,
}

impl RainConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let doc: toml::Table = toml::from_str(source)?;

        let camera: CameraConfig = match doc.get("camera") {
            Some(value) => value.clone().try_into()?,
            None => CameraConfig::default(),
        };
        camera.validate()?;

        let mut behaviours = Vec::new();
        if let Some(value) = doc.get("behaviour") {
            let tables = value
                .as_array()
                .ok_or_else(|| DrizzleError::ConfigError("`behaviour` must be an array of tables".into()))?;
            for (index, entry) in tables.iter().enumerate() {
                let table = entry.as_table().ok_or_else(|| {
                    DrizzleError::ConfigError(format!("behaviour #{index} is not a table"))
                })?;
                behaviours.push(BehaviourConfig::from_toml(table, index)?);
            }
        }

        Ok(Self {
            camera,
            behaviours,
            base_dir: None,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&source)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Resolve an asset path against the config's directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Deserialize `T` from `table`, with keys the table leaves out taken from
/// `T::default()` rather than from the defaults of nested blocks.
pub fn merge_over_defaults<T>(table: &toml::Table) -> Result<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    let defaults = toml::Value::try_from(T::default())
        .map_err(|e| DrizzleError::ConfigError(format!("serializing defaults: {e}")))?;
    let mut merged = match defaults {
        toml::Value::Table(t) => t,
        _ => return Err(DrizzleError::ConfigError("defaults are not a table".into())),
    };
    for (key, value) in table {
        merged.insert(key.clone(), value.clone());
    }
    Ok(toml::Value::Table(merged).try_into()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_swaps_inverted_pairs() {
        let mut v = FlowRainVariables::default();
        v.spawn.lifetime_min = 3.0;
        v.spawn.lifetime_max = 1.0;
        v.spawn.emission_rate_min = 9;
        v.spawn.emission_rate_max = 2;
        v.acceleration_min = 0.5;
        v.acceleration_max = 0.1;
        v.repair();
        assert_eq!((v.spawn.lifetime_min, v.spawn.lifetime_max), (1.0, 3.0));
        assert_eq!((v.spawn.emission_rate_min, v.spawn.emission_rate_max), (2, 9));
        assert_eq!((v.acceleration_min, v.acceleration_max), (0.1, 0.5));
    }

    #[test]
    fn material_scales_by_curve_and_alpha() {
        let shading = ShadingVariables {
            overlay_color: Color::new(1.0, 1.0, 1.0, 0.5),
            distortion_value: 10.0,
            darkness: 2.0,
            alpha_over_lifetime: RainCurve::constant(1.0),
            distortion_over_lifetime: RainCurve::constant(0.5),
            ..Default::default()
        };
        let m = shading.material_at(0.4, 0.5, ShaderType::Cheap, 3004);
        assert_eq!(m.render_queue, 3004);
        assert!((m.overlay_color.a - 0.25).abs() < 1e-6);
        assert!((m.distortion - 2.5).abs() < 1e-6);
        assert!((m.darkness - 1.0).abs() < 1e-6);
        assert_eq!(m.relief, 0.0);
    }

    #[test]
    fn partial_table_keeps_style_defaults() {
        let table: toml::Table = toml::from_str(
            r#"
            style = "friction_flow"
            lifetime_max = 3.0
            normal_map = "drops_normal"
            "#,
        )
        .unwrap();
        let v: FrictionFlowRainVariables = merge_over_defaults(&table).unwrap();
        assert_eq!(v.spawn.lifetime_max, 3.0);
        assert_eq!(v.spawn.lifetime_min, 1.9);
        assert_eq!(v.spawn.spawn_offset_y, 0.2);
        assert_eq!(v.shading.darkness, 4.0);
        assert_eq!(v.shading.normal_map, Some(TextureHandle::new("drops_normal")));
        assert_eq!(v.resolution, 500);
    }

    #[test]
    fn rig_parses_camera_and_behaviours() {
        let config = RainConfig::from_toml_str(
            r#"
            [camera]
            alpha = 0.5
            shader = "cheap"
            global_wind = [0.1, 0.0]

            [[behaviour]]
            style = "simple"
            name = "splashes"
            depth = 2
            max_rain_spawn_count = 12

            [[behaviour]]
            style = "static"
            fade_time = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.alpha, 0.5);
        assert_eq!(config.camera.shader, ShaderType::Cheap);
        assert_eq!(config.camera.distance, 8.3);
        assert_eq!(config.behaviours.len(), 2);

        let first = &config.behaviours[0];
        assert_eq!(first.name, "splashes");
        assert_eq!(first.depth, 2);
        match &first.style {
            BehaviourStyle::Simple(v) => {
                assert_eq!(v.spawn.max_rain_spawn_count, 12);
                assert_eq!(v.spawn.emission_rate_min, 15);
            }
            other => panic!("unexpected style {}", other.style_name()),
        }

        let second = &config.behaviours[1];
        assert_eq!(second.name, "static-1");
        assert!(matches!(&second.style, BehaviourStyle::Static(v) if v.fade_time == 1.5));
    }

    #[test]
    fn unknown_style_is_rejected() {
        let err = RainConfig::from_toml_str("[[behaviour]]\nstyle = \"hail\"\n").unwrap_err();
        assert!(matches!(err, DrizzleError::UnknownBehaviour(s) if s == "hail"));
    }

    #[test]
    fn missing_style_is_a_config_error() {
        let err = RainConfig::from_toml_str("[[behaviour]]\nname = \"x\"\n").unwrap_err();
        assert!(matches!(err, DrizzleError::ConfigError(_)));
    }

    #[test]
    fn camera_alpha_out_of_range() {
        let err = RainConfig::from_toml_str("[camera]\nalpha = 1.5\n").unwrap_err();
        assert!(matches!(err, DrizzleError::ValueOutOfRange { .. }));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = RainConfig::from_toml_str("[camera\n").unwrap_err();
        assert!(matches!(err, DrizzleError::TomlParseError(_)));
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let config = RainConfig {
            base_dir: Some(PathBuf::from("/assets/rain")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve(Path::new("friction.png")),
            PathBuf::from("/assets/rain/friction.png")
        );
        assert_eq!(config.resolve(Path::new("/abs.png")), PathBuf::from("/abs.png"));
    }
}
