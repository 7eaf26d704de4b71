//! Value-over-lifetime curves (cubic Hermite keyframes)

use serde::{Deserialize, Serialize};

/// One curve key. Tangents are slopes in value per unit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: f32,
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// A float curve sampled by normalized progress.
///
/// Keys must be sorted by time. Sampling outside the key range clamps to the
/// end keys; a curve without keys evaluates to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RainCurve {
    pub keys: Vec<Keyframe>,
}

impl RainCurve {
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }

    /// No keys; evaluates to 0 everywhere
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, value, 0.0, 0.0)])
    }

    /// Quick rise to 1 at 0.3 then a slow fall back to 0 at 1.
    /// The default shape for alpha, width and distortion over lifetime.
    pub fn rise_and_fall() -> Self {
        Self::new(vec![
            Keyframe::new(0.0, 0.0, 2.0, 2.0),
            Keyframe::new(0.3, 1.0, -0.25, -0.25),
            Keyframe::new(1.0, 0.0, 0.0, 0.0),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn evaluate(&self, time: f32) -> f32 {
        let keys = &self.keys;
        let Some(first) = keys.first() else {
            return 0.0;
        };
        if time <= first.time {
            return first.value;
        }
        let last = &keys[keys.len() - 1];
        if time >= last.time {
            return last.value;
        }

        let idx = keys.partition_point(|k| k.time <= time);
        let prev = &keys[idx - 1];
        let next = &keys[idx];
        let span = next.time - prev.time;
        if span <= 0.0 {
            return prev.value;
        }
        let t = (time - prev.time) / span;
        cubic_hermite(prev.value, prev.out_tangent, next.value, next.in_tangent, span, t)
    }
}

/// Cubic Hermite interpolation with tangents scaled by the interval span
pub fn cubic_hermite(p0: f32, m0: f32, p1: f32, m1: f32, span: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;

    h00 * p0 + h10 * m0 * span + h01 * p1 + h11 * m1 * span
}

/// Linear interpolation between two floats
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_curve_is_zero() {
        assert_eq!(RainCurve::empty().evaluate(0.4), 0.0);
    }

    #[test]
    fn rise_and_fall_hits_keys() {
        let c = RainCurve::rise_and_fall();
        assert!(c.evaluate(0.0).abs() < 1e-6);
        assert!((c.evaluate(0.3) - 1.0).abs() < 1e-6);
        assert!(c.evaluate(1.0).abs() < 1e-6);
        let mid = c.evaluate(0.65);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn clamps_outside_range() {
        let c = RainCurve::new(vec![
            Keyframe::new(0.2, 3.0, 0.0, 0.0),
            Keyframe::new(0.8, 5.0, 0.0, 0.0),
        ]);
        assert_eq!(c.evaluate(-1.0), 3.0);
        assert_eq!(c.evaluate(2.0), 5.0);
    }

    #[test]
    fn flat_tangents_give_smoothstep_midpoint() {
        let c = RainCurve::new(vec![
            Keyframe::new(0.0, 0.0, 0.0, 0.0),
            Keyframe::new(1.0, 10.0, 0.0, 0.0),
        ]);
        assert!((c.evaluate(0.5) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn constant_curve() {
        assert_eq!(RainCurve::constant(0.7).evaluate(0.9), 0.7);
    }

    #[test]
    fn parses_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            curve: RainCurve,
        }
        let doc: Doc = toml::from_str(
            r#"curve = [
                { time = 0.0, value = 1.0, out_tangent = -1.0 },
                { time = 1.0, value = 0.0, in_tangent = -1.0 },
            ]"#,
        )
        .unwrap();
        assert_eq!(doc.curve.keys.len(), 2);
        assert!((doc.curve.evaluate(0.5) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn lerp_f32_endpoints() {
        assert!((lerp_f32(0.0, 10.0, 0.5) - 5.0).abs() < 1e-6);
    }
}
