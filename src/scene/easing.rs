//! Easing curves for scene transitions.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Maps linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, Default)]
pub enum Easing {
    Linear,
    QuadInOut,
    #[default]
    CubicInOut,
    SinInOut,
    /// Caller-supplied curve; should map 0 to 0 and 1 to 1.
    Custom(fn(f64) -> f64),
}

impl Easing {
    /// Eased value of `t`, which is clamped to `[0, 1]` first.
    pub fn apply(self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t / 2.0
                } else {
                    let t = t - 1.0;
                    (t * (2.0 - t) + 1.0) / 2.0
                }
            }
            Easing::CubicInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t * t / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * t + 2.0) / 2.0
                }
            }
            Easing::SinInOut => (1.0 - (PI * t).cos()) / 2.0,
            Easing::Custom(f) => f(t),
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::QuadInOut => "quadInOut",
            Easing::CubicInOut => "cubicInOut",
            Easing::SinInOut => "sinInOut",
            Easing::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Easing {
    type Err = ConfigurationError;

    /// Parses the named curves; `custom` has no textual form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Easing::Linear),
            "quadInOut" => Ok(Easing::QuadInOut),
            "cubicInOut" => Ok(Easing::CubicInOut),
            "sinInOut" => Ok(Easing::SinInOut),
            _ => Err(ConfigurationError::UnknownEasing(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMED: [Easing; 4] = [
        Easing::Linear,
        Easing::QuadInOut,
        Easing::CubicInOut,
        Easing::SinInOut,
    ];

    #[test]
    fn test_endpoints_and_midpoint() {
        for easing in NAMED {
            assert!(easing.apply(0.0).abs() < 1e-12, "{easing}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12, "{easing}");
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-12, "{easing}");
        }
    }

    #[test]
    fn test_known_values() {
        assert!((Easing::QuadInOut.apply(0.25) - 0.125).abs() < 1e-12);
        assert!((Easing::CubicInOut.apply(0.25) - 0.0625).abs() < 1e-12);
        assert!((Easing::CubicInOut.apply(0.75) - 0.9375).abs() < 1e-12);
    }

    #[test]
    fn test_clamps_input() {
        for easing in NAMED {
            assert_eq!(easing.apply(-3.0), easing.apply(0.0));
            assert_eq!(easing.apply(7.0), easing.apply(1.0));
        }
        assert_eq!(Easing::Linear.apply(f64::NAN), 0.0);
    }

    #[test]
    fn test_monotonic() {
        for easing in NAMED {
            let mut last = 0.0;
            for i in 1..=100 {
                let v = easing.apply(i as f64 / 100.0);
                assert!(v >= last, "{easing} not monotonic at {i}");
                last = v;
            }
        }
    }

    #[test]
    fn test_custom_and_parse() {
        let step = Easing::Custom(|t| if t < 0.5 { 0.0 } else { 1.0 });
        assert_eq!(step.apply(0.4), 0.0);
        assert_eq!(step.apply(2.0), 1.0);

        assert!(matches!("sinInOut".parse::<Easing>(), Ok(Easing::SinInOut)));
        assert_eq!(
            "bounce".parse::<Easing>().unwrap_err(),
            ConfigurationError::UnknownEasing("bounce".into())
        );
    }
}
