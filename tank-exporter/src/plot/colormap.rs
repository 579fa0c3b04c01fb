use image::Rgb;

/// Control points of the terrain map: sea blue through green and sand to
/// brown and snow white.
const TERRAIN: [(f64, [f64; 3]); 6] = [
    (0.00, [0.2, 0.2, 0.6]),
    (0.15, [0.0, 0.6, 1.0]),
    (0.25, [0.0, 0.8, 0.4]),
    (0.50, [1.0, 1.0, 0.6]),
    (0.75, [0.5, 0.36, 0.33]),
    (1.00, [1.0, 1.0, 1.0]),
];

/// Terrain colour for `t` in `[0, 1]`; values outside are clamped.
pub fn terrain(t: f64) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let upper = TERRAIN
        .iter()
        .position(|&(stop, _)| stop >= t)
        .unwrap_or(TERRAIN.len() - 1)
        .max(1);
    let (t0, c0) = TERRAIN[upper - 1];
    let (t1, c1) = TERRAIN[upper];
    let f = (t - t0) / (t1 - t0);
    let channel = |i: usize| ((c0[i] + (c1[i] - c0[i]) * f) * 255.0).round() as u8;
    Rgb([channel(0), channel(1), channel(2)])
}

/// Linear mapping of a value range onto the terrain map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Range of the finite values, `None` if there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(Self { min: v, max: v }),
                Some(s) => Some(Self {
                    min: s.min.min(v),
                    max: s.max.max(v),
                }),
            })
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        if self.max > self.min {
            ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    pub fn color(&self, value: f64) -> Rgb<u8> {
        terrain(self.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terrain_control_points() {
        assert_eq!(terrain(0.0), Rgb([51, 51, 153]));
        assert_eq!(terrain(0.5), Rgb([255, 255, 153]));
        assert_eq!(terrain(1.0), Rgb([255, 255, 255]));
        assert_eq!(terrain(-3.0), terrain(0.0));
        assert_eq!(terrain(7.0), terrain(1.0));
    }

    #[test]
    fn scale_ignores_non_finite_values() {
        let scale = ColorScale::from_values([3.0, f64::NAN, -1.0, f64::INFINITY]).unwrap();
        assert_eq!(scale, ColorScale { min: -1.0, max: 3.0 });
        assert_eq!(scale.normalize(1.0), 0.5);
        assert!(ColorScale::from_values([f64::NAN]).is_none());
    }

    #[test]
    fn flat_scale_maps_to_the_middle() {
        let scale = ColorScale { min: 2.0, max: 2.0 };
        assert_eq!(scale.color(2.0), terrain(0.5));
    }
}
