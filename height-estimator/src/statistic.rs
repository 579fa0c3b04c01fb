use std::{fmt, str::FromStr};

use itertools::Itertools;

/// Which subset of lidar points the height is averaged over.
///
/// The raw cloud over a tank mixes ground returns with returns from the tank
/// itself; the thresholded variants keep only points whose Z lies strictly
/// above a quantile (or the mean) of Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HeightStatistic {
    Unfiltered,
    Q25,
    Mean,
    Median,
    Q75,
    Q90,
}

/// Cut-off applied to Z before averaging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZThreshold {
    Quantile(f64),
    Mean,
}

impl HeightStatistic {
    pub const ALL: [HeightStatistic; 6] = [
        HeightStatistic::Unfiltered,
        HeightStatistic::Q25,
        HeightStatistic::Mean,
        HeightStatistic::Median,
        HeightStatistic::Q75,
        HeightStatistic::Q90,
    ];

    pub fn threshold(self) -> Option<ZThreshold> {
        match self {
            HeightStatistic::Unfiltered => None,
            HeightStatistic::Q25 => Some(ZThreshold::Quantile(0.25)),
            HeightStatistic::Mean => Some(ZThreshold::Mean),
            HeightStatistic::Median => Some(ZThreshold::Quantile(0.5)),
            HeightStatistic::Q75 => Some(ZThreshold::Quantile(0.75)),
            HeightStatistic::Q90 => Some(ZThreshold::Quantile(0.9)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HeightStatistic::Unfiltered => "unfiltered",
            HeightStatistic::Q25 => "q25",
            HeightStatistic::Mean => "mean",
            HeightStatistic::Median => "median",
            HeightStatistic::Q75 => "q75",
            HeightStatistic::Q90 => "q90",
        }
    }
}

impl fmt::Display for HeightStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HeightStatistic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        HeightStatistic::ALL
            .into_iter()
            .find(|stat| stat.name() == s || (s == "q50" && *stat == HeightStatistic::Median))
            .ok_or_else(|| format!("unknown height statistic: {s}"))
    }
}

impl ZThreshold {
    /// Cut-off value for `values`, `None` when `values` is empty.
    pub fn value(self, values: &[f64]) -> Option<f64> {
        match self {
            ZThreshold::Quantile(q) => quantile(values, q),
            ZThreshold::Mean => mean(values),
        }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Quantile with linear interpolation between the closest order statistics
/// (position `(n - 1) * q`).
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = values.iter().copied().sorted_by(f64::total_cmp).collect_vec();
    let q = q.clamp(0.0, 1.0);
    let pos = (sorted.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Display rounding; stored values keep full precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
