use serde::Serialize;

use crate::types::Rgb;

/// Green → yellow → red over `[0, 1]`.
pub const RISK_STOPS: [(f64, Rgb); 3] = [(0.0, Rgb::GREEN), (0.5, Rgb::YELLOW), (1.0, Rgb::RED)];

/// Piecewise-linear colour scale through a list of `(value, colour)` stops.
/// Stops are sorted by value; inputs outside the stop range clamp to the
/// nearest end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearColormap {
    pub stops: Vec<(f64, Rgb)>,
}

impl LinearColormap {
    /// The fixed risk scale used for every overlay and the legend.
    pub fn risk() -> Self {
        LinearColormap { stops: RISK_STOPS.to_vec() }
    }

    pub fn vmin(&self) -> f64 {
        self.stops.first().map(|s| s.0).unwrap_or(0.0)
    }

    pub fn vmax(&self) -> f64 {
        self.stops.last().map(|s| s.0).unwrap_or(0.0)
    }

    pub fn color_at(&self, value: f64) -> Rgb {
        interpolate(&self.stops, value)
    }

    /// `n` evenly spaced values from `vmin` to `vmax` inclusive.
    pub fn ticks(&self, n: usize) -> Vec<f64> {
        let (lo, hi) = (self.vmin(), self.vmax());
        match n {
            0 => Vec::new(),
            1 => vec![lo],
            _ => (0..n).map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64).collect(),
        }
    }

    /// CSS `linear-gradient` running left to right through every stop.
    pub fn css_gradient(&self) -> String {
        let span = self.vmax() - self.vmin();
        let parts: Vec<String> = self
            .stops
            .iter()
            .map(|(v, c)| {
                let pct = if span > 0.0 { (v - self.vmin()) / span * 100.0 } else { 0.0 };
                format!("{} {:.0}%", c.to_hex(), pct)
            })
            .collect();
        format!("linear-gradient(to right, {})", parts.join(", "))
    }
}

/// Colour for a risk score on the fixed green → yellow → red scale.
///
/// Out-of-range scores clamp; NaN maps to green. Per segment each channel is
/// monotone: red rises 0→255 on `[0, 0.5]` then holds; green rises 128→255
/// on `[0, 0.5]` then falls 255→0 on `[0.5, 1]`; blue stays 0.
pub fn color_for(risk_score: f64) -> Rgb {
    interpolate(&RISK_STOPS, risk_score)
}

fn interpolate(stops: &[(f64, Rgb)], value: f64) -> Rgb {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Rgb::BLACK,
    };
    if value.is_nan() || value <= first.0 {
        return first.1;
    }
    if value >= last.0 {
        return last.1;
    }

    for pair in stops.windows(2) {
        let (v0, c0) = pair[0];
        let (v1, c1) = pair[1];
        if value <= v1 {
            let t = if v1 > v0 { (value - v0) / (v1 - v0) } else { 1.0 };
            return Rgb(lerp(c0.0, c1.0, t), lerp(c0.1, c1.1, t), lerp(c0.2, c1.2, t));
        }
    }
    last.1
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    let v = a as f64 + (b as f64 - a as f64) * t;
    v.round().clamp(0.0, 255.0) as u8
}
