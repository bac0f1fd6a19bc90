//! Sequential color ramps mapping unit values to fills.

use serde::Deserialize;

use super::color::{ColorAssignment, Rgb};

const fn rgb(hex: u32) -> Rgb {
    Rgb {
        r: (hex >> 16) as u8,
        g: (hex >> 8) as u8,
        b: hex as u8,
    }
}

const VIRIDIS: [Rgb; 5] = [rgb(0x440154), rgb(0x3b528b), rgb(0x21918c), rgb(0x5ec962), rgb(0xfde725)];
const YL_OR_RD: [Rgb; 5] = [rgb(0xffffb2), rgb(0xfecc5c), rgb(0xfd8d3c), rgb(0xf03b20), rgb(0xbd0026)];
const BLUES: [Rgb; 5] = [rgb(0xeff3ff), rgb(0xbdd7e7), rgb(0x6baed6), rgb(0x3182bd), rgb(0x08519c)];

/// Named ramp, low values first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ramp {
    #[default]
    Viridis,
    YlOrRd,
    Blues,
}

impl Ramp {
    pub fn stops(&self) -> &'static [Rgb] {
        match self {
            Ramp::Viridis => &VIRIDIS,
            Ramp::YlOrRd => &YL_OR_RD,
            Ramp::Blues => &BLUES,
        }
    }

    /// Color at `t` in `[0, 1]`, linearly interpolated between stops.
    pub fn at(&self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (stops.len() - 1) as f64;
        let i = (scaled.floor() as usize).min(stops.len() - 2);
        let f = scaled - i as f64;
        let (a, b) = (stops[i], stops[i + 1]);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
        Rgb {
            r: mix(a.r, b.r),
            g: mix(a.g, b.g),
            b: mix(a.b, b.b),
        }
    }
}

/// Linear value range mapped onto a ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    pub min: f64,
    pub max: f64,
    pub ramp: Ramp,
}

impl ValueScale {
    /// Range covering every finite value; `None` when there are none.
    pub fn spanning<I>(values: I, ramp: Ramp) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |range: Option<(f64, f64)>, v| match range {
                Some((min, max)) => Some((min.min(v), max.max(v))),
                None => Some((v, v)),
            })
            .map(|(min, max)| Self { min, max, ramp })
    }

    /// A single-valued range paints everything with the low end of the ramp.
    pub fn color(&self, value: f64) -> Rgb {
        let span = self.max - self.min;
        let t = if span > 0.0 { (value - self.min) / span } else { 0.0 };
        self.ramp.at(t)
    }

    /// Colors keyed by unit code.
    pub fn assign<'a, I>(&self, values: I) -> ColorAssignment
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        ColorAssignment::from_entries(
            values
                .into_iter()
                .map(|(code, value)| (code.to_string(), self.color(value)))
                .collect(),
        )
    }

    /// `n` evenly spaced values from `min` to `max`, for legend labels.
    pub fn ticks(&self, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => (0..n)
                .map(|i| self.min + (self.max - self.min) * i as f64 / (n - 1) as f64)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_ends_and_midpoint() {
        assert_eq!(Ramp::Viridis.at(0.0).to_hex(), "#440154");
        assert_eq!(Ramp::Viridis.at(1.0).to_hex(), "#fde725");
        assert_eq!(Ramp::Viridis.at(0.5).to_hex(), "#21918c");
        assert_eq!(Ramp::Blues.at(-3.0), Ramp::Blues.at(0.0));
        assert_eq!(Ramp::YlOrRd.at(f64::NAN), Ramp::YlOrRd.at(0.0));

        // halfway between the first two stops
        assert_eq!(Ramp::YlOrRd.at(0.125).to_hex(), "#ffe687");
    }

    #[test]
    fn test_scale_colors_values() {
        // 千代田区, 中央区, 港区
        let values = [("13101", 100.0), ("13102", 200.0), ("13103", 300.0)];
        let scale = ValueScale::spanning(values.iter().map(|(_, v)| *v), Ramp::Viridis).unwrap();
        assert_eq!((scale.min, scale.max), (100.0, 300.0));

        let colors = scale.assign(values);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors.hex("13101").as_deref(), Some("#440154"));
        assert_eq!(colors.hex("13102").as_deref(), Some("#21918c"));
        assert_eq!(colors.hex("13103").as_deref(), Some("#fde725"));
        assert_eq!(scale.ticks(3), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_degenerate_ranges() {
        assert_eq!(ValueScale::spanning(Vec::new(), Ramp::Blues), None);
        assert_eq!(ValueScale::spanning([f64::NAN], Ramp::Blues), None);

        let flat = ValueScale::spanning([5.0, 5.0], Ramp::Blues).unwrap();
        assert_eq!(flat.color(5.0).to_hex(), "#eff3ff");
        assert_eq!(flat.ticks(1), vec![5.0]);
    }

    #[test]
    fn test_ramp_names() {
        #[derive(Deserialize)]
        struct Named {
            ramp: Ramp,
        }
        let named: Named = toml::from_str("ramp = \"yl_or_rd\"").unwrap();
        assert_eq!(named.ramp, Ramp::YlOrRd);
    }
}
