//! Deterministic categorical colors spread evenly around the hue circle.

use hashbrown::HashMap;

use crate::error::{AtlasError, Result};

pub const DEFAULT_SATURATION: f64 = 0.7;
pub const DEFAULT_VALUE: f64 = 0.9;

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Convert HSV components in `[0, 1]` to RGB, truncating each channel.
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
        let (r, g, b) = if saturation == 0.0 {
            (value, value, value)
        } else {
            let sector = (hue * 6.0).floor();
            let f = hue * 6.0 - sector;
            let p = value * (1.0 - saturation);
            let q = value * (1.0 - saturation * f);
            let t = value * (1.0 - saturation * (1.0 - f));
            match (sector as i64).rem_euclid(6) {
                0 => (value, t, p),
                1 => (q, value, p),
                2 => (p, value, t),
                3 => (p, q, value),
                4 => (t, p, value),
                _ => (value, p, q),
            }
        };
        Self {
            r: (r * 255.0) as u8,
            g: (g * 255.0) as u8,
            b: (b * 255.0) as u8,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Ordered key to color mapping, fixed once built.
#[derive(Debug, Clone, Default)]
pub struct ColorAssignment {
    entries: Vec<(String, Rgb)>,
    index: HashMap<String, usize>,
}

impl ColorAssignment {
    pub(crate) fn from_entries(entries: Vec<(String, Rgb)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (key, _))| (key.clone(), i))
            .collect();
        Self { entries, index }
    }

    pub fn get(&self, key: &str) -> Option<Rgb> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn hex(&self, key: &str) -> Option<String> {
        self.get(key).map(|c| c.to_hex())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }
}

/// Generates `n` colors at fixed saturation and value.
#[derive(Debug, Clone, Copy)]
pub struct ColorAssigner {
    saturation: f64,
    value: f64,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self {
            saturation: DEFAULT_SATURATION,
            value: DEFAULT_VALUE,
        }
    }
}

impl ColorAssigner {
    pub fn new(saturation: f64, value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&saturation) || !(0.0..=1.0).contains(&value) {
            return Err(AtlasError::invalid(format!(
                "saturation {} and value {} must lie in [0, 1]",
                saturation, value
            )));
        }
        Ok(Self { saturation, value })
    }

    /// Colors for `n` entities; hue of the i-th color is `i / n`.
    pub fn palette(&self, n: usize) -> Result<Vec<Rgb>> {
        if n == 0 {
            return Err(AtlasError::invalid("color count must be at least 1"));
        }
        Ok((0..n)
            .map(|i| Rgb::from_hsv(i as f64 / n as f64, self.saturation, self.value))
            .collect())
    }

    /// Ordinal keys `1..=n` mapped to the palette.
    pub fn assign(&self, n: usize) -> Result<ColorAssignment> {
        let palette = self.palette(n)?;
        Ok(ColorAssignment::from_entries(
            palette
                .into_iter()
                .enumerate()
                .map(|(i, color)| ((i + 1).to_string(), color))
                .collect(),
        ))
    }

    /// Each key gets the palette color at its position. Duplicate keys keep
    /// their first position.
    pub fn assign_keys<I, S>(&self, keys: I) -> Result<ColorAssignment>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        let palette = self.palette(unique.len())?;
        Ok(ColorAssignment::from_entries(
            unique.into_iter().zip(palette).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_color_is_hue_zero() {
        let colors = ColorAssigner::default().assign(1).unwrap();
        assert_eq!(colors.len(), 1);
        assert_eq!(colors.hex("1").as_deref(), Some("#e54444"));
    }

    #[test]
    fn test_three_colors() {
        let colors = ColorAssigner::default().assign(3).unwrap();
        let hexes: Vec<String> = colors.iter().map(|(_, c)| c.to_hex()).collect();
        assert_eq!(hexes.len(), 3);
        assert_eq!(hexes[0], "#e54444");
        assert!(hexes[0] != hexes[1] && hexes[1] != hexes[2] && hexes[0] != hexes[2]);
        // hue 1/3 is green-dominant, 2/3 blue-dominant
        let green = colors.get("2").unwrap();
        let blue = colors.get("3").unwrap();
        assert!(green.g > green.r && green.g > green.b);
        assert!(blue.b > blue.r && blue.b > blue.g);
    }

    #[test]
    fn test_zero_count_is_invalid() {
        assert!(matches!(
            ColorAssigner::default().assign(0),
            Err(AtlasError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_deterministic_and_distinct_up_to_twenty() {
        let assigner = ColorAssigner::default();
        for n in 1..=20 {
            let first = assigner.palette(n).unwrap();
            let second = assigner.palette(n).unwrap();
            assert_eq!(first, second);

            let mut hexes: Vec<String> = first.iter().map(Rgb::to_hex).collect();
            hexes.sort();
            hexes.dedup();
            assert_eq!(hexes.len(), n, "duplicate colors for n = {}", n);
        }
    }

    #[test]
    fn test_assign_keys_follows_key_order() {
        let assigner = ColorAssigner::default();
        let by_key = assigner.assign_keys(["13", "11", "13", "14"]).unwrap();
        let ordinal = assigner.assign(3).unwrap();
        assert_eq!(by_key.len(), 3);
        assert_eq!(by_key.get("13"), ordinal.get("1"));
        assert_eq!(by_key.get("11"), ordinal.get("2"));
        assert_eq!(by_key.get("14"), ordinal.get("3"));
    }

    #[test]
    fn test_rejects_out_of_range_components() {
        assert!(ColorAssigner::new(1.5, 0.9).is_err());
        assert!(ColorAssigner::new(0.7, 0.9).is_ok());
    }
}
