use crate::{floating_type_mod::FT, V};

pub type Color = V<FT, 3>;

pub fn rgb(r: FT, g: FT, b: FT) -> Color {
    [r, g, b].into()
}

/// Piecewise linear color ramp, clamped at both ends.
#[derive(Debug, Clone)]
pub struct ColorMap {
    insertions: Vec<(FT, Color)>,
}

impl ColorMap {
    pub fn new(mut insertions: Vec<(FT, Color)>) -> Self {
        assert!(!insertions.is_empty(), "color map without color stops");
        insertions.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { insertions }
    }

    /// Stops at evenly spaced values between `min` and `max`.
    fn evenly_spaced(min: FT, max: FT, colors: &[Color]) -> Self {
        let last = (colors.len() - 1).max(1) as FT;
        Self::new(
            colors
                .iter()
                .enumerate()
                .map(|(k, &color)| (min + (max - min) * (k as FT / last), color))
                .collect(),
        )
    }

    /// Blue, gray, red. For signed quantities centered at the middle of the range.
    pub fn cool_warm(min: FT, max: FT) -> Self {
        Self::evenly_spaced(
            min,
            max,
            &[
                rgb(0.22999950386952345, 0.2989989340493756, 0.754000138575591),
                rgb(0.5524330890413098, 0.6906585786005898, 0.9955704993088657),
                rgb(0.8654839660787582, 0.8654839660787582, 0.8654839660787582),
                rgb(0.9568007859420009, 0.5977120617938787, 0.4767583622687218),
                rgb(0.7060001359200572, 0.015991824033980033, 0.1500000275362122),
            ],
        )
    }

    /// Perceptually uniform dark blue to yellow.
    pub fn viridis(min: FT, max: FT) -> Self {
        Self::evenly_spaced(
            min,
            max,
            &[
                rgb(0.2670039853213788, 0.0048725657145795975, 0.32941506855247793),
                rgb(0.2293101608049881, 0.3221334855108584, 0.5457299873740213),
                rgb(0.12756799999999998, 0.566949, 0.550556),
                rgb(0.369214, 0.788888, 0.382914),
                rgb(0.993248, 0.906157, 0.143936),
            ],
        )
    }

    pub fn get(&self, x: FT) -> Color {
        let first = self.insertions[0];
        let last = self.insertions[self.insertions.len() - 1];
        if !(x > first.0) {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        for window in self.insertions.windows(2) {
            let (x0, c0) = window[0];
            let (x1, c1) = window[1];
            if x >= x0 && x <= x1 {
                let interp = (x - x0) / (x1 - x0);
                return c0 + interp * (c1 - c0);
            }
        }

        last.1
    }

    pub fn get_u8(&self, x: FT) -> [u8; 3] {
        to_u8(self.get(x))
    }

    pub fn color_stops(&self) -> &[(FT, Color)] {
        &self.insertions
    }
}

pub fn to_u8(color: Color) -> [u8; 3] {
    let c = color.map(|f| (f.max(0.).min(1.) * 255.).round() as u8);
    [c.x, c.y, c.z]
}

#[cfg(test)]
mod tests {
    use super::{rgb, to_u8, ColorMap};
    use crate::floating_type_mod::FT;

    #[test]
    fn interpolates_between_stops() {
        let map = ColorMap::new(vec![(1., rgb(1., 1., 1.)), (0., rgb(0., 0., 0.))]);
        assert_eq!(map.get(0.25), rgb(0.25, 0.25, 0.25));
        assert_eq!(map.color_stops()[0].0, 0.);
    }

    #[test]
    fn clamps_outside_range() {
        let map = ColorMap::viridis(-2., 2.);
        assert_eq!(map.get(-100.), map.color_stops()[0].1);
        assert_eq!(map.get(100.), map.color_stops()[4].1);
        assert_eq!(map.get(FT::NAN), map.color_stops()[0].1);
    }

    #[test]
    fn evenly_spaced_stops() {
        let map = ColorMap::cool_warm(0., 8.);
        let xs: Vec<_> = map.color_stops().iter().map(|s| s.0).collect();
        assert_eq!(xs, vec![0., 2., 4., 6., 8.]);
    }

    #[test]
    fn u8_conversion_saturates() {
        assert_eq!(to_u8(rgb(-1., 0.5, 2.)), [0, 128, 255]);
    }
}
