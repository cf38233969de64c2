// Cluster colours.
//
// Hues are spread evenly around the wheel; saturation and value alternate a
// little so neighbouring clusters stay distinguishable. Noise is always grey.

use std::collections::BTreeMap;

pub const NOISE_COLOR: &str = "#cccccc";
/// Used for labels the palette does not know about.
pub const FALLBACK_COLOR: &str = "#6c757d";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    colors: BTreeMap<usize, String>,
}

impl Palette {
    pub fn color(&self, label: Option<usize>) -> &str {
        match label {
            None => NOISE_COLOR,
            Some(l) => self.colors.get(&l).map_or(FALLBACK_COLOR, String::as_str),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Assign a colour to every distinct non-noise label, in ascending label order.
pub fn cluster_colors(labels: &[Option<usize>]) -> Palette {
    let mut distinct: Vec<usize> = labels.iter().flatten().copied().collect();
    distinct.sort_unstable();
    distinct.dedup();

    let n = distinct.len();
    let colors = distinct
        .into_iter()
        .enumerate()
        .map(|(i, label)| {
            let hue = i as f64 / n as f64;
            let saturation = 0.7 + (i % 3) as f64 * 0.1;
            let value = 0.8 + (i % 2) as f64 * 0.1;
            (label, hex(hsv_to_rgb(hue, saturation, value)))
        })
        .collect();
    Palette { colors }
}

/// HSV in [0, 1] to RGB in [0, 1].
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

fn hex((r, g, b): (f64, f64, f64)) -> String {
    let channel = |c: f64| (c * 255.0).clamp(0.0, 255.0) as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}
