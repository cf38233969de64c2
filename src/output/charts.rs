// Self-contained SVG charts.
//
// Every chart is a standalone `<svg>` string that can be dropped into any of
// the HTML reports; hover text rides along in `<title>` elements so the
// browser shows it as a tooltip without any script.

use crate::assess::{AssessmentResult, Metric, Pivot};

use super::escape_html;
use super::palette::Palette;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 600.0;
const MARGIN: f64 = 50.0;

/// Viridis-like stops, low to high.
const RAMP: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

pub struct ScatterPoint {
    pub x: f32,
    pub y: f32,
    pub label: Option<usize>,
    pub hover: String,
}

pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: String,
}

pub struct BoxSeries {
    pub name: String,
    pub values: Vec<f64>,
    pub color: String,
}

/// Map `v` from [lo, hi] onto [out_lo, out_hi]; a degenerate range maps to the middle.
fn scale(v: f64, lo: f64, hi: f64, out_lo: f64, out_hi: f64) -> f64 {
    if (hi - lo).abs() < f64::EPSILON {
        (out_lo + out_hi) / 2.0
    } else {
        out_lo + (v - lo) / (hi - lo) * (out_hi - out_lo)
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
}

/// Colour for `t` in [0, 1] along the ramp.
pub fn ramp_color(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (RAMP.len() - 1) as f64;
    let i = (pos.floor() as usize).min(RAMP.len() - 2);
    let f = pos - i as f64;
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
    let (a, b) = (RAMP[i], RAMP[i + 1]);
    format!("#{:02x}{:02x}{:02x}", lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

fn svg_open(width: f64, height: f64) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="100%" style="max-width:{width}px;background:#fff;font-family:Arial,sans-serif">"#
    )
}

fn title(text: &str, width: f64) -> String {
    format!(
        r#"<text x="{}" y="24" text-anchor="middle" font-size="18" font-weight="bold">{}</text>"#,
        width / 2.0,
        escape_html(text)
    )
}

/// Projection scatter: clusters as coloured dots, noise as grey crosses.
pub fn scatter_svg(points: &[ScatterPoint], palette: &Palette, heading: &str) -> String {
    let (x_lo, x_hi) = bounds(points.iter().map(|p| p.x as f64));
    let (y_lo, y_hi) = bounds(points.iter().map(|p| p.y as f64));
    let px = |x: f32| scale(x as f64, x_lo, x_hi, MARGIN, WIDTH - MARGIN);
    // SVG y grows downwards.
    let py = |y: f32| scale(y as f64, y_lo, y_hi, HEIGHT - MARGIN, MARGIN);

    let mut svg = svg_open(WIDTH, HEIGHT);
    svg.push_str(&format!(
        r##"<rect x="{m}" y="{m}" width="{}" height="{}" fill="#f7f7f7"/>"##,
        WIDTH - 2.0 * MARGIN,
        HEIGHT - 2.0 * MARGIN,
        m = MARGIN
    ));
    svg.push_str(&title(heading, WIDTH));

    for p in points.iter().filter(|p| p.label.is_none()) {
        let (x, y) = (px(p.x), py(p.y));
        svg.push_str(&format!(
            r#"<path d="M{:.1} {:.1}L{:.1} {:.1}M{:.1} {:.1}L{:.1} {:.1}" stroke="{}" stroke-opacity="0.5"><title>{}</title></path>"#,
            x - 2.5, y - 2.5, x + 2.5, y + 2.5, x - 2.5, y + 2.5, x + 2.5, y - 2.5,
            palette.color(None),
            escape_html(&p.hover)
        ));
    }
    for p in points.iter().filter(|p| p.label.is_some()) {
        svg.push_str(&format!(
            r#"<circle cx="{:.1}" cy="{:.1}" r="3.5" fill="{}" fill-opacity="0.8"><title>{}</title></circle>"#,
            px(p.x),
            py(p.y),
            palette.color(p.label),
            escape_html(&p.hover)
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Vertical bars with the value printed above each bar.
pub fn bar_svg(bars: &[Bar], heading: &str) -> String {
    let width = WIDTH.max(MARGIN * 2.0 + bars.len() as f64 * 18.0);
    let max = bars.iter().map(|b| b.value).fold(0.0f64, f64::max);
    let slot = (width - 2.0 * MARGIN) / bars.len().max(1) as f64;
    let base = HEIGHT - MARGIN - 30.0;

    let mut svg = svg_open(width, HEIGHT);
    svg.push_str(&title(heading, width));
    for (i, bar) in bars.iter().enumerate() {
        let h = scale(bar.value, 0.0, max.max(1.0), 0.0, base - MARGIN);
        let x = MARGIN + i as f64 * slot + slot * 0.1;
        let label_x = x + slot * 0.4;
        svg.push_str(&format!(
            r#"<rect x="{x:.1}" y="{:.1}" width="{:.1}" height="{h:.1}" fill="{}"><title>{}: {}</title></rect>"#,
            base - h,
            slot * 0.8,
            bar.color,
            escape_html(&bar.label),
            bar.value
        ));
        svg.push_str(&format!(
            r#"<text x="{label_x:.1}" y="{:.1}" text-anchor="middle" font-size="10">{}</text>"#,
            base - h - 3.0,
            bar.value
        ));
        svg.push_str(&format!(
            r#"<text x="{label_x:.1}" y="{:.1}" text-anchor="end" font-size="10" transform="rotate(-45 {label_x:.1} {:.1})">{}</text>"#,
            base + 12.0,
            base + 12.0,
            escape_html(&bar.label)
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Horizontal bars, first bar on top.
pub fn hbar_svg(bars: &[Bar], heading: &str) -> String {
    let row = 26.0;
    let label_w = 260.0;
    let height = MARGIN * 2.0 + bars.len() as f64 * row;
    let max = bars.iter().map(|b| b.value).fold(0.0f64, f64::max);

    let mut svg = svg_open(WIDTH, height);
    svg.push_str(&title(heading, WIDTH));
    for (i, bar) in bars.iter().enumerate() {
        let y = MARGIN + i as f64 * row;
        let w = scale(bar.value, 0.0, max.max(1.0), 0.0, WIDTH - MARGIN - label_w - 40.0);
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{}</text>"#,
            label_w - 6.0,
            y + row * 0.6,
            escape_html(&super::truncate_chars(&bar.label, 40))
        ));
        svg.push_str(&format!(
            r#"<rect x="{label_w}" y="{:.1}" width="{w:.1}" height="{:.1}" fill="{}"/>"#,
            y + 3.0,
            row - 6.0,
            bar.color
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" font-size="11">{}</text>"#,
            label_w + w + 4.0,
            y + row * 0.6,
            bar.value
        ));
    }
    svg.push_str("</svg>");
    svg
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Box plots (min, quartiles, max) on a shared 0..1 axis.
pub fn box_svg(series: &[BoxSeries], heading: &str) -> String {
    let width = WIDTH.max(MARGIN * 2.0 + series.len() as f64 * 22.0);
    let slot = (width - 2.0 * MARGIN) / series.len().max(1) as f64;
    let py = |v: f64| scale(v.clamp(0.0, 1.0), 0.0, 1.0, HEIGHT - MARGIN, MARGIN + 10.0);

    let mut svg = svg_open(width, HEIGHT);
    svg.push_str(&title(heading, width));
    for tick in [0.0, 0.25, 0.5, 0.75, 1.0] {
        svg.push_str(&format!(
            r##"<line x1="{MARGIN}" x2="{:.1}" y1="{y:.1}" y2="{y:.1}" stroke="#e0e0e0"/><text x="{:.1}" y="{:.1}" text-anchor="end" font-size="10">{tick}</text>"##,
            width - MARGIN,
            MARGIN - 4.0,
            py(tick) + 3.0,
            y = py(tick)
        ));
    }
    for (i, s) in series.iter().enumerate() {
        let mut v: Vec<f64> = s.values.iter().copied().filter(|x| x.is_finite()).collect();
        if v.is_empty() {
            continue;
        }
        v.sort_by(f64::total_cmp);
        let [min, q1, med, q3, max] = [0.0, 0.25, 0.5, 0.75, 1.0].map(|q| quantile(&v, q));
        let cx = MARGIN + (i as f64 + 0.5) * slot;
        let half = slot * 0.3;
        svg.push_str(&format!(
            r#"<g stroke="{c}"><title>{name}: median {med:.3} (n={n})</title><line x1="{cx:.1}" x2="{cx:.1}" y1="{:.1}" y2="{:.1}"/><rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{c}" fill-opacity="0.35"/><line x1="{:.1}" x2="{:.1}" y1="{:.1}" y2="{:.1}" stroke-width="2"/></g>"#,
            py(max),
            py(min),
            cx - half,
            py(q3),
            half * 2.0,
            (py(q1) - py(q3)).max(1.0),
            cx - half,
            cx + half,
            py(med),
            py(med),
            c = s.color,
            name = escape_html(&s.name),
            n = v.len()
        ));
        svg.push_str(&format!(
            r#"<text x="{cx:.1}" y="{:.1}" text-anchor="middle" font-size="10">{}</text>"#,
            HEIGHT - MARGIN + 14.0,
            escape_html(&s.name)
        ));
    }
    svg.push_str("</svg>");
    svg
}

fn format_cell(metric: Metric, v: f64) -> String {
    match metric {
        Metric::Clusters => format!("{v:.0}"),
        Metric::Noise | Metric::Dbcv => format!("{v:.3}"),
    }
}

/// Assessment heatmap: min_cluster_size across, min_samples down. The chosen
/// pair, if any, is outlined in red.
pub fn heatmap_svg(pivot: &Pivot, metric: Metric, chosen: Option<(usize, usize)>) -> String {
    let cols = pivot.mcs_values.len().max(1) as f64;
    let rows = pivot.ms_values.len().max(1) as f64;
    let left = MARGIN + 30.0;
    let top = MARGIN + 10.0;
    let cell_w = (WIDTH - left - MARGIN) / cols;
    let cell_h = (HEIGHT - top - MARGIN) / rows;
    let (lo, hi) = bounds(pivot.cells.iter().flatten().flatten().copied());

    let mut svg = svg_open(WIDTH, HEIGHT);
    svg.push_str(&title(&format!("Assessment: {}", metric.title()), WIDTH));

    for (r, ms) in pivot.ms_values.iter().enumerate() {
        let y = top + r as f64 * cell_h;
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{ms}</text>"#,
            left - 6.0,
            y + cell_h / 2.0 + 4.0
        ));
        for (c, mcs) in pivot.mcs_values.iter().enumerate() {
            let x = left + c as f64 * cell_w;
            let value = pivot.cells.get(r).and_then(|row| row.get(c)).copied().flatten();
            let (fill, text) = match value {
                Some(v) => (ramp_color(scale(v, lo, hi, 0.0, 1.0)), format_cell(metric, v)),
                None => ("#f0f0f0".to_string(), String::new()),
            };
            let text_color = if value.is_some_and(|v| scale(v, lo, hi, 0.0, 1.0) > 0.6) {
                "#000"
            } else {
                "#fff"
            };
            svg.push_str(&format!(
                r##"<rect x="{x:.1}" y="{y:.1}" width="{cell_w:.1}" height="{cell_h:.1}" fill="{fill}" stroke="#fff"><title>mcs={mcs}, ms={ms}: {text}</title></rect>"##
            ));
            if !text.is_empty() && cell_w > 28.0 {
                svg.push_str(&format!(
                    r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="10" fill="{text_color}">{text}</text>"#,
                    x + cell_w / 2.0,
                    y + cell_h / 2.0 + 4.0
                ));
            }
        }
    }
    for (c, mcs) in pivot.mcs_values.iter().enumerate() {
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="11">{mcs}</text>"#,
            left + (c as f64 + 0.5) * cell_w,
            HEIGHT - MARGIN + 16.0
        ));
    }
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">min_cluster_size</text><text x="14" y="{:.1}" font-size="12" transform="rotate(-90 14 {:.1})" text-anchor="middle">min_samples</text>"#,
        left + (WIDTH - left - MARGIN) / 2.0,
        HEIGHT - 12.0,
        HEIGHT / 2.0,
        HEIGHT / 2.0
    ));

    if let Some((mcs, ms)) = chosen {
        let col = pivot.mcs_values.iter().position(|&v| v == mcs);
        let row = pivot.ms_values.iter().position(|&v| v == ms);
        if let (Some(c), Some(r)) = (col, row) {
            svg.push_str(&format!(
                r#"<rect class="chosen" x="{:.1}" y="{:.1}" width="{cell_w:.1}" height="{cell_h:.1}" fill="none" stroke="red" stroke-width="3"/>"#,
                left + c as f64 * cell_w,
                top + r as f64 * cell_h
            ));
        }
    }
    svg.push_str("</svg>");
    svg
}

/// Noise ratio (reversed, lower is better to the right) against relative
/// validity. Dominated results are grey; the front is coloured and sized by
/// cluster count.
pub fn pareto_svg(all: &[AssessmentResult], front: &[AssessmentResult]) -> String {
    let scored = || all.iter().filter_map(|r| r.dbcv.map(|d| (r, d)));
    let (x_lo, x_hi) = bounds(scored().map(|(r, _)| r.noise_ratio));
    let (y_lo, y_hi) = bounds(scored().map(|(_, d)| d));
    let (n_lo, n_hi) = bounds(front.iter().map(|r| r.n_clusters as f64));
    let px = |v: f64| scale(v, x_lo, x_hi, WIDTH - MARGIN, MARGIN + 20.0);
    let py = |v: f64| scale(v, y_lo, y_hi, HEIGHT - MARGIN, MARGIN);

    let mut svg = svg_open(WIDTH, HEIGHT);
    svg.push_str(&title("Pareto Front of HDBSCAN Parameters", WIDTH));
    for (r, d) in scored() {
        svg.push_str(&format!(
            r##"<circle cx="{:.1}" cy="{:.1}" r="3" fill="#d3d3d3" fill-opacity="0.6"/>"##,
            px(r.noise_ratio),
            py(d)
        ));
    }
    for r in front {
        let Some(d) = r.dbcv else { continue };
        let t = scale(r.n_clusters as f64, n_lo, n_hi, 0.0, 1.0);
        let radius = 4.0 + (r.n_clusters as f64).sqrt();
        svg.push_str(&format!(
            r#"<circle class="front" cx="{:.1}" cy="{:.1}" r="{radius:.1}" fill="{}" stroke="darkslategrey"><title>DBCV Score: {d:.4}
Noise Ratio: {:.2}%
Num Clusters: {}
min_cluster_size: {}
min_samples: {}</title></circle>"#,
            px(r.noise_ratio),
            py(d),
            ramp_color(t),
            r.noise_ratio * 100.0,
            r.n_clusters,
            r.min_cluster_size,
            r.min_samples
        ));
    }
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13">Noise ratio (lower is better) &#8594;</text><text x="16" y="{:.1}" font-size="13" transform="rotate(-90 16 {:.1})" text-anchor="middle">DBCV score (higher is better) &#8594;</text>"#,
        WIDTH / 2.0,
        HEIGHT - 12.0,
        HEIGHT / 2.0,
        HEIGHT / 2.0
    ));
    svg.push_str("</svg>");
    svg
}

/// Wrap chart markup in a minimal standalone page.
pub fn html_page(page_title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{t}</title>
<style>
body {{ font-family: -apple-system, "Segoe UI", Roboto, Arial, sans-serif; background: #f8f9fa; color: #333; margin: 0; padding: 20px; }}
.container {{ max-width: 1600px; margin: auto; background: #fff; padding: 30px; border-radius: 8px; box-shadow: 0 4px 12px rgba(0,0,0,0.08); }}
h1 {{ color: #0056b3; text-align: center; }}
.chart {{ margin: 20px 0; }}
.grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(600px, 1fr)); gap: 20px; }}
</style>
</head>
<body>
<div class="container">
<h1>{t}</h1>
{body}
</div>
</body>
</html>
"#,
        t = escape_html(page_title)
    )
}
