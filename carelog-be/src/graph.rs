//! Chart rendering collaborator
//!
//! Pure functions from labeled series to an opaque, base64-encoded image
//! blob. Callers embed the result directly in responses and never look
//! inside it. The current backend emits SVG; nothing upstream depends on
//! the format.

use base64::{engine::general_purpose, Engine as _};

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 60.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_RIGHT: f64 = 20.0;

const SERIES_COLORS: [&str; 2] = ["#005073", "#60A5FA"];

/// A named series of y values, one per x label
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Paired bar chart of percentage scores per activity, used for the
/// per-guest appreciation graphs. Y axis is fixed to 0-120 so every
/// guest's chart shares a scale.
pub fn percentage_bars(title: &str, labels: &[String], series: &[Series]) -> String {
    let mut svg = svg_open(title);

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let max_y = 120.0;

    axis_lines(&mut svg);
    for step in (0..=120).step_by(20) {
        let y = HEIGHT - MARGIN_BOTTOM - (step as f64 / max_y) * plot_h;
        svg.push_str(&format!(
            "<text x='{:.1}' y='{:.1}' font-size='12' text-anchor='end'>{}</text>",
            MARGIN_LEFT - 6.0,
            y + 4.0,
            step
        ));
    }

    let groups = labels.len().max(1) as f64;
    let group_w = plot_w / groups;
    let bar_w = group_w / (series.len().max(1) as f64 + 1.0);

    for (gi, label) in labels.iter().enumerate() {
        let group_x = MARGIN_LEFT + gi as f64 * group_w;
        for (si, s) in series.iter().enumerate() {
            let value = s.values.get(gi).copied().unwrap_or(0.0).clamp(0.0, max_y);
            let h = value / max_y * plot_h;
            let x = group_x + bar_w * (si as f64 + 0.5);
            svg.push_str(&format!(
                "<rect x='{:.1}' y='{:.1}' width='{:.1}' height='{:.1}' fill='{}'/>",
                x,
                HEIGHT - MARGIN_BOTTOM - h,
                bar_w,
                h,
                SERIES_COLORS[si % SERIES_COLORS.len()]
            ));
        }
        svg.push_str(&format!(
            "<text x='{:.1}' y='{:.1}' font-size='12' text-anchor='middle'>{}</text>",
            group_x + group_w / 2.0,
            HEIGHT - MARGIN_BOTTOM + 18.0,
            escape(label)
        ));
    }

    legend(&mut svg, series);
    svg.push_str("</svg>");
    encode(&svg)
}

/// Line chart of one or more measurement series over dated entries, used
/// for the weight, vitals and per-guest activity histories. Y scale fits
/// the data.
pub fn history_lines(title: &str, x_labels: &[String], series: &[Series]) -> String {
    let mut svg = svg_open(title);

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let max_y = series
        .iter()
        .flat_map(|s| s.values.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max);
    let max_y = if max_y.is_finite() && max_y > 0.0 {
        max_y * 1.1
    } else {
        1.0
    };

    axis_lines(&mut svg);

    let points = x_labels.len();
    let step_x = if points > 1 {
        plot_w / (points - 1) as f64
    } else {
        plot_w
    };

    for (si, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[si % SERIES_COLORS.len()];
        let coords: Vec<String> = s
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = MARGIN_LEFT + i as f64 * step_x;
                let y = HEIGHT - MARGIN_BOTTOM - (v / max_y) * plot_h;
                format!("{:.1},{:.1}", x, y)
            })
            .collect();
        svg.push_str(&format!(
            "<polyline points='{}' fill='none' stroke='{}' stroke-width='2'/>",
            coords.join(" "),
            color
        ));
        for coord in &coords {
            let mut parts = coord.split(',');
            let (x, y) = (parts.next().unwrap_or("0"), parts.next().unwrap_or("0"));
            svg.push_str(&format!("<circle cx='{}' cy='{}' r='3' fill='{}'/>", x, y, color));
        }
    }

    // label at most ~12 x ticks so dense histories stay readable
    let label_every = (points / 12).max(1);
    for (i, label) in x_labels.iter().enumerate() {
        if i % label_every != 0 {
            continue;
        }
        let x = MARGIN_LEFT + i as f64 * step_x;
        svg.push_str(&format!(
            "<text x='{:.1}' y='{:.1}' font-size='11' text-anchor='middle'>{}</text>",
            x,
            HEIGHT - MARGIN_BOTTOM + 18.0,
            escape(label)
        ));
    }

    legend(&mut svg, series);
    svg.push_str("</svg>");
    encode(&svg)
}

fn svg_open(title: &str) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{}' height='{}' viewBox='0 0 {} {}'>\
         <rect width='100%' height='100%' fill='white'/>\
         <text x='{:.1}' y='24' font-size='16' text-anchor='middle'>{}</text>",
        WIDTH,
        HEIGHT,
        WIDTH,
        HEIGHT,
        WIDTH / 2.0,
        escape(title)
    )
}

fn axis_lines(svg: &mut String) {
    svg.push_str(&format!(
        "<line x1='{l:.1}' y1='{t:.1}' x2='{l:.1}' y2='{b:.1}' stroke='#333'/>\
         <line x1='{l:.1}' y1='{b:.1}' x2='{r:.1}' y2='{b:.1}' stroke='#333'/>",
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = HEIGHT - MARGIN_BOTTOM,
        r = WIDTH - MARGIN_RIGHT,
    ));
}

fn legend(svg: &mut String, series: &[Series]) {
    for (si, s) in series.iter().enumerate() {
        let x = MARGIN_LEFT + 10.0 + si as f64 * 160.0;
        svg.push_str(&format!(
            "<rect x='{:.1}' y='{:.1}' width='12' height='12' fill='{}'/>\
             <text x='{:.1}' y='{:.1}' font-size='12'>{}</text>",
            x,
            MARGIN_TOP,
            SERIES_COLORS[si % SERIES_COLORS.len()],
            x + 16.0,
            MARGIN_TOP + 10.0,
            escape(&s.name)
        ));
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn encode(svg: &str) -> String {
    general_purpose::STANDARD.encode(svg.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_is_valid_base64_svg() {
        let chart = percentage_bars(
            "Gradimenti",
            &["PIS".to_string(), "CUC".to_string()],
            &[
                Series {
                    name: "Adesione".to_string(),
                    values: vec![75.0, 100.0],
                },
                Series {
                    name: "Partecipazione".to_string(),
                    values: vec![50.0, 90.0],
                },
            ],
        );

        let decoded = general_purpose::STANDARD.decode(chart).unwrap();
        let svg = String::from_utf8(decoded).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("PIS"));
    }

    #[test]
    fn line_chart_handles_single_point_and_escapes_labels() {
        let chart = history_lines(
            "Peso",
            &["2024-01-01".to_string()],
            &[Series {
                name: "<Peso>".to_string(),
                values: vec![70.0],
            }],
        );

        let decoded = general_purpose::STANDARD.decode(chart).unwrap();
        let svg = String::from_utf8(decoded).unwrap();
        assert!(svg.contains("&lt;Peso&gt;"));
    }

    #[test]
    fn empty_series_still_renders() {
        let chart = history_lines("Peso", &[], &[]);
        assert!(!chart.is_empty());
    }
}
