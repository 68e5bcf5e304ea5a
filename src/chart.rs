use std::fmt::Write;

use crate::models::RetentionCurve;

const WIDTH: f64 = 720.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 150.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 60.0;
const PALETTE: [&str; 6] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b",
];

/// Renders the curve as an SVG line chart: days on x, retention percent on
/// y, one marked line per series.
pub fn render_svg(curve: &RetentionCurve) -> String {
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let max_day = curve.days.last().copied().unwrap_or(0).max(1) as f64;
    let x = |day: u32| MARGIN_LEFT + plot_w * day as f64 / max_day;
    let y = |pct: f64| MARGIN_TOP + plot_h * (1.0 - pct / 100.0);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="28" text-anchor="middle" font-size="16">Retention Curve (D0-D{})</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        max_day
    );

    for tick in (0..=100).step_by(20) {
        let ty = y(tick as f64);
        let _ = writeln!(
            svg,
            r##"<line x1="{MARGIN_LEFT}" y1="{ty:.1}" x2="{:.1}" y2="{ty:.1}" stroke="#000" stroke-opacity="0.3" stroke-width="0.5"/>"##,
            MARGIN_LEFT + plot_w
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{tick}</text>"#,
            MARGIN_LEFT - 8.0,
            ty + 4.0
        );
    }

    for &day in &curve.days {
        let tx = x(day);
        let _ = writeln!(
            svg,
            r##"<line x1="{tx:.1}" y1="{MARGIN_TOP}" x2="{tx:.1}" y2="{:.1}" stroke="#000" stroke-opacity="0.3" stroke-width="0.5"/>"##,
            MARGIN_TOP + plot_h
        );
        let _ = writeln!(
            svg,
            r#"<text x="{tx:.1}" y="{:.1}" text-anchor="middle">{day}</text>"#,
            MARGIN_TOP + plot_h + 18.0
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">Days Since Signup</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 15.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="18" y="{:.1}" text-anchor="middle" transform="rotate(-90 18 {:.1})">Retention (%)</text>"#,
        MARGIN_TOP + plot_h / 2.0,
        MARGIN_TOP + plot_h / 2.0
    );

    for (index, series) in curve.series.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let points: Vec<(f64, f64)> = curve
            .days
            .iter()
            .zip(&series.rates)
            .map(|(&day, &rate)| (x(day), y(rate * 100.0)))
            .collect();
        let path = points
            .iter()
            .map(|(px, py)| format!("{px:.1},{py:.1}"))
            .collect::<Vec<_>>()
            .join(" ");

        let _ = writeln!(
            svg,
            r#"<polyline fill="none" stroke="{color}" stroke-width="2" points="{path}"/>"#
        );
        for (px, py) in &points {
            let _ = writeln!(
                svg,
                r#"<circle cx="{px:.1}" cy="{py:.1}" r="3.5" fill="{color}"/>"#
            );
        }

        let ly = MARGIN_TOP + 10.0 + index as f64 * 20.0;
        let lx = MARGIN_LEFT + plot_w + 15.0;
        let _ = writeln!(
            svg,
            r#"<line x1="{lx:.1}" y1="{ly:.1}" x2="{:.1}" y2="{ly:.1}" stroke="{color}" stroke-width="2"/>"#,
            lx + 24.0
        );
        let _ = writeln!(
            svg,
            r#"<circle cx="{:.1}" cy="{ly:.1}" r="3.5" fill="{color}"/>"#,
            lx + 12.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}">{}</text>"#,
            lx + 30.0,
            ly + 4.0,
            escape_xml(&series.label)
        );
    }

    let _ = write!(svg, "</svg>");
    svg
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurveSeries;

    fn curve() -> RetentionCurve {
        RetentionCurve {
            days: (0..=7).collect(),
            series: vec![
                CurveSeries {
                    label: "Overall".to_string(),
                    column: "overall_retention".to_string(),
                    rates: vec![1.0, 0.5, 0.4, 0.3, 0.3, 0.2, 0.2, 0.1],
                },
                CurveSeries {
                    label: "Variant <A>".to_string(),
                    column: "retention_<A>".to_string(),
                    rates: vec![1.0, 0.6, 0.4, 0.3, 0.3, 0.2, 0.2, 0.1],
                },
            ],
        }
    }

    #[test]
    fn one_line_and_marker_per_point() {
        let svg = render_svg(&curve());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        // 8 markers per series plus one legend marker each
        assert_eq!(svg.matches("<circle").count(), 18);
        assert!(svg.contains("Retention Curve (D0-D7)"));
        assert!(svg.contains("Days Since Signup"));
        assert!(svg.contains("Variant &lt;A&gt;"));
    }

    #[test]
    fn full_retention_sits_on_top_edge() {
        let svg = render_svg(&curve());
        let top = format!(r#"cy="{MARGIN_TOP:.1}""#);
        assert!(svg.contains(&top));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render_svg(&curve()), render_svg(&curve()));
    }
}
