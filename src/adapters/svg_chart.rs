//! Equity curve as a standalone SVG polyline.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::broker::EquityPoint;
use crate::domain::error::SmacrossError;
use crate::ports::report_port::ReportPort;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 300.0;
const PADDING: f64 = 60.0;

pub struct SvgEquityChart;

pub fn format_equity_chart(equity_curve: &[EquityPoint]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{HEIGHT:.0}" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}">
<rect width="100%" height="100%" fill="white"/>
"#
    );

    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        svg.push_str(&format!(
            "<text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"middle\">No equity data available.</text>\n</svg>\n",
            WIDTH / 2.0,
            HEIGHT / 2.0
        ));
        return svg;
    };

    let min_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(f64::INFINITY, f64::min);
    let max_equity = equity_curve
        .iter()
        .map(|p| p.equity)
        .fold(f64::NEG_INFINITY, f64::max);

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;

    let range = max_equity - min_equity;
    let scale_y = if range > 0.0 { plot_height / range } else { 0.0 };
    let scale_x = if equity_curve.len() > 1 {
        plot_width / (equity_curve.len() - 1) as f64
    } else {
        0.0
    };
    // a flat curve sits mid-plot
    let baseline = if range > 0.0 {
        HEIGHT - PADDING
    } else {
        HEIGHT / 2.0
    };

    let points: Vec<String> = equity_curve
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let x = PADDING + i as f64 * scale_x;
            let y = baseline - (point.equity - min_equity) * scale_y;
            format!("{:.1},{:.1}", x, y)
        })
        .collect();

    let bottom = HEIGHT - PADDING;
    let right = WIDTH - PADDING;
    svg.push_str(&format!(
        "<line x1=\"{PADDING:.0}\" y1=\"{PADDING:.0}\" x2=\"{PADDING:.0}\" y2=\"{bottom:.0}\" stroke=\"black\"/>\n\
         <line x1=\"{PADDING:.0}\" y1=\"{bottom:.0}\" x2=\"{right:.0}\" y2=\"{bottom:.0}\" stroke=\"black\"/>\n"
    ));
    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"blue\" stroke-width=\"1\" points=\"{}\"/>\n",
        points.join(" ")
    ));
    svg.push_str(&format!(
        "<text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"end\" font-size=\"10\">{:.2}</text>\n",
        PADDING - 4.0,
        PADDING + 4.0,
        max_equity
    ));
    svg.push_str(&format!(
        "<text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"end\" font-size=\"10\">{:.2}</text>\n",
        PADDING - 4.0,
        bottom,
        min_equity
    ));
    svg.push_str(&format!(
        "<text x=\"{PADDING:.0}\" y=\"{:.0}\" font-size=\"10\">{}</text>\n",
        bottom + 16.0,
        first.date.format("%Y-%m-%d")
    ));
    svg.push_str(&format!(
        "<text x=\"{right:.0}\" y=\"{:.0}\" text-anchor=\"end\" font-size=\"10\">{}</text>\n",
        bottom + 16.0,
        last.date.format("%Y-%m-%d")
    ));
    svg.push_str("</svg>\n");
    svg
}

impl ReportPort for SvgEquityChart {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SmacrossError> {
        fs::write(output_path, format_equity_chart(&result.equity_curve)).map_err(|e| {
            SmacrossError::Report {
                reason: format!("failed to write {}: {}", output_path.display(), e),
            }
        })
    }
}
