use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;

use crate::analytics::{AnalysisData, Bin, TermSeries};
use crate::error::{DashboardError, Result};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 400;
const FONT: &str = "sans-serif";

const TERM_COLORS: [RGBColor; 3] = [
    RGBColor(0x34, 0x98, 0xdb),
    RGBColor(0x2e, 0xcc, 0x71),
    RGBColor(0xe7, 0x4c, 0x3c),
];
const GREEN: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const ORANGE: RGBColor = RGBColor(0xff, 0xa5, 0x00);
const PIE_COLORS: [RGBColor; 2] = [RGBColor(0x34, 0x98, 0xdb), RGBColor(0xe7, 0x4c, 0x3c)];

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Every chart of the analysis page, rendered once as inline SVG.
#[derive(Debug, Clone)]
pub struct ChartSet {
    pub grade_box: String,
    pub final_grade_histogram: String,
    pub average_trend: String,
    pub pass_rate_bars: String,
    pub gender_pie: String,
    pub age_histogram: String,
}

pub fn render_all(data: &AnalysisData) -> Result<ChartSet> {
    Ok(ChartSet {
        grade_box: render(|svg| draw_box_plot(svg, &data.term_series))?,
        final_grade_histogram: render(|svg| {
            draw_histogram(svg, "Final Term Grade Distribution", "Grade", &data.final_grade_histogram, GREEN, false)
        })?,
        average_trend: render(|svg| draw_trend(svg, &data.average_trend))?,
        pass_rate_bars: render(|svg| draw_pass_rates(svg, &data.pass_rates))?,
        gender_pie: render(|svg| draw_pie(svg, "Gender Distribution", &data.gender_counts))?,
        age_histogram: render(|svg| draw_histogram(svg, "Age Distribution", "Age", &data.age_histogram, ORANGE, true))?,
    })
}

fn render<F>(draw: F) -> Result<String>
where
    F: FnOnce(&mut String) -> DrawResult,
{
    let mut svg = String::new();
    draw(&mut svg).map_err(|e| DashboardError::Chart(e.to_string()))?;
    Ok(svg)
}

fn draw_placeholder(root: &DrawingArea<SVGBackend<'_>, Shift>, title: &str) -> DrawResult {
    root.draw(&Text::new(
        format!("{title}: no data"),
        (20, (HEIGHT / 2) as i32),
        (FONT, 18).into_font().color(&BLACK),
    ))?;
    root.present()?;
    Ok(())
}

fn term_axis_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

fn draw_box_plot(svg: &mut String, series: &[TermSeries]) -> DrawResult {
    let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    if series.is_empty() {
        return draw_placeholder(&root, "Grade Distribution Across Terms");
    }

    let y_max = series.iter().map(|s| s.spread.max).fold(20.0, f64::max) + 1.0;
    let y_min = series.iter().map(|s| s.spread.min).fold(0.0, f64::min);
    let labels: Vec<String> = series.iter().map(|s| s.label.clone()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption("Grade Distribution Across Terms", (FONT, 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(-0.5f64..(series.len() as f64 - 0.5), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(series.len() * 2 + 1)
        .x_label_formatter(&|x: &f64| term_axis_label(&labels, *x))
        .x_desc("Term")
        .y_desc("Grade")
        .draw()?;

    for (i, term) in series.iter().enumerate() {
        let color = TERM_COLORS[i % TERM_COLORS.len()];
        let x = i as f64;
        let s = &term.spread;

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(x - 0.25, s.q1), (x + 0.25, s.q3)],
                color.mix(0.35).filled(),
            )))?
            .label(term.label.clone())
            .legend(move |(lx, ly)| Rectangle::new([(lx, ly - 5), (lx + 10, ly + 5)], color.filled()));

        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.25, s.q1), (x + 0.25, s.q3)],
            color.stroke_width(2),
        )))?;

        let strokes = vec![
            vec![(x - 0.25, s.median), (x + 0.25, s.median)],
            vec![(x, s.min), (x, s.q1)],
            vec![(x, s.q3), (x, s.max)],
            vec![(x - 0.1, s.min), (x + 0.1, s.min)],
            vec![(x - 0.1, s.max), (x + 0.1, s.max)],
        ];
        chart.draw_series(strokes.into_iter().map(|points| PathElement::new(points, color.stroke_width(2))))?;
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_histogram(svg: &mut String, title: &str, x_desc: &str, bins: &[Bin], color: RGBColor, outline: bool) -> DrawResult {
    let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let (first, last) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return draw_placeholder(&root, title),
    };

    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(first.start..last.end, 0f64..(max_count * 1.1 + 1.0))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Count")
        .draw()?;

    // leave a small gap between neighbouring bars
    let gap = (last.end - first.start) / bins.len() as f64 * 0.05;
    let bar = |b: &Bin| [(b.start + gap, 0.0), (b.end - gap, b.count as f64)];

    chart.draw_series(bins.iter().map(|b| Rectangle::new(bar(b), color.filled())))?;
    if outline {
        chart.draw_series(bins.iter().map(|b| Rectangle::new(bar(b), WHITE.stroke_width(1))))?;
    }

    root.present()?;
    Ok(())
}

fn draw_trend(svg: &mut String, trend: &[(String, f64)]) -> DrawResult {
    let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    if trend.is_empty() {
        return draw_placeholder(&root, "Average Grade Trend");
    }

    let labels: Vec<String> = trend.iter().map(|(label, _)| label.clone()).collect();
    let points: Vec<(f64, f64)> = trend.iter().enumerate().map(|(i, (_, avg))| (i as f64, *avg)).collect();
    let lo = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min) - 1.0;
    let hi = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max) + 1.0;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Grade Trend", (FONT, 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(-0.25f64..(trend.len() as f64 - 0.75), lo..hi)?;

    chart
        .configure_mesh()
        .x_labels(trend.len() * 2 + 1)
        .x_label_formatter(&|x: &f64| term_axis_label(&labels, *x))
        .x_desc("Term")
        .y_desc("Average")
        .draw()?;

    let line = TERM_COLORS[0];
    chart.draw_series(LineSeries::new(points.clone(), line.stroke_width(2)))?;
    chart.draw_series(points.into_iter().map(|p| Circle::new(p, 6, line.filled())))?;

    root.present()?;
    Ok(())
}

fn draw_pass_rates(svg: &mut String, rates: &[(String, f64)]) -> DrawResult {
    let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    if rates.is_empty() {
        return draw_placeholder(&root, "Pass Rate by Term (%)");
    }

    let labels: Vec<String> = rates.iter().map(|(label, _)| label.clone()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption("Pass Rate by Term (%)", (FONT, 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(-0.5f64..(rates.len() as f64 - 0.5), 0f64..105f64)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(rates.len() * 2 + 1)
        .x_label_formatter(&|x: &f64| term_axis_label(&labels, *x))
        .x_desc("Term")
        .y_desc("Pass Rate")
        .draw()?;

    for (i, (label, rate)) in rates.iter().enumerate() {
        let color = TERM_COLORS[i % TERM_COLORS.len()];
        let x = i as f64;
        chart
            .draw_series(std::iter::once(Rectangle::new([(x - 0.3, 0.0), (x + 0.3, *rate)], color.filled())))?
            .label(label.clone())
            .legend(move |(lx, ly)| Rectangle::new([(lx, ly - 5), (lx + 10, ly + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

fn display_gender(raw: &str) -> String {
    match raw.to_ascii_lowercase().as_str() {
        "m" | "male" => "Male".to_string(),
        "f" | "female" => "Female".to_string(),
        _ => raw.to_string(),
    }
}

fn draw_pie(svg: &mut String, title: &str, counts: &[(String, usize)]) -> DrawResult {
    let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return draw_placeholder(&root, title);
    }

    let area = root.titled(title, (FONT, 20))?;
    let (w, h) = area.dim_in_pixel();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = (w.min(h) as f64 / 2.0) * 0.85;

    // slices start at twelve o'clock and run clockwise
    let mut start = -PI / 2.0;
    for (i, (label, count)) in counts.iter().enumerate() {
        let share = *count as f64 / total as f64;
        let end = start + share * 2.0 * PI;
        let color = PIE_COLORS[i % PIE_COLORS.len()];

        let steps = ((share * 120.0).ceil() as usize).max(2);
        let mut points = vec![(cx as i32, cy as i32)];
        points.extend((0..=steps).map(|k| {
            let theta = start + (end - start) * k as f64 / steps as f64;
            ((cx + radius * theta.cos()) as i32, (cy + radius * theta.sin()) as i32)
        }));
        area.draw(&Polygon::new(points, color.filled()))?;

        let mid = (start + end) / 2.0;
        let text_pos = (
            (cx + radius * 0.55 * mid.cos()) as i32 - 40,
            (cy + radius * 0.55 * mid.sin()) as i32,
        );
        area.draw(&Text::new(
            format!("{} {:.1}%", display_gender(label), share * 100.0),
            text_pos,
            (FONT, 14).into_font().color(&WHITE),
        ))?;

        start = end;
    }

    root.present()?;
    Ok(())
}
