use std::f64::consts::TAU;
use std::io::Cursor;
use std::ops::Range;
use std::sync::OnceLock;

use anyhow::{anyhow, bail, ensure, Context, Result};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontDesc, FontStyle};

use super::{Aggregation, ChartKind, ChartSpec};
use crate::color::{generate_palette, heat_color, is_dark};
use crate::data::aggregate::BoxStats;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const FONT_FAMILY: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Bar colours for the three score series, in `SCORE_COLUMNS` order.
const SERIES_COLORS: [RGBColor; 3] = [
    RGBColor(0, 128, 0),
    RGBColor(0, 255, 255),
    RGBColor(255, 255, 0),
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Draw `aggregation` as described by `spec` and return PNG bytes.
///
/// Output is a pure function of its inputs: the same aggregation always
/// produces the same pixels.
pub fn render_png(spec: &ChartSpec, aggregation: &Aggregation) -> Result<Vec<u8>> {
    ensure_font()?;
    ensure!(
        aggregation.is_finite(),
        "chart '{}' has non-finite values",
        spec.id
    );

    let (width, height) = spec.size;
    let mut buffer = vec![255u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        if aggregation.is_empty() {
            draw_empty(&root, spec)?;
        } else {
            match (spec.kind, aggregation) {
                (ChartKind::CountPlot, Aggregation::Counts(counts)) => {
                    draw_count_plot(&root, spec, counts)?
                }
                (ChartKind::Pie, Aggregation::Counts(counts)) => draw_pie(&root, spec, counts)?,
                (ChartKind::GroupedBar, Aggregation::Means { series, groups }) => {
                    draw_grouped_bars(&root, spec, series, groups)?
                }
                (ChartKind::Heatmap, Aggregation::Means { series, groups }) => {
                    draw_heatmap(&root, spec, series, groups)?
                }
                (ChartKind::Boxplot, Aggregation::Values(values)) => {
                    draw_boxplot(&root, spec, values)?
                }
                (kind, _) => bail!("{kind:?} chart '{}' got a mismatched aggregation", spec.id),
            }
        }
        root.present()?;
    }

    let image = RgbImage::from_raw(width, height, buffer)
        .context("raster buffer does not match chart size")?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("encoding chart as PNG")?;
    Ok(png)
}

/// Register the bundled font once per process.
fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "invalid font data".to_string())
        })
        .clone()
        .map_err(|e| anyhow!("registering chart font: {e}"))
}

/// Numeric axis range; plotters cannot lay out ticks over an infinite one.
fn value_axis(lo: f64, hi: f64) -> Result<Range<f64>> {
    ensure!(
        lo.is_finite() && hi.is_finite() && lo < hi,
        "axis range {lo}..{hi} cannot be drawn"
    );
    Ok(lo..hi)
}

fn font(size: f64) -> FontDesc<'static> {
    (FONT_FAMILY, size).into_font()
}

fn anchored(size: f64, color: &RGBColor, h: HPos, v: VPos) -> TextStyle<'static> {
    font(size).color(color).pos(Pos::new(h, v))
}

fn centered(size: f64, color: &RGBColor) -> TextStyle<'static> {
    anchored(size, color, HPos::Center, VPos::Center)
}

fn segment_label(labels: &[String], v: &SegmentValue<u32>) -> String {
    match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

fn draw_empty(root: &Area, spec: &ChartSpec) -> Result<()> {
    let area = root.titled(spec.title, font(20.0))?;
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(
        "No data",
        (w as i32 / 2, h as i32 / 2),
        centered(16.0, &BLACK),
    ))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Count plot
// ---------------------------------------------------------------------------

fn draw_count_plot(root: &Area, spec: &ChartSpec, counts: &[(String, u64)]) -> Result<()> {
    let n = counts.len() as u32;
    let labels: Vec<String> = counts.iter().map(|(k, _)| k.clone()).collect();
    let y_max = counts.iter().map(|(_, c)| *c).max().unwrap_or(1).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, font(20.0))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), value_axis(0.0, y_max)?)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(counts.len())
        .x_label_formatter(&|v| segment_label(&labels, v))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .label_style(font(12.0))
        .axis_desc_style(font(14.0))
        .draw()?;

    let colors = generate_palette(counts.len());
    chart.draw_series(counts.iter().zip(&colors).enumerate().map(|(i, ((_, c), color))| {
        let i = i as u32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *c as f64)],
            color.filled(),
        );
        bar.set_margin(0, 0, 20, 20);
        bar
    }))?;

    // Count above each bar
    chart.draw_series(counts.iter().enumerate().map(|(i, (_, c))| {
        Text::new(
            c.to_string(),
            (SegmentValue::CenterOf(i as u32), *c as f64),
            anchored(12.0, &BLACK, HPos::Center, VPos::Bottom),
        )
    }))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Grouped bars
// ---------------------------------------------------------------------------

fn draw_grouped_bars(
    root: &Area,
    spec: &ChartSpec,
    series: &[&str],
    groups: &[(String, Vec<f64>)],
) -> Result<()> {
    let n = groups.len() as u32;
    let labels: Vec<String> = groups.iter().map(|(k, _)| k.clone()).collect();
    let y_max = groups
        .iter()
        .flat_map(|(_, means)| means.iter().copied())
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.15;

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, font(20.0))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..n).into_segmented(), value_axis(0.0, y_max)?)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(groups.len())
        .x_label_formatter(&|v| segment_label(&labels, v))
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .label_style(font(12.0))
        .axis_desc_style(font(14.0))
        .draw()?;

    // Bars share one category slot, so place them in pixel space.
    let slots = series.len().max(1) as i32;
    for (i, (_, means)) in groups.iter().enumerate() {
        let i = i as u32;
        let (left, base) = chart.backend_coord(&(SegmentValue::Exact(i), 0.0));
        let (right, _) = chart.backend_coord(&(SegmentValue::Exact(i + 1), 0.0));
        let pad = (right - left) / 8;
        let bar_width = ((right - left) - 2 * pad) / slots;

        for (s, mean) in means.iter().enumerate() {
            let (_, top) = chart.backend_coord(&(SegmentValue::Exact(i), *mean));
            let x0 = left + pad + s as i32 * bar_width;
            let color = SERIES_COLORS[s % SERIES_COLORS.len()];
            root.draw(&Rectangle::new([(x0, top), (x0 + bar_width, base)], color.filled()))?;
            root.draw(&Rectangle::new(
                [(x0, top), (x0 + bar_width, base)],
                BLACK.mix(0.4).stroke_width(1),
            ))?;
        }
    }

    // Legend, top right of the plotting area
    let (plot_x, plot_y) = chart.plotting_area().get_base_pixel();
    let (plot_w, _) = chart.plotting_area().dim_in_pixel();
    let legend_x = plot_x + plot_w as i32 - 140;
    for (s, name) in series.iter().enumerate() {
        let y = plot_y + 12 + s as i32 * 20;
        let color = SERIES_COLORS[s % SERIES_COLORS.len()];
        root.draw(&Rectangle::new([(legend_x, y - 6), (legend_x + 18, y + 6)], color.filled()))?;
        root.draw(&Text::new(
            series_label(name),
            (legend_x + 24, y),
            anchored(12.0, &BLACK, HPos::Left, VPos::Center),
        ))?;
    }
    Ok(())
}

/// "MathScore" → "Math Score"
fn series_label(column: &str) -> String {
    match column.strip_suffix("Score") {
        Some(subject) => format!("{subject} Score"),
        None => column.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

fn draw_heatmap(
    root: &Area,
    spec: &ChartSpec,
    series: &[&str],
    groups: &[(String, Vec<f64>)],
) -> Result<()> {
    let cols = series.len() as u32;
    let rows = groups.len() as u32;
    let col_labels: Vec<String> = series.iter().map(|s| s.to_string()).collect();
    // First group at the top
    let row_labels: Vec<String> = groups.iter().rev().map(|(k, _)| k.clone()).collect();

    let values = groups.iter().flat_map(|(_, means)| means.iter().copied());
    let lo = values.clone().fold(f64::INFINITY, f64::min);
    let hi = values.fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, font(18.0))
        .margin(15)
        .margin_right(90)
        .x_label_area_size(40)
        .y_label_area_size(110)
        .build_cartesian_2d((0..cols).into_segmented(), (0..rows).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(series.len())
        .y_labels(groups.len())
        .x_label_formatter(&|v| segment_label(&col_labels, v))
        .y_label_formatter(&|v| segment_label(&row_labels, v))
        .y_desc(spec.y_label)
        .label_style(font(12.0))
        .axis_desc_style(font(14.0))
        .draw()?;

    for (j, (_, means)) in groups.iter().enumerate() {
        let row = rows - 1 - j as u32;
        for (i, mean) in means.iter().enumerate() {
            let i = i as u32;
            let color = heat_color((mean - lo) / span);
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(i), SegmentValue::Exact(row)),
                    (SegmentValue::Exact(i + 1), SegmentValue::Exact(row + 1)),
                ],
                color.filled(),
            )))?;
            let ink = if is_dark(&color) { WHITE } else { BLACK };
            chart.draw_series(std::iter::once(Text::new(
                format!("{mean:.2}"),
                (SegmentValue::CenterOf(i), SegmentValue::CenterOf(row)),
                centered(13.0, &ink),
            )))?;
        }
    }

    let origin = chart.plotting_area().get_base_pixel();
    let size = chart.plotting_area().dim_in_pixel();
    draw_color_bar(root, origin, size, lo, hi)
}

/// Vertical scale to the right of the heatmap cells.
fn draw_color_bar(
    root: &Area,
    (plot_x, plot_y): (i32, i32),
    (plot_w, plot_h): (u32, u32),
    lo: f64,
    hi: f64,
) -> Result<()> {
    let x0 = plot_x + plot_w as i32 + 20;
    let x1 = x0 + 18;
    let h = plot_h.max(1) as i32;
    for dy in 0..h {
        let t = 1.0 - dy as f64 / h as f64;
        root.draw(&Rectangle::new(
            [(x0, plot_y + dy), (x1, plot_y + dy + 1)],
            heat_color(t).filled(),
        ))?;
    }
    let style = anchored(11.0, &BLACK, HPos::Left, VPos::Center);
    root.draw(&Text::new(format!("{hi:.1}"), (x1 + 4, plot_y), style.clone()))?;
    root.draw(&Text::new(format!("{lo:.1}"), (x1 + 4, plot_y + h), style))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

fn draw_pie(root: &Area, spec: &ChartSpec, counts: &[(String, u64)]) -> Result<()> {
    let area = root.titled(spec.title, font(20.0))?;
    let total: u64 = counts.iter().map(|(_, c)| c).sum();
    let (w, h) = area.dim_in_pixel();
    let center = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = (w.min(h) as f64 / 2.0) * 0.7;

    if total == 0 {
        area.draw(&Text::new(
            "No data",
            (center.0 as i32, center.1 as i32),
            centered(16.0, &BLACK),
        ))?;
        return Ok(());
    }

    let point = |angle: f64, r: f64| -> (i32, i32) {
        (
            (center.0 + r * angle.cos()).round() as i32,
            (center.1 - r * angle.sin()).round() as i32,
        )
    };

    // Counter-clockwise from 3 o'clock
    let colors = generate_palette(counts.len());
    let mut start = 0.0;
    for ((label, count), color) in counts.iter().zip(&colors) {
        let share = *count as f64 / total as f64;
        let sweep = share * TAU;
        if *count > 0 {
            let steps = ((sweep / TAU) * 180.0).ceil().max(2.0) as usize;
            let mut outline = vec![point(0.0, 0.0)];
            outline.extend(
                (0..=steps).map(|k| point(start + sweep * k as f64 / steps as f64, radius)),
            );
            area.draw(&Polygon::new(outline, color.filled()))?;
        }

        let mid = start + sweep / 2.0;
        area.draw(&Text::new(
            label.clone(),
            point(mid, radius * 1.15),
            centered(14.0, &BLACK),
        ))?;
        area.draw(&Text::new(
            format!("{:.2}%", share * 100.0),
            point(mid, radius * 0.6),
            centered(12.0, &BLACK),
        ))?;
        start += sweep;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Boxplot
// ---------------------------------------------------------------------------

fn draw_boxplot(root: &Area, spec: &ChartSpec, values: &[f64]) -> Result<()> {
    let stats = BoxStats::from_values(values).context("boxplot of an empty column")?;

    let lo = stats
        .outliers
        .iter()
        .copied()
        .fold(stats.lower_whisker, f64::min);
    let hi = stats
        .outliers
        .iter()
        .copied()
        .fold(stats.upper_whisker, f64::max);
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, font(20.0))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(20)
        .build_cartesian_2d(value_axis(lo - pad, hi + pad)?, 0f64..1f64)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(1)
        .y_label_formatter(&|_| String::new())
        .x_desc(spec.x_label)
        .label_style(font(12.0))
        .axis_desc_style(font(14.0))
        .draw()?;

    let fill = RGBColor(70, 130, 180);
    let edge = RGBColor(50, 50, 50);
    let (mid, half) = (0.5, 0.2);

    chart.draw_series(std::iter::once(Rectangle::new(
        [(stats.q1, mid - half), (stats.q3, mid + half)],
        fill.filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(stats.q1, mid - half), (stats.q3, mid + half)],
        edge.stroke_width(1),
    )))?;

    let lines = [
        // median
        vec![(stats.median, mid - half), (stats.median, mid + half)],
        // whiskers
        vec![(stats.lower_whisker, mid), (stats.q1, mid)],
        vec![(stats.q3, mid), (stats.upper_whisker, mid)],
        // caps
        vec![
            (stats.lower_whisker, mid - half / 2.0),
            (stats.lower_whisker, mid + half / 2.0),
        ],
        vec![
            (stats.upper_whisker, mid - half / 2.0),
            (stats.upper_whisker, mid + half / 2.0),
        ],
    ];
    chart.draw_series(
        lines
            .into_iter()
            .map(|points| PathElement::new(points, edge.stroke_width(2))),
    )?;

    chart.draw_series(
        stats
            .outliers
            .iter()
            .map(|&v| Circle::new((v, mid), 3, edge.stroke_width(1))),
    )?;
    Ok(())
}
