//! Static Chart Renderer
//! Draws chart figures into in-memory RGB bitmaps with plotters.
//!
//! Layout of every figure:
//! 1. Caption centered on top
//! 2. Chart body with light horizontal gridlines
//! 3. Axis descriptions left and bottom, category labels rotated
//!
//! Pie charts skip the axes and place percentage labels inside each slice.

use crate::charts::{ChartBody, ChartData, ChartKind};
use crate::stats::HistogramBin;
use image::RgbImage;
use log::debug;
use plotters::coord::ranged1d::SegmentedCoord;
use plotters::coord::types::{RangedCoordf64, RangedCoordi32};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::FontTransform;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

/// Errors that can occur while rendering a chart
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to encode chart image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, RenderError>;

// Colors
const BAR_BLUE: RGBColor = RGBColor(91, 155, 213);
const BAR_GREEN: RGBColor = RGBColor(112, 173, 71);
const BAR_ORANGE: RGBColor = RGBColor(237, 125, 49);
const LINE_PURPLE: RGBColor = RGBColor(155, 89, 182);
const HIST_TEAL: RGBColor = RGBColor(26, 188, 156);
const DAILY_BLUE: RGBColor = RGBColor(52, 152, 219);
const ROLLING_RED: RGBColor = RGBColor(231, 76, 60);
const GRID: RGBColor = RGBColor(200, 200, 200);

/// Slice colors for pie charts
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

const FONT: &str = "sans-serif";

// Segments in the dashed mean marker, gaps included
const MEAN_DASHES: usize = 30;

type CategoryChart<'a, DB> =
    ChartContext<'a, DB, Cartesian2d<SegmentedCoord<RangedCoordi32>, RangedCoordf64>>;

/// A chart drawn to a packed RGB buffer.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RenderedChart {
    pub fn to_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.rgb.clone()).ok_or_else(|| {
            RenderError::InvalidData(format!(
                "buffer of {} bytes does not hold a {}x{} RGB image",
                self.rgb.len(),
                self.width,
                self.height
            ))
        })
    }

    /// Encode the chart as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_image()?.save(path)?;
        Ok(())
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart in parallel, keeping plan order.
    pub fn render_all(charts: &[ChartData], width: u32, height: u32) -> Result<Vec<RenderedChart>> {
        charts
            .par_iter()
            .map(|chart| Self::render(chart, width, height))
            .collect()
    }

    /// Render one chart into a fresh RGB buffer.
    pub fn render(chart: &ChartData, width: u32, height: u32) -> Result<RenderedChart> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidData(format!(
                "chart size {}x{} is empty",
                width, height
            )));
        }

        let started = Instant::now();
        let mut rgb = vec![255u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
            Self::draw(&root, chart)?;
            root.present()
                .map_err(|e| RenderError::Drawing(e.to_string()))?;
        }
        debug!(
            "Rendered '{}' in {:.1?}",
            chart.title,
            started.elapsed()
        );

        Ok(RenderedChart {
            kind: chart.kind,
            title: chart.title.clone(),
            width,
            height,
            rgb,
        })
    }

    /// Draw a chart onto any plotters drawing area.
    pub fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, chart: &ChartData) -> Result<()> {
        root.fill(&WHITE)
            .map_err(|e| RenderError::DrawingArea(e.to_string()))?;

        match &chart.body {
            ChartBody::Bar { labels, values } => {
                Self::draw_bar(root, chart, labels, values, Self::bar_color(chart.kind))
            }
            ChartBody::Line { labels, values } => Self::draw_line(root, chart, labels, values),
            ChartBody::Histogram { bins, mean } => Self::draw_histogram(root, chart, bins, *mean),
            ChartBody::Pie { labels, values } => Self::draw_pie(root, chart, labels, values),
            ChartBody::DualLine {
                labels,
                values,
                rolling,
                window,
            } => Self::draw_dual_line(root, chart, labels, values, rolling, *window),
        }
    }

    fn bar_color(kind: ChartKind) -> RGBColor {
        match kind {
            ChartKind::RevenuePerCategory => BAR_GREEN,
            ChartKind::TopProducts => BAR_ORANGE,
            _ => BAR_BLUE,
        }
    }

    /// Upper y bound with headroom above the tallest value.
    fn y_top(values: impl Iterator<Item = f64>) -> f64 {
        let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }

    /// Room below the x axis for labels drawn rotated by 90 degrees.
    fn label_area_height(labels: &[String]) -> u32 {
        let longest = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u32;
        (longest * 8 + 40).clamp(60, 220)
    }

    /// Cartesian chart with one slot per label on the x axis.
    fn category_chart<'a, DB: DrawingBackend>(
        root: &'a DrawingArea<DB, Shift>,
        chart: &ChartData,
        labels: &[String],
        y_top: f64,
        max_labels: usize,
    ) -> Result<CategoryChart<'a, DB>> {
        let last = (labels.len() as i32 - 1).max(1);

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, 30))
            .margin(20)
            .x_label_area_size(Self::label_area_height(labels))
            .y_label_area_size(80)
            .build_cartesian_2d((0..last).into_segmented(), 0f64..y_top)
            .map_err(|e| RenderError::ChartConfig(e.to_string()))?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .bold_line_style(GRID.mix(0.6))
            .light_line_style(WHITE)
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .axis_desc_style((FONT, 18))
            .x_labels(labels.len().min(max_labels).max(1))
            .x_label_style((FONT, 14).into_font().transform(FontTransform::Rotate90))
            .x_label_formatter(&|value| match value {
                SegmentValue::CenterOf(idx) => {
                    labels.get(*idx as usize).cloned().unwrap_or_default()
                }
                _ => String::new(),
            })
            .y_label_style((FONT, 14))
            .draw()
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        Ok(ctx)
    }

    fn draw_bar<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
        labels: &[String],
        values: &[f64],
        color: RGBColor,
    ) -> Result<()> {
        let y_top = Self::y_top(values.iter().copied());
        let mut ctx = Self::category_chart(root, chart, labels, y_top, labels.len())?;

        ctx.draw_series(
            Histogram::vertical(&ctx)
                .style(color.filled())
                .margin(10)
                .data(values.iter().enumerate().map(|(idx, v)| (idx as i32, *v))),
        )
        .map_err(|e| RenderError::Drawing(e.to_string()))?;

        Ok(())
    }

    fn draw_line<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
        labels: &[String],
        values: &[f64],
    ) -> Result<()> {
        let y_top = Self::y_top(values.iter().copied());
        let mut ctx = Self::category_chart(root, chart, labels, y_top, 24)?;

        let points: Vec<(SegmentValue<i32>, f64)> = values
            .iter()
            .enumerate()
            .map(|(idx, v)| (SegmentValue::CenterOf(idx as i32), *v))
            .collect();

        ctx.draw_series(LineSeries::new(
            points.iter().cloned(),
            LINE_PURPLE.stroke_width(2),
        ))
        .map_err(|e| RenderError::Drawing(e.to_string()))?;

        ctx.draw_series(
            points
                .iter()
                .map(|point| Circle::new(point.clone(), 5, LINE_PURPLE.filled())),
        )
        .map_err(|e| RenderError::Drawing(e.to_string()))?;

        Ok(())
    }

    fn draw_histogram<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
        bins: &[HistogramBin],
        mean: Option<f64>,
    ) -> Result<()> {
        let (x_min, x_max) = match (bins.first(), bins.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (0.0, 1.0),
        };
        let y_top = Self::y_top(bins.iter().map(|bin| bin.count as f64));

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (FONT, 30))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, 0f64..y_top)
            .map_err(|e| RenderError::ChartConfig(e.to_string()))?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .bold_line_style(GRID.mix(0.6))
            .light_line_style(WHITE)
            .x_desc(chart.x_desc.as_str())
            .y_desc(chart.y_desc.as_str())
            .axis_desc_style((FONT, 18))
            .label_style((FONT, 14))
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        ctx.draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                HIST_TEAL.mix(0.8).filled(),
            )
        }))
        .map_err(|e| RenderError::Drawing(e.to_string()))?;

        // Bin edges
        ctx.draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                BLACK.stroke_width(1),
            )
        }))
        .map_err(|e| RenderError::Drawing(e.to_string()))?;

        if let Some(mean) = mean {
            let step = y_top / MEAN_DASHES as f64;
            ctx.draw_series((0..MEAN_DASHES).step_by(2).map(|i| {
                PathElement::new(
                    vec![(mean, i as f64 * step), (mean, (i + 1) as f64 * step)],
                    ROLLING_RED.stroke_width(2),
                )
            }))
            .map_err(|e| RenderError::Drawing(e.to_string()))?
            .label(format!("Mean: {:.2}", mean))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ROLLING_RED.stroke_width(2)));

            ctx.configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font((FONT, 16))
                .draw()
                .map_err(|e| RenderError::Drawing(e.to_string()))?;
        }

        Ok(())
    }

    fn draw_pie<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
        labels: &[String],
        values: &[f64],
    ) -> Result<()> {
        let area = root
            .titled(&chart.title, (FONT, 30))
            .map_err(|e| RenderError::DrawingArea(e.to_string()))?;

        let (width, height) = area.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);

        // Slices must be positive
        let (slice_labels, sizes): (Vec<String>, Vec<f64>) = labels
            .iter()
            .zip(values)
            .filter(|(_, v)| v.is_finite() && **v > 0.0)
            .map(|(label, v)| (label.clone(), *v))
            .unzip();

        if sizes.is_empty() {
            area.draw(&Text::new("No data", center, (FONT, 24).into_font()))
                .map_err(|e| RenderError::Drawing(e.to_string()))?;
            return Ok(());
        }

        let radius = width.min(height) as f64 * 0.35;
        let colors: Vec<RGBColor> = (0..sizes.len())
            .map(|idx| PALETTE[idx % PALETTE.len()])
            .collect();

        let mut pie = Pie::new(&center, &radius, &sizes[..], &colors[..], &slice_labels[..]);
        pie.label_style((FONT, 18).into_font().color(&BLACK));
        pie.percentages((FONT, 16).into_font().color(&WHITE));

        area.draw(&pie)
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        Ok(())
    }

    fn draw_dual_line<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &ChartData,
        labels: &[String],
        values: &[f64],
        rolling: &[Option<f64>],
        window: usize,
    ) -> Result<()> {
        let y_top = Self::y_top(
            values
                .iter()
                .copied()
                .chain(rolling.iter().flatten().copied()),
        );
        let mut ctx = Self::category_chart(root, chart, labels, y_top, 16)?;

        let daily: Vec<(SegmentValue<i32>, f64)> = values
            .iter()
            .enumerate()
            .map(|(idx, v)| (SegmentValue::CenterOf(idx as i32), *v))
            .collect();

        ctx.draw_series(LineSeries::new(daily, DAILY_BLUE.stroke_width(2)))
            .map_err(|e| RenderError::Drawing(e.to_string()))?
            .label("Daily Orders")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], DAILY_BLUE.stroke_width(2)));

        let smoothed: Vec<(SegmentValue<i32>, f64)> = rolling
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| v.map(|v| (SegmentValue::CenterOf(idx as i32), v)))
            .collect();

        ctx.draw_series(LineSeries::new(smoothed, ROLLING_RED.stroke_width(3)))
            .map_err(|e| RenderError::Drawing(e.to_string()))?
            .label(format!("{}-Day Rolling Avg", window))
            .legend(|(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], ROLLING_RED.stroke_width(3))
            });

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font((FONT, 16))
            .draw()
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartPlan;
    use crate::settings::PipelineSettings;
    use crate::stats::{MonthKey, OrderAggregates, StatsCalculator};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn all_charts() -> PipelineSettings {
        PipelineSettings {
            include_top_products: true,
            ..PipelineSettings::default()
        }
    }

    fn populated_aggregates() -> OrderAggregates {
        let prices = vec![50.0, 30.0, 12.5, 45.0];
        let daily_orders: Vec<(NaiveDate, u64)> = (1..=9)
            .map(|day| (NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), day as u64 % 3 + 1))
            .collect();
        let counts: Vec<f64> = daily_orders.iter().map(|(_, n)| *n as f64).collect();

        OrderAggregates {
            orders_per_category: vec![("Snacks".to_string(), 2), ("Dairy".to_string(), 1)],
            revenue_per_category: vec![("Dairy".to_string(), 12.5), ("Snacks".to_string(), 80.0)],
            top_products_by_quantity: vec![
                ("Chips".to_string(), Some(2.0)),
                ("Milk".to_string(), None),
            ],
            monthly_orders: vec![
                (MonthKey { year: 2024, month: 1 }, 3),
                (MonthKey { year: 2024, month: 2 }, 1),
            ],
            price_summary: StatsCalculator::summarize(&prices),
            prices,
            quantity_per_category: vec![("Dairy".to_string(), 1.0), ("Snacks".to_string(), 3.0)],
            daily_rolling_mean: StatsCalculator::centered_rolling_mean(&counts, 7),
            daily_orders,
            unparsed_order_dates: 0,
        }
    }

    fn empty_aggregates() -> OrderAggregates {
        OrderAggregates {
            orders_per_category: Vec::new(),
            revenue_per_category: Vec::new(),
            top_products_by_quantity: Vec::new(),
            monthly_orders: Vec::new(),
            prices: Vec::new(),
            quantity_per_category: Vec::new(),
            daily_orders: Vec::new(),
            daily_rolling_mean: Vec::new(),
            price_summary: None,
            unparsed_order_dates: 0,
        }
    }

    #[test]
    fn renders_every_chart_in_plan_order() {
        let plan = ChartPlan::build(&populated_aggregates(), &all_charts());
        let rendered = StaticChartRenderer::render_all(&plan, 400, 300).unwrap();

        assert_eq!(rendered.len(), 7);
        for (chart, image) in plan.iter().zip(&rendered) {
            assert_eq!(image.kind, chart.kind);
            assert_eq!(image.rgb.len(), 400 * 300 * 3);
            // Something besides the white background was drawn
            assert!(image.rgb.iter().any(|byte| *byte != 255));
        }
    }

    #[test]
    fn empty_aggregates_still_render() {
        let plan = ChartPlan::build(&empty_aggregates(), &all_charts());
        let rendered = StaticChartRenderer::render_all(&plan, 400, 300).unwrap();

        assert_eq!(rendered.len(), 7);
        assert!(rendered
            .iter()
            .all(|image| image.rgb.len() == 400 * 300 * 3));
    }

    fn blank_chart(width: u32, height: u32) -> RenderedChart {
        RenderedChart {
            kind: ChartKind::PriceDistribution,
            title: "Price Distribution".to_string(),
            width,
            height,
            rgb: vec![255u8; (width * height * 3) as usize],
        }
    }

    #[test]
    fn y_axis_has_headroom() {
        assert!((StaticChartRenderer::y_top([10.0, 20.0].into_iter()) - 22.0).abs() < 1e-9);
        assert_eq!(StaticChartRenderer::y_top(std::iter::empty()), 1.0);
        assert_eq!(StaticChartRenderer::y_top([0.0, f64::NAN].into_iter()), 1.0);
    }

    #[test]
    fn label_area_grows_with_label_length() {
        let short = vec!["Tea".to_string()];
        let long = vec!["Fruits & Vegetables".to_string()];
        assert_eq!(StaticChartRenderer::label_area_height(&short), 64);
        assert!(
            StaticChartRenderer::label_area_height(&long)
                > StaticChartRenderer::label_area_height(&short)
        );
        assert_eq!(StaticChartRenderer::label_area_height(&[]), 60);
    }

    #[test]
    fn bar_colors_follow_chart_kind() {
        assert_eq!(
            StaticChartRenderer::bar_color(ChartKind::RevenuePerCategory),
            BAR_GREEN
        );
        assert_eq!(
            StaticChartRenderer::bar_color(ChartKind::OrdersPerCategory),
            BAR_BLUE
        );
    }

    #[test]
    fn empty_size_is_rejected() {
        let chart = ChartData {
            kind: ChartKind::OrdersPerCategory,
            title: "Number of Orders per Category".to_string(),
            x_desc: String::new(),
            y_desc: String::new(),
            body: ChartBody::Bar {
                labels: Vec::new(),
                values: Vec::new(),
            },
        };
        assert!(matches!(
            StaticChartRenderer::render(&chart, 0, 600),
            Err(RenderError::InvalidData(_))
        ));
    }

    #[test]
    fn saves_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chart.png");

        blank_chart(40, 30).save_png(&path).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 40);
        assert_eq!(decoded.height(), 30);
    }

    #[test]
    fn short_buffer_is_invalid() {
        let mut chart = blank_chart(40, 30);
        chart.rgb.truncate(10);
        assert!(matches!(chart.to_image(), Err(RenderError::InvalidData(_))));
    }
}
