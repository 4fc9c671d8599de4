//! Static figures: histogram, bar chart and correlation heatmap.

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, ChartBuilder, Color, ColorMap, DerivedColorMap, DrawingArea, Histogram,
    IntoDrawingArea, IntoSegmentedCoord, RGBColor, Rectangle, SegmentValue, Text, TextStyle,
    BLACK, WHITE,
};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};
use shared::{AgentOutput, ImageFormat, RasterFigure, RenderError};
use std::error::Error;
use std::io::Cursor;
use std::sync::Arc;

use crate::theme::{theme, Rgb};

const CAPTION_SIZE: u32 = 24;
const LABEL_SIZE: u32 = 14;
const MIN_SIZE: (u32, u32) = (160, 120);

// diverging scale for correlations in -1..=1
const COOL: RGBColor = RGBColor(59, 76, 192);
const NEUTRAL: RGBColor = RGBColor(221, 221, 221);
const WARM: RGBColor = RGBColor(180, 4, 38);

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FigureData {
    /// `edges` has one more entry than `counts`
    Histogram { edges: Vec<f64>, counts: Vec<usize> },
    Bars { labels: Vec<String>, values: Vec<f64> },
    /// Square matrix with values in -1..=1
    Heatmap {
        labels: Vec<String>,
        matrix: Vec<Vec<f64>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: FigureData,
    /// Overrides the theme's image size
    #[serde(default)]
    pub size: Option<(u32, u32)>,
}

impl Figure {
    pub fn new(title: impl Into<String>, data: FigureData) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            data,
            size: None,
        }
    }

    /// Equal-width histogram over the value range.
    ///
    /// A constant column gets a unit-wide range around its value; the maximum
    /// lands in the last bin.
    pub fn histogram(title: impl Into<String>, column: &str, values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (edges, counts) = if values.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let (lo, hi) = if min == max {
                (min - 0.5, max + 0.5)
            } else {
                (min, max)
            };
            let width = (hi - lo) / bins as f64;
            let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
            let mut counts = vec![0usize; bins];
            for v in values {
                let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
                counts[idx] += 1;
            }
            (edges, counts)
        };
        Self::new(title, FigureData::Histogram { edges, counts })
            .with_labels(column, "Frequency")
    }

    pub fn bars(
        title: impl Into<String>,
        column: &str,
        labels: Vec<String>,
        values: Vec<f64>,
    ) -> Self {
        Self::new(title, FigureData::Bars { labels, values }).with_labels(column, "Count")
    }

    pub fn heatmap(title: impl Into<String>, labels: Vec<String>, matrix: Vec<Vec<f64>>) -> Self {
        Self::new(title, FigureData::Heatmap { labels, matrix })
    }

    pub fn with_labels(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// Rasterize with the theme's colors and font.
    ///
    /// Figures smaller than 160x120 are drawn at that size.
    pub fn render(&self, format: ImageFormat) -> Result<Vec<u8>, RenderError> {
        self.check_drawable()?;
        let theme = theme();
        let (width, height) = self.size.unwrap_or((theme.width, theme.height));
        let size = (width.max(MIN_SIZE.0), height.max(MIN_SIZE.1));

        let mut pixels = vec![0u8; size.0 as usize * size.1 as usize * 3];
        self.draw(&mut pixels, size)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        encode(pixels, size, format)
    }

    /// Axis ranges must be finite and non-empty before plotters sees them
    fn check_drawable(&self) -> Result<(), RenderError> {
        let empty = match &self.data {
            FigureData::Histogram { edges, counts } => {
                edges.len() != counts.len() + 1
                    || edges.iter().any(|e| !e.is_finite())
                    || counts.iter().all(|&c| c == 0)
            }
            FigureData::Bars { values, .. } => {
                values.iter().any(|v| !v.is_finite()) || !values.iter().any(|&v| v > 0.0)
            }
            FigureData::Heatmap { matrix, .. } => matrix.is_empty(),
        };
        if empty {
            return Err(RenderError::EmptyFigure(self.title.clone()));
        }
        Ok(())
    }

    fn draw(&self, pixels: &mut [u8], size: (u32, u32)) -> DrawResult {
        let root = BitMapBackend::with_buffer(pixels, size).into_drawing_area();
        root.fill(&rgb(theme().background))?;
        match &self.data {
            FigureData::Histogram { edges, counts } => self.draw_histogram(&root, edges, counts)?,
            FigureData::Bars { labels, values } => self.draw_bars(&root, labels, values)?,
            FigureData::Heatmap { labels, matrix } => self.draw_heatmap(&root, labels, matrix)?,
        }
        root.present()?;
        Ok(())
    }

    fn draw_histogram(&self, root: &Area, edges: &[f64], counts: &[usize]) -> DrawResult {
        let theme = theme();
        let family = font_family();
        let axis = rgb(theme.axis);
        let lo = edges[0];
        let hi = edges[edges.len() - 1];
        let max = counts.iter().copied().max().unwrap_or(0) as f64;

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (family, CAPTION_SIZE))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(lo..hi, 0.0..max * 1.1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(&self.x_label)
            .y_desc(&self.y_label)
            .axis_style(axis)
            .label_style((family, LABEL_SIZE))
            .axis_desc_style((family, LABEL_SIZE))
            .draw()?;

        let fill = rgb(theme.color(0));
        let edge = rgb(theme.edge);
        chart.draw_series(edges.windows(2).zip(counts).map(|(bin, &count)| {
            Rectangle::new([(bin[0], 0.0), (bin[1], count as f64)], fill.filled())
        }))?;
        chart.draw_series(edges.windows(2).zip(counts).map(|(bin, &count)| {
            Rectangle::new([(bin[0], 0.0), (bin[1], count as f64)], edge.stroke_width(1))
        }))?;
        Ok(())
    }

    fn draw_bars(&self, root: &Area, labels: &[String], values: &[f64]) -> DrawResult {
        let theme = theme();
        let family = font_family();
        let axis = rgb(theme.axis);
        let max = values.iter().copied().fold(0.0, f64::max);

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (family, CAPTION_SIZE))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d((0..values.len() as i32).into_segmented(), 0.0..max * 1.1)?;

        let category = |v: &SegmentValue<i32>| match v {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                labels.get(*i as usize).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(values.len() + 1)
            .x_label_formatter(&category)
            .x_desc(&self.x_label)
            .y_desc(&self.y_label)
            .axis_style(axis)
            .label_style((family, LABEL_SIZE))
            .axis_desc_style((family, LABEL_SIZE))
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(rgb(theme.color(0)).filled())
                .margin(8)
                .data(values.iter().enumerate().map(|(i, v)| (i as i32, *v))),
        )?;
        Ok(())
    }

    /// Square grid with the first label's row on top and each cell annotated.
    fn draw_heatmap(&self, root: &Area, labels: &[String], matrix: &[Vec<f64>]) -> DrawResult {
        let family = font_family();
        let n = matrix.len();
        let span = n as f64;

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (family, CAPTION_SIZE))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d(0.0..span, 0.0..span)?;

        let scale = DerivedColorMap::new(&[COOL, NEUTRAL, WARM]);
        let cells: Vec<(f64, f64, f64)> = matrix
            .iter()
            .enumerate()
            .flat_map(|(row, values)| {
                let y = (n - 1 - row) as f64;
                values
                    .iter()
                    .take(n)
                    .enumerate()
                    .map(move |(col, &value)| (col as f64, y, value))
            })
            .collect();

        chart.draw_series(cells.iter().map(|&(x, y, value)| {
            Rectangle::new([(x, y), (x + 1.0, y + 1.0)], cell_color(&scale, value).filled())
        }))?;
        chart.draw_series(cells.iter().map(|&(x, y, value)| {
            Text::new(
                format!("{:.2}", value),
                (x + 0.5, y + 0.5),
                annotation_style(family, value),
            )
        }))?;

        let tick = TextStyle::from((family, LABEL_SIZE));
        for (i, label) in labels.iter().take(n).enumerate() {
            let center = i as f64 + 0.5;
            let (x, bottom) = chart.backend_coord(&(center, 0.0));
            root.draw(&Text::new(
                label.as_str(),
                (x, bottom + 6),
                tick.pos(Pos::new(HPos::Center, VPos::Top)),
            ))?;
            let (left, y) = chart.backend_coord(&(0.0, span - center));
            root.draw(&Text::new(
                label.as_str(),
                (left - 6, y),
                tick.pos(Pos::new(HPos::Right, VPos::Center)),
            ))?;
        }
        Ok(())
    }
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color[0], color[1], color[2])
}

/// Theme font, or the generic sans-serif family when none was configured
fn font_family() -> &'static str {
    theme().font_family.as_deref().unwrap_or("sans-serif")
}

fn cell_color(scale: &DerivedColorMap<RGBColor>, value: f64) -> RGBColor {
    if value.is_nan() {
        return NEUTRAL;
    }
    scale.get_color_normalized(value, -1.0, 1.0)
}

fn annotation_style(family: &str, value: f64) -> TextStyle<'_> {
    let color = if value.abs() > 0.6 { &WHITE } else { &BLACK };
    TextStyle::from((family, LABEL_SIZE - 2))
        .pos(Pos::new(HPos::Center, VPos::Center))
        .color(color)
}

fn encode(pixels: Vec<u8>, size: (u32, u32), format: ImageFormat) -> Result<Vec<u8>, RenderError> {
    let buffer = RgbImage::from_raw(size.0, size.1, pixels)
        .ok_or_else(|| RenderError::Encode("pixel buffer does not match figure size".into()))?;
    let output = match format {
        ImageFormat::Png => ImageOutputFormat::Png,
        ImageFormat::Jpeg => ImageOutputFormat::Jpeg(90),
    };
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), output)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

impl RasterFigure for Figure {
    fn render_png(&self) -> Result<Vec<u8>, RenderError> {
        self.render(ImageFormat::Png)
    }

    fn title(&self) -> Option<String> {
        Some(self.title.clone())
    }
}

impl AgentOutput for Figure {
    fn as_raster_figure(&self) -> Option<Arc<dyn RasterFigure>> {
        Some(Arc::new(self.clone()))
    }
}

/// Plot handle that owns a figure, like the axes object a plotting call returns.
#[derive(Debug, Clone)]
pub struct AxesHandle {
    figure: Arc<Figure>,
}

impl AxesHandle {
    pub fn new(figure: Figure) -> Self {
        Self {
            figure: Arc::new(figure),
        }
    }

    pub fn figure(&self) -> Arc<Figure> {
        self.figure.clone()
    }
}

impl AgentOutput for AxesHandle {
    fn nested_figure(&self) -> Option<Arc<dyn RasterFigure>> {
        Some(self.figure.clone())
    }
}
