//! Renderable artifacts produced by the insight pipeline and the response
//! classifier.
//!
//! Charts wrap one of three plotting representations. Each representation is
//! described by the capability it exposes rather than by a concrete type, so
//! new figure producers only need to implement the matching trait.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::error::RenderError;

/// Output encodings a figure can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// A figure that can rasterize itself directly
pub trait RasterFigure: fmt::Debug + Send + Sync {
    /// Render to PNG bytes
    fn render_png(&self) -> Result<Vec<u8>, RenderError>;

    /// Title shown above the plot, if any
    fn title(&self) -> Option<String> {
        None
    }
}

/// An interactive figure with its own static-image export path
pub trait StaticImageExport: fmt::Debug + Send + Sync {
    fn to_image(&self, format: ImageFormat) -> Result<Vec<u8>, RenderError>;

    fn title(&self) -> Option<String> {
        None
    }
}

/// Which plotting representation a chart wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LibraryKind {
    StaticFigure,
    InteractiveFigure,
    SavedFilePath,
}

/// What a chart shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    Histogram,
    Bar,
    Heatmap,
    /// Produced outside the insight pipeline (agent answers)
    External,
}

impl ChartKind {
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Histogram => "histogram",
            ChartKind::Bar => "bar",
            ChartKind::Heatmap => "heatmap",
            ChartKind::External => "chart",
        }
    }
}

/// Where a chart came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub chart_kind: ChartKind,
    /// Source column names, in plot order
    pub columns: Vec<String>,
    pub dataset: Option<String>,
    pub title: String,
    /// Interestingness score; 0.0 when not computed
    #[serde(default)]
    pub score: f64,
}

impl Provenance {
    pub fn new(chart_kind: ChartKind, columns: Vec<String>, title: impl Into<String>) -> Self {
        Self {
            chart_kind,
            columns,
            dataset: None,
            title: title.into(),
            score: 0.0,
        }
    }

    /// Provenance for a chart handed over by the agent
    pub fn external(title: impl Into<String>) -> Self {
        Self::new(ChartKind::External, Vec::new(), title)
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chart_kind.name())?;
        if !self.columns.is_empty() {
            write!(f, " of [{}]", self.columns.join(", "))?;
        }
        if let Some(dataset) = &self.dataset {
            write!(f, " in '{}'", dataset)?;
        }
        Ok(())
    }
}

/// The plotting object behind a chart
#[derive(Debug, Clone)]
pub enum ChartPayload {
    Static(Arc<dyn RasterFigure>),
    Interactive(Arc<dyn StaticImageExport>),
    SavedFile(PathBuf),
}

/// A chart plus the provenance needed to export and verify it.
///
/// The library kind is derived from the payload, so the two cannot disagree.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub payload: ChartPayload,
    pub provenance: Provenance,
}

impl ChartArtifact {
    pub fn new(payload: ChartPayload, provenance: Provenance) -> Self {
        Self {
            payload,
            provenance,
        }
    }

    pub fn static_figure(figure: Arc<dyn RasterFigure>, provenance: Provenance) -> Self {
        Self::new(ChartPayload::Static(figure), provenance)
    }

    pub fn interactive(figure: Arc<dyn StaticImageExport>, provenance: Provenance) -> Self {
        Self::new(ChartPayload::Interactive(figure), provenance)
    }

    pub fn saved_file(path: impl Into<PathBuf>, provenance: Provenance) -> Self {
        Self::new(ChartPayload::SavedFile(path.into()), provenance)
    }

    pub fn library_kind(&self) -> LibraryKind {
        match self.payload {
            ChartPayload::Static(_) => LibraryKind::StaticFigure,
            ChartPayload::Interactive(_) => LibraryKind::InteractiveFigure,
            ChartPayload::SavedFile(_) => LibraryKind::SavedFilePath,
        }
    }

    pub fn saved_path(&self) -> Option<&Path> {
        match &self.payload {
            ChartPayload::SavedFile(path) => Some(path),
            _ => None,
        }
    }
}

/// Kind tag of a [`RenderableResponse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKind {
    Text,
    Table,
    Chart,
    Error,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseKind::Text => write!(f, "text"),
            ResponseKind::Table => write!(f, "table"),
            ResponseKind::Chart => write!(f, "chart"),
            ResponseKind::Error => write!(f, "error"),
        }
    }
}

/// One unit of output for the rendering layer
#[derive(Debug, Clone)]
pub enum RenderableResponse {
    Text(String),
    Table(Dataset),
    Chart(ChartArtifact),
    Error(String),
}

impl RenderableResponse {
    pub fn kind(&self) -> ResponseKind {
        match self {
            RenderableResponse::Text(_) => ResponseKind::Text,
            RenderableResponse::Table(_) => ResponseKind::Table,
            RenderableResponse::Chart(_) => ResponseKind::Chart,
            RenderableResponse::Error(_) => ResponseKind::Error,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RenderableResponse::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_chart(&self) -> Option<&ChartArtifact> {
        match self {
            RenderableResponse::Chart(chart) => Some(chart),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match self {
            RenderableResponse::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Ordered insight output: per dataset, its narrative then its charts.
#[derive(Debug, Clone, Default)]
pub struct InsightReport {
    pub entries: Vec<RenderableResponse>,
}

impl InsightReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RenderableResponse) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kinds(&self) -> Vec<ResponseKind> {
        self.entries.iter().map(RenderableResponse::kind).collect()
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartArtifact> {
        self.entries.iter().filter_map(RenderableResponse::as_chart)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(RenderableResponse::as_text)
    }

    /// Charts ranked by interestingness, highest first; ties keep report order.
    pub fn charts_by_score(&self) -> Vec<&ChartArtifact> {
        let mut charts: Vec<&ChartArtifact> = self.charts().collect();
        charts.sort_by(|a, b| {
            b.provenance
                .score
                .partial_cmp(&a.provenance.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        charts
    }

    pub fn into_entries(self) -> Vec<RenderableResponse> {
        self.entries
    }
}
