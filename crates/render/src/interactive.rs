//! Interactive figures described as JSON traces plus a layout.
//!
//! These are what a browser-side plotting library consumes. The static export
//! path draws the first trace as a static [`Figure`].

use serde::{Deserialize, Serialize};
use shared::{AgentOutput, ImageFormat, RenderError, StaticImageExport};
use std::sync::Arc;

use crate::figure::{Figure, FigureData};
use crate::theme::theme;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar {
        #[serde(default)]
        x: Vec<serde_json::Value>,
        y: Vec<f64>,
        #[serde(default)]
        name: Option<String>,
    },
    Histogram {
        x: Vec<f64>,
        #[serde(default)]
        nbinsx: Option<usize>,
    },
    Heatmap {
        z: Vec<Vec<f64>>,
        #[serde(default)]
        x: Vec<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveFigure {
    pub data: Vec<Trace>,
    #[serde(default)]
    pub layout: Layout,
}

impl InteractiveFigure {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Interactive counterpart of a static figure, labelled with the theme font
    pub fn from_figure(figure: &Figure) -> Self {
        let trace = match &figure.data {
            FigureData::Histogram { edges, counts } => Trace::Bar {
                x: edges
                    .windows(2)
                    .map(|w| serde_json::json!((w[0] + w[1]) / 2.0))
                    .collect(),
                y: counts.iter().map(|&c| c as f64).collect(),
                name: Some(figure.x_label.clone()),
            },
            FigureData::Bars { labels, values } => Trace::Bar {
                x: labels.iter().map(|l| serde_json::json!(l)).collect(),
                y: values.clone(),
                name: Some(figure.x_label.clone()),
            },
            FigureData::Heatmap { labels, matrix } => Trace::Heatmap {
                z: matrix.clone(),
                x: labels.clone(),
            },
        };
        Self {
            data: vec![trace],
            layout: Layout {
                title: Some(figure.title.clone()),
                width: figure.size.map(|s| s.0),
                height: figure.size.map(|s| s.1),
                font_family: theme().font_family.clone(),
            },
        }
    }

    fn to_static(&self) -> Result<Figure, RenderError> {
        let title = self.layout.title.clone().unwrap_or_default();
        if self.data.len() > 1 {
            tracing::debug!(
                "Static export draws the first of {} traces",
                self.data.len()
            );
        }
        let trace = self
            .data
            .first()
            .ok_or_else(|| RenderError::EmptyFigure(title.clone()))?;

        let mut figure = match trace {
            Trace::Bar { x, y, name } => {
                let labels = if x.is_empty() {
                    (0..y.len()).map(|i| i.to_string()).collect()
                } else {
                    x.iter()
                        .map(|v| match v {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect()
                };
                Figure::bars(&title, name.as_deref().unwrap_or(""), labels, y.clone())
            }
            Trace::Histogram { x, nbinsx } => {
                Figure::histogram(&title, "", x, nbinsx.unwrap_or(30))
            }
            Trace::Heatmap { z, x } => Figure::heatmap(&title, x.clone(), z.clone()),
        };
        if let (Some(width), Some(height)) = (self.layout.width, self.layout.height) {
            figure = figure.with_size(width, height);
        }
        Ok(figure)
    }
}

impl StaticImageExport for InteractiveFigure {
    fn to_image(&self, format: ImageFormat) -> Result<Vec<u8>, RenderError> {
        self.to_static()?.render(format)
    }

    fn title(&self) -> Option<String> {
        self.layout.title.clone()
    }
}

impl AgentOutput for InteractiveFigure {
    fn as_image_export(&self) -> Option<Arc<dyn StaticImageExport>> {
        Some(Arc::new(self.clone()))
    }
}
