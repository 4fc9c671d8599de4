//! Capability probes for values returned by the external agent.
//!
//! The agent hands back one opaque value per question. Instead of matching on
//! concrete types, each value advertises the capabilities it has and the
//! classifier asks for them in a fixed order. Every probe defaults to `None`,
//! so a producer implements only what it supports.

use std::fmt;
use std::sync::Arc;

use crate::artifact::{RasterFigure, StaticImageExport};
use crate::dataset::Dataset;
use crate::error::AgentError;

pub trait AgentOutput: fmt::Debug + Send + Sync {
    /// Row/column structure
    fn as_table(&self) -> Option<Dataset> {
        None
    }

    /// Direct "render to raster" capability
    fn as_raster_figure(&self) -> Option<Arc<dyn RasterFigure>> {
        None
    }

    /// "Serialize to static image" capability of interactive figures
    fn as_image_export(&self) -> Option<Arc<dyn StaticImageExport>> {
        None
    }

    /// Accessor to a figure owned by a plot wrapper (axes, grids)
    fn nested_figure(&self) -> Option<Arc<dyn RasterFigure>> {
        None
    }

    /// Text form of the value
    fn as_text(&self) -> Option<String> {
        None
    }
}

/// One agent answer: a value, or the agent's own failure
pub type AgentReply = Result<Box<dyn AgentOutput>, AgentError>;

impl AgentOutput for String {
    fn as_text(&self) -> Option<String> {
        Some(self.clone())
    }
}

impl AgentOutput for &'static str {
    fn as_text(&self) -> Option<String> {
        Some((*self).to_string())
    }
}

impl AgentOutput for i64 {
    fn as_text(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl AgentOutput for f64 {
    fn as_text(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl AgentOutput for bool {
    fn as_text(&self) -> Option<String> {
        Some(self.to_string())
    }
}

impl AgentOutput for serde_json::Value {
    fn as_text(&self) -> Option<String> {
        match self {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl AgentOutput for Dataset {
    fn as_table(&self) -> Option<Dataset> {
        Some(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_strings_are_unquoted() {
        let value = serde_json::json!("42 rows");
        assert_eq!(value.as_text().as_deref(), Some("42 rows"));
        let number = serde_json::json!({"mean": 1.5});
        assert_eq!(number.as_text().as_deref(), Some("{\"mean\":1.5}"));
    }

    #[test]
    fn test_plain_values_have_no_figure() {
        let value: Box<dyn AgentOutput> = Box::new(3.5_f64);
        assert!(value.as_raster_figure().is_none());
        assert!(value.as_table().is_none());
        assert_eq!(value.as_text().as_deref(), Some("3.5"));
    }
}
