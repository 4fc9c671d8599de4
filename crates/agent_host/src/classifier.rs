//! Response classification for agent replies.
//!
//! A reply is probed for capabilities in a fixed order and the first one
//! present decides the response kind:
//!
//! 1. table
//! 2. raster figure (static chart)
//! 3. static image export (interactive chart)
//! 4. nested figure (plot wrapper, unwrapped)
//! 5. text naming an existing chart file (saved chart)
//! 6. text
//!
//! An agent failure becomes an error response. Values with no text form
//! fall back to their debug representation, so every reply classifies.

use render::has_chart_extension;
use shared::{
    AgentOutput, AgentReply, ChartArtifact, Provenance, RasterFigure, RenderableResponse,
    StaticImageExport,
};
use std::path::Path;

pub fn classify(reply: AgentReply) -> RenderableResponse {
    match reply {
        Ok(output) => classify_output(output.as_ref()),
        Err(e) => {
            tracing::debug!("Classified agent failure as error");
            RenderableResponse::Error(e.to_string())
        }
    }
}

/// Classify a value the agent returned successfully
pub fn classify_output(output: &dyn AgentOutput) -> RenderableResponse {
    if let Some(table) = output.as_table() {
        tracing::debug!("Classified reply as table (rule 1)");
        return RenderableResponse::Table(table);
    }

    if let Some(figure) = output.as_raster_figure() {
        tracing::debug!("Classified reply as static chart (rule 2)");
        let title = figure.title().unwrap_or_default();
        return RenderableResponse::Chart(ChartArtifact::static_figure(
            figure,
            Provenance::external(title),
        ));
    }

    if let Some(figure) = output.as_image_export() {
        tracing::debug!("Classified reply as interactive chart (rule 3)");
        let title = figure.title().unwrap_or_default();
        return RenderableResponse::Chart(ChartArtifact::interactive(
            figure,
            Provenance::external(title),
        ));
    }

    if let Some(figure) = output.nested_figure() {
        tracing::debug!("Classified reply as wrapped static chart (rule 4)");
        let title = figure.title().unwrap_or_default();
        return RenderableResponse::Chart(ChartArtifact::static_figure(
            figure,
            Provenance::external(title),
        ));
    }

    if let Some(text) = output.as_text() {
        if let Some(artifact) = saved_chart(&text) {
            tracing::debug!("Classified reply as saved chart file (rule 5)");
            return RenderableResponse::Chart(artifact);
        }
        tracing::debug!("Classified reply as text (rule 6)");
        return RenderableResponse::Text(text);
    }

    tracing::debug!("Reply has no text form, using its debug form (rule 6)");
    RenderableResponse::Text(format!("{:?}", output))
}

/// Saved-file chart when `text` is a path to an existing chart image
fn saved_chart(text: &str) -> Option<ChartArtifact> {
    let candidate = text.trim();
    let path = Path::new(candidate);
    if candidate.is_empty() || !has_chart_extension(path) || !path.is_file() {
        return None;
    }
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Some(ChartArtifact::saved_file(path, Provenance::external(title)))
}
