//! Export adapter: chart artifact to downloadable image bytes.

use shared::{ChartArtifact, ChartPayload, ExportError, ImageFormat};

/// In-memory image for a chart.
///
/// Static figures rasterize directly, interactive figures go through their own
/// static export, and saved chart files are read back verbatim. The artifact
/// is only read.
pub fn export_png(artifact: &ChartArtifact) -> Result<Vec<u8>, ExportError> {
    let provenance = &artifact.provenance;
    let result = match &artifact.payload {
        ChartPayload::Static(figure) => {
            figure.render_png().map_err(|source| ExportError::Render {
                provenance: provenance.clone(),
                source,
            })
        }
        ChartPayload::Interactive(figure) => {
            figure
                .to_image(ImageFormat::Png)
                .map_err(|source| ExportError::Render {
                    provenance: provenance.clone(),
                    source,
                })
        }
        ChartPayload::SavedFile(path) => {
            if !path.is_file() {
                Err(ExportError::MissingFile {
                    provenance: provenance.clone(),
                    path: path.clone(),
                })
            } else {
                std::fs::read(path).map_err(|source| ExportError::Io {
                    provenance: provenance.clone(),
                    source,
                })
            }
        }
    };

    match &result {
        Ok(bytes) => tracing::debug!("Exported {} ({} bytes)", provenance, bytes.len()),
        Err(e) => tracing::warn!("Chart export failed: {}", e),
    }
    result
}

/// File name offered when the chart is downloaded
pub fn download_name(artifact: &ChartArtifact) -> String {
    if let Some(name) = artifact
        .saved_path()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
    {
        return name.to_string();
    }

    let provenance = &artifact.provenance;
    let mut stem = provenance.chart_kind.name().to_string();
    for column in &provenance.columns {
        stem.push('_');
        stem.extend(column.chars().map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        }));
    }
    format!("{}.png", stem)
}

/// MIME type of the exported bytes
pub fn mime_type(artifact: &ChartArtifact) -> &'static str {
    let ext = artifact
        .saved_path()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        _ => "image/png",
    }
}
