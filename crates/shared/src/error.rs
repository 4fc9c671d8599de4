//! Error types shared across the pipelines.

use std::path::PathBuf;

use crate::artifact::Provenance;

/// A dataset that cannot be treated as a table.
///
/// Scoped to one dataset: the orchestrator turns it into an error entry and
/// moves on to the next dataset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfilingError {
    #[error("column '{column}' has {found} values but the dataset has {expected} rows")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column name '{column}' appears more than once")]
    DuplicateColumn { column: String },

    #[error("column {index} has an empty name")]
    EmptyColumnName { index: usize },
}

/// Rasterizing a figure failed
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("figure has nothing to draw: {0}")]
    EmptyFigure(String),

    #[error("image encoding failed: {0}")]
    Encode(String),

    #[error("{0} export is not supported by this figure")]
    UnsupportedFormat(String),
}

/// A chart artifact could not be turned into image bytes.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to render {provenance}: {source}")]
    Render {
        provenance: Provenance,
        #[source]
        source: RenderError,
    },

    #[error("chart file for {provenance} not found: {}", path.display())]
    MissingFile { provenance: Provenance, path: PathBuf },

    #[error("failed to read chart file for {provenance}: {source}")]
    Io {
        provenance: Provenance,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    pub fn provenance(&self) -> &Provenance {
        match self {
            ExportError::Render { provenance, .. }
            | ExportError::MissingFile { provenance, .. }
            | ExportError::Io { provenance, .. } => provenance,
        }
    }
}

/// Failure raised by the external question-answering agent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("No code found in the response: {0}")]
    NoCodeFound(String),

    #[error("No result returned: {0}")]
    NoResult(String),

    #[error("{0}")]
    Failed(String),
}

/// Reading an input file into datasets failed
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Unsupported file format '{extension}'. Supported formats: {supported}")]
    UnsupportedFormat {
        extension: String,
        supported: String,
    },

    #[error("File '{0}' is empty.")]
    Empty(String),

    #[error("Excel file '{0}' contains no sheets")]
    NoSheets(String),

    #[error("failed to read '{filename}': {source}")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{filename}': {message}")]
    Csv { filename: String, message: String },

    #[error("failed to open spreadsheet '{filename}': {message}")]
    Excel { filename: String, message: String },

    #[error("No datasets to merge")]
    NothingToMerge,
}
