//! Chart rendering for Data Helper
//!
//! This crate provides:
//! - Static figures (histogram, bar chart, correlation heatmap)
//! - Interactive figures with a static-image export path
//! - The process-wide chart theme
//! - PNG export for every chart representation

pub mod export;
pub mod figure;
pub mod interactive;
pub mod theme;

pub use export::{download_name, export_png, mime_type};
pub use figure::{AxesHandle, Figure, FigureData};
pub use interactive::{InteractiveFigure, Layout, Trace};
pub use theme::{init_theme, theme, ChartTheme, Rgb};

use std::path::Path;

/// Extensions a saved chart file may have.
///
/// Matched case-insensitively by [`has_chart_extension`], so `plot.PNG`
/// counts where a plain `ends_with(".png")` check would not.
pub const CHART_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "pdf"];

/// Whether the path names a chart image by its extension
pub fn has_chart_extension(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    matches!(ext.as_deref(), Some(e) if CHART_EXTENSIONS.contains(&e))
}
