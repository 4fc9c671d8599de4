pub mod artifact;
pub mod dataset;
pub mod error;
pub mod probe;

pub use artifact::{
    ChartArtifact, ChartKind, ChartPayload, ImageFormat, InsightReport, LibraryKind, Provenance,
    RasterFigure, RenderableResponse, ResponseKind, StaticImageExport,
};
pub use dataset::{Column, ColumnKind, DType, Dataset, DatasetInfo, Value};
pub use error::{AgentError, ExportError, LoadError, ProfilingError, RenderError};
pub use probe::{AgentOutput, AgentReply};

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_charts_dir() -> String {
        "exports/charts".into()
    }

    fn default_log_filter() -> String {
        "info".into()
    }

    /// Caps applied while summarizing and charting a dataset.
    ///
    /// Inputs beyond a cap are truncated, never rejected.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct InsightLimits {
        /// Numeric columns given descriptive statistics
        pub max_numeric_summary: usize,
        /// Frequency pairs kept per categorical column
        pub top_n: usize,
        /// Categorical columns with more unique values are skipped
        pub cardinality_limit: usize,
        pub max_histograms: usize,
        pub max_bar_charts: usize,
        pub max_heatmap_columns: usize,
        pub histogram_bins: usize,
    }

    impl Default for InsightLimits {
        fn default() -> Self {
            Self {
                max_numeric_summary: 10,
                top_n: 10,
                cardinality_limit: 20,
                max_histograms: 6,
                max_bar_charts: 3,
                max_heatmap_columns: 10,
                histogram_bins: 30,
            }
        }
    }

    /// Chart image settings, applied once at startup
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ChartSettings {
        pub width: u32,
        pub height: u32,
        /// None means pick the first installed CJK-capable family
        pub font_family: Option<String>,
    }

    impl Default for ChartSettings {
        fn default() -> Self {
            Self {
                width: 800,
                height: 500,
                font_family: None,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AppSettings {
        #[serde(default)]
        pub limits: InsightLimits,
        #[serde(default)]
        pub chart: ChartSettings,
        /// Where the agent persists the charts it draws
        #[serde(default = "default_charts_dir")]
        pub charts_dir: String,
        #[serde(default = "default_log_filter")]
        pub log_filter: String,
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                limits: InsightLimits::default(),
                chart: ChartSettings::default(),
                charts_dir: default_charts_dir(),
                log_filter: default_log_filter(),
            }
        }
    }

}
