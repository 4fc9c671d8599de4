//! Automatic exploratory analysis for tabular data
//!
//! Pipeline per dataset: [`profiler`] → [`summarizer`] → [`synthesizer`] →
//! [`composer`], sequenced by the [`orchestrator`]. The [`loader`] reads files
//! into datasets before any of that runs.

pub mod composer;
pub mod loader;
pub mod orchestrator;
pub mod profiler;
pub mod stats;
pub mod summarizer;
pub mod synthesizer;

pub use composer::compose;
pub use loader::{load_file, load_files, merge_datasets, FileLoadResult, LoadedData};
pub use orchestrator::{generate_report, AutoInsight, DatasetInsights};
pub use profiler::{profile, CardinalityGate, ColumnProfile, DatasetProfile, MissingSummary};
pub use summarizer::{summarize, CategoricalSummary, NumericSummary, SkippedColumn, SummaryStats};
pub use synthesizer::synthesize;
