//! `helper` - automatic insights and reply classification for data files.

mod config;

use agent_host::classify;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use insights::{load_files, merge_datasets, AutoInsight, FileLoadResult};
use render::{download_name, export_png, init_theme, ChartTheme};
use shared::settings::AppSettings;
use shared::{AgentReply, RenderableResponse};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "helper")]
#[command(about = "Automatic exploratory analysis for CSV and spreadsheet files")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true, env = "DATA_HELPER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile files and write the insight report with its charts
    Insights {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory for report.md and chart images
        #[arg(long, short = 'o', default_value = "insights_out")]
        out: PathBuf,

        /// Analyze all files as one table with `_source_file`/`_source_sheet` columns
        #[arg(long)]
        merge: bool,
    },

    /// Classify a raw agent reply (text or a saved chart path)
    Classify {
        value: String,

        /// Write the chart here when the reply is one
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Print shape and column types of each file as JSON
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli.config.clone().or_else(config::config_path);
    let (settings, settings_problem) = config::load_settings_or_default(config.as_deref());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(problem) = settings_problem {
        tracing::warn!("{}", problem);
    }

    let theme = ChartTheme::from_settings(&settings.chart);
    if theme.font_family.is_none() {
        tracing::warn!("{}", render::theme::font_warning());
    }
    if init_theme(theme).is_err() {
        tracing::debug!("Chart theme already initialized");
    }

    match cli.command {
        Commands::Insights { files, out, merge } => run_insights(&settings, &files, &out, merge),
        Commands::Classify { value, out } => run_classify(&settings, value, out.as_deref()),
        Commands::Inspect { files } => run_inspect(&files),
    }
}

fn load(files: &[PathBuf]) -> Result<FileLoadResult> {
    let loaded = load_files(files);
    for (name, message) in &loaded.failed {
        eprintln!("Failed to load {}: {}", name, message);
    }
    if loaded.successful.is_empty() {
        bail!("no files could be loaded");
    }
    Ok(loaded)
}

fn run_insights(settings: &AppSettings, files: &[PathBuf], out: &Path, merge: bool) -> Result<()> {
    let loaded = load(files)?;
    let datasets = if merge {
        let merged = merge_datasets(&loaded.successful)?;
        vec![(format!("Merged data ({} tables)", loaded.successful.len()), merged)]
    } else {
        loaded.named_datasets()
    };
    let report = AutoInsight::new(settings.limits.clone()).generate_report(&datasets);

    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    let mut markdown = String::new();
    let mut written = 0usize;
    let mut failed = 0usize;

    for (index, entry) in report.entries.iter().enumerate() {
        match entry {
            RenderableResponse::Text(text) => {
                println!("{}", text);
                markdown.push_str(text);
                markdown.push('\n');
            }
            RenderableResponse::Error(message) => {
                eprintln!("{}", message);
                markdown.push_str(&format!("> {}\n\n", message));
            }
            RenderableResponse::Chart(chart) => match export_png(chart) {
                Ok(bytes) => {
                    let name = format!("{:02}_{}", index, download_name(chart));
                    let path = out.join(&name);
                    fs::write(&path, bytes)
                        .with_context(|| format!("writing {}", path.display()))?;
                    markdown.push_str(&format!("![{}]({})\n\n", chart.provenance.title, name));
                    written += 1;
                }
                Err(e) => {
                    eprintln!("{}", e);
                    failed += 1;
                }
            },
            RenderableResponse::Table(table) => {
                markdown.push_str(&format!(
                    "Table: {} rows x {} columns\n\n",
                    table.row_count(),
                    table.column_count()
                ));
            }
        }
    }

    let report_path = out.join("report.md");
    fs::write(&report_path, markdown)
        .with_context(|| format!("writing {}", report_path.display()))?;

    println!(
        "Wrote {} charts to {}{}",
        written,
        out.display(),
        if failed > 0 {
            format!(" ({} failed)", failed)
        } else {
            String::new()
        }
    );
    Ok(())
}

fn run_classify(settings: &AppSettings, value: String, out: Option<&Path>) -> Result<()> {
    // a bare file name refers to the agent's chart directory
    let in_charts_dir = Path::new(&settings.charts_dir).join(&value);
    let value = if !Path::new(&value).exists() && in_charts_dir.is_file() {
        in_charts_dir.to_string_lossy().to_string()
    } else {
        value
    };

    let reply: AgentReply = Ok(Box::new(value));
    let response = classify(reply);
    println!("{}", response.kind());

    match (&response, out) {
        (RenderableResponse::Chart(chart), Some(out)) => {
            let bytes = export_png(chart)?;
            fs::write(out, bytes).with_context(|| format!("writing {}", out.display()))?;
            println!("Exported {} to {}", chart.provenance, out.display());
        }
        (RenderableResponse::Text(text), _) => println!("{}", text),
        _ => {}
    }
    Ok(())
}

fn run_inspect(files: &[PathBuf]) -> Result<()> {
    let loaded = load(files)?;
    let infos: serde_json::Map<String, serde_json::Value> = loaded
        .successful
        .iter()
        .map(|data| {
            serde_json::to_value(data.dataset.info()).map(|info| (data.display_name(), info))
        })
        .collect::<Result<_, _>>()?;
    println!("{}", serde_json::to_string_pretty(&infos)?);
    Ok(())
}
