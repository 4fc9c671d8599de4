//! Process-wide chart theme.
//!
//! Installed once at startup and read-only afterwards. Figures read it at
//! render time; nothing mutates it per request.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use shared::settings::ChartSettings;
use std::path::PathBuf;
use walkdir::WalkDir;

pub type Rgb = [u8; 3];

static THEME: OnceCell<ChartTheme> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTheme {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub axis: Rgb,
    pub edge: Rgb,
    pub palette: Vec<Rgb>,
    /// Family for chart text; plotters falls back to sans-serif when unset or missing
    pub font_family: Option<String>,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
            background: [255, 255, 255],
            axis: [60, 60, 60],
            edge: [0, 0, 0],
            palette: vec![
                [31, 119, 180],
                [255, 127, 14],
                [44, 160, 44],
                [214, 39, 40],
                [148, 103, 189],
                [140, 86, 75],
            ],
            font_family: None,
        }
    }
}

impl ChartTheme {
    /// Theme for the given settings, detecting a CJK-capable font when none is set
    pub fn from_settings(settings: &ChartSettings) -> Self {
        let font_family = settings
            .font_family
            .clone()
            .or_else(|| pick_font_family(font_priority(), &installed_font_families()));
        Self {
            width: settings.width,
            height: settings.height,
            font_family,
            ..Self::default()
        }
    }

    pub fn color(&self, index: usize) -> Rgb {
        if self.palette.is_empty() {
            return self.axis;
        }
        self.palette[index % self.palette.len()]
    }
}

/// Install the theme. Only the first call wins; later calls get their theme back.
pub fn init_theme(theme: ChartTheme) -> Result<(), ChartTheme> {
    let family = theme.font_family.clone();
    THEME.set(theme)?;
    match family {
        Some(family) => tracing::info!("Chart theme installed with font family '{}'", family),
        None => tracing::info!("Chart theme installed without a CJK font"),
    }
    Ok(())
}

/// The installed theme, or the default one if startup never installed any
pub fn theme() -> &'static ChartTheme {
    THEME.get_or_init(ChartTheme::default)
}

/// Shown when no CJK-capable font is available
pub fn font_warning() -> &'static str {
    "No Chinese font was found on this system. Chinese characters in chart \
     labels may not display correctly. Install a CJK font such as \
     'Noto Sans CJK SC' or 'WenQuanYi Micro Hei'."
}

/// Preferred font families for this platform, best first
pub fn font_priority() -> &'static [&'static str] {
    if cfg!(target_os = "macos") {
        &["Songti SC", "PingFang SC", "Heiti SC", "STHeiti"]
    } else if cfg!(target_os = "windows") {
        &["SimSun", "SimHei", "Microsoft YaHei", "KaiTi"]
    } else {
        &["WenQuanYi Micro Hei", "Noto Sans CJK SC", "Noto Sans CJK"]
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First preferred family matching an installed one, case-insensitively.
pub fn pick_font_family(priority: &[&str], installed: &[String]) -> Option<String> {
    let installed: Vec<String> = installed.iter().map(|f| normalize(f)).collect();
    priority
        .iter()
        .find(|candidate| {
            let wanted = normalize(candidate);
            installed.iter().any(|f| f.contains(&wanted))
        })
        .map(|c| c.to_string())
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
    } else if cfg!(target_os = "windows") {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
    }
    if let Some(base) = directories::BaseDirs::new() {
        let home = base.home_dir();
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    dirs
}

/// Font file stems found in the usual system and user font directories
pub fn installed_font_families() -> Vec<String> {
    let mut families = Vec::new();
    for dir in font_dirs().into_iter().filter(|d| d.exists()) {
        for entry in WalkDir::new(&dir)
            .max_depth(4)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_lowercase().as_str(), "ttf" | "ttc" | "otf"))
                .unwrap_or(false);
            if !is_font {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                families.push(stem.to_string());
            }
        }
    }
    tracing::debug!("Found {} installed font files", families.len());
    families
}
