//! Turns delimited-text and spreadsheet files into [`Dataset`]s.

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use shared::{Column, Dataset, LoadError, Value};
use std::collections::HashMap;
use std::path::Path;

const SUPPORTED: &str = ".csv, .tsv, .xlsx, .xls, .xlsm, .ods";

/// Cells read as missing
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Provenance columns added by [`merge_datasets`]
const SOURCE_COLUMNS: [&str; 2] = ["_source_file", "_source_sheet"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" => Some(Self::Delimited),
            "xlsx" | "xls" | "xlsm" | "ods" => Some(Self::Spreadsheet),
            _ => None,
        }
    }
}

/// One table read from a file
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub filename: String,
    /// Sheet the table came from, for spreadsheets
    pub sheet_name: Option<String>,
}

impl LoadedData {
    /// Name used for the dataset in reports
    pub fn display_name(&self) -> String {
        match &self.sheet_name {
            Some(sheet) => format!("{} [{}]", self.filename, sheet),
            None => self.filename.clone(),
        }
    }
}

/// Result of a best-effort batch load
#[derive(Debug, Default)]
pub struct FileLoadResult {
    pub successful: Vec<LoadedData>,
    /// (filename, error message)
    pub failed: Vec<(String, String)>,
}

impl FileLoadResult {
    /// `(name, dataset)` pairs in load order, ready for the orchestrator
    pub fn named_datasets(&self) -> Vec<(String, Dataset)> {
        self.successful
            .iter()
            .map(|d| (d.display_name(), d.dataset.clone()))
            .collect()
    }
}

pub fn load_file(path: &Path) -> Result<Vec<LoadedData>, LoadError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("data")
        .to_string();

    let format = SourceFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default(),
        supported: SUPPORTED.to_string(),
    })?;

    let loaded = match format {
        SourceFormat::Delimited => vec![load_delimited(path, &filename)?],
        SourceFormat::Spreadsheet => vec![load_spreadsheet(path, &filename)?],
    };

    for data in &loaded {
        tracing::info!(
            "Loaded {}: {} rows, {} columns",
            data.display_name(),
            data.dataset.row_count(),
            data.dataset.column_count()
        );
    }
    Ok(loaded)
}

/// Load every file, collecting failures instead of stopping at the first one
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> FileLoadResult {
    let mut result = FileLoadResult::default();

    for path in paths {
        let path = path.as_ref();
        match load_file(path) {
            Ok(loaded) => result.successful.extend(loaded),
            Err(e) => {
                let filename = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                tracing::warn!("Failed to load {}: {}", filename, e);
                result.failed.push((filename, e.to_string()));
            }
        }
    }

    result
}

fn load_delimited(path: &Path, filename: &str) -> Result<LoadedData, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        filename: filename.to_string(),
        source,
    })?;
    let content = decode_text(&bytes);
    if content.trim().is_empty() {
        return Err(LoadError::Empty(filename.to_string()));
    }

    let delimiter = sniff_delimiter(&content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let csv_error = |e: csv::Error| LoadError::Csv {
        filename: filename.to_string(),
        message: e.to_string(),
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    let dataset = build_dataset(headers, rows, filename)?;
    Ok(LoadedData {
        dataset,
        filename: filename.to_string(),
        sheet_name: None,
    })
}

fn load_spreadsheet(path: &Path, filename: &str) -> Result<LoadedData, LoadError> {
    let excel_error = |message: String| LoadError::Excel {
        filename: filename.to_string(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| excel_error(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::NoSheets(filename.to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| excel_error(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(header_cell).collect(),
        None => return Err(LoadError::Empty(filename.to_string())),
    };
    let rows: Vec<Vec<Value>> = rows
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();

    let dataset = build_dataset(headers, rows, filename)?;
    Ok(LoadedData {
        dataset,
        filename: filename.to_string(),
        sheet_name: Some(sheet),
    })
}

/// Stack loaded tables into one, tagging each row with where it came from.
///
/// Columns are the union of all inputs in first-seen order; a table without a
/// column contributes missing cells. `_source_file` and `_source_sheet` are
/// appended last (replacing any input columns of those names), the sheet
/// being missing for delimited files.
pub fn merge_datasets(loaded: &[LoadedData]) -> Result<Dataset, LoadError> {
    if loaded.is_empty() {
        return Err(LoadError::NothingToMerge);
    }

    let mut names: Vec<&str> = Vec::new();
    for data in loaded {
        for column in data.dataset.columns() {
            if SOURCE_COLUMNS.contains(&column.name.as_str()) {
                continue;
            }
            if !names.contains(&column.name.as_str()) {
                names.push(&column.name);
            }
        }
    }

    let total_rows: usize = loaded.iter().map(|d| d.dataset.row_count()).sum();
    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(total_rows); names.len()];
    let mut source_file = Vec::with_capacity(total_rows);
    let mut source_sheet = Vec::with_capacity(total_rows);

    for data in loaded {
        let rows = data.dataset.row_count();
        for (name, merged) in names.iter().zip(columns.iter_mut()) {
            match data.dataset.column(name) {
                Some(column) => merged.extend(
                    (0..rows).map(|i| column.values.get(i).cloned().unwrap_or(Value::Null)),
                ),
                None => merged.extend(std::iter::repeat(Value::Null).take(rows)),
            }
        }
        source_file.extend(std::iter::repeat(Value::Text(data.filename.clone())).take(rows));
        let sheet = data
            .sheet_name
            .clone()
            .map(Value::Text)
            .unwrap_or(Value::Null);
        source_sheet.extend(std::iter::repeat(sheet).take(rows));
    }

    let mut merged: Vec<Column> = names
        .into_iter()
        .zip(columns)
        .map(|(name, values)| Column::inferred(name, values))
        .collect();
    merged.push(Column::inferred(SOURCE_COLUMNS[0], source_file));
    merged.push(Column::inferred(SOURCE_COLUMNS[1], source_sheet));

    tracing::info!("Merged {} datasets: {} total rows", loaded.len(), total_rows);
    Ok(Dataset::with_row_count(total_rows, merged))
}

/// Assemble typed columns from a header row and data rows.
///
/// Short rows are padded with missing cells; cells past the header are dropped.
fn build_dataset(
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
    filename: &str,
) -> Result<Dataset, LoadError> {
    if rows.is_empty() || headers.is_empty() {
        return Err(LoadError::Empty(filename.to_string()));
    }

    let names = column_names(headers);
    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
    for row in rows {
        let mut cells = row.into_iter();
        for column in columns.iter_mut() {
            column.push(cells.next().unwrap_or(Value::Null));
        }
    }

    Ok(Dataset::new(
        names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::inferred(name, values))
            .collect(),
    ))
}

/// Blank headers become `Unnamed: <i>`; repeats get a `.1`, `.2` suffix.
fn column_names(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, header)| {
            let base = match header.trim() {
                "" => format!("Unnamed: {}", i),
                trimmed => trimmed.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// UTF-8 (BOM stripped), then GBK, then lossy Windows-1252
fn decode_text(bytes: &[u8]) -> String {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return text.to_string();
    }
    if let Some(text) = encoding_rs::GBK.decode_without_bom_handling_and_without_replacement(bytes) {
        tracing::debug!("Decoded delimited file as GBK");
        return text.into_owned();
    }
    tracing::debug!("Falling back to Windows-1252");
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Pick the delimiter giving the most consistent multi-field rows
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample: Vec<&str> = content.lines().take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delimiter in candidates {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delimiter)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let fields = counts.first().copied().unwrap_or(0);
        if fields <= 1 {
            continue;
        }
        let score = counts.iter().filter(|&&c| c == fields).count() * fields;
        if score > best_score {
            best_score = score;
            best = delimiter;
        }
    }

    best
}

/// Type a raw text cell: int, float, bool, datetime, then text
pub fn parse_cell(raw: &str) -> Value {
    let s = raw.trim();
    if s.is_empty() || MISSING_MARKERS.contains(&s) {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Some(dt) = parse_datetime(s) {
        return Value::DateTime(dt);
    }
    Value::Text(s.to_string())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn header_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn spreadsheet_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => parse_cell(s),
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Value::DateTime)
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::Text(s.clone())),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

/// Spreadsheet serial day number (1900 system) to a timestamp
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(chrono::Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::DType;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_parse_cell_types() {
        assert_eq!(parse_cell("42"), Value::Int(42));
        assert_eq!(parse_cell("4.5"), Value::Float(4.5));
        assert_eq!(parse_cell("TRUE"), Value::Bool(true));
        assert_eq!(parse_cell(" NA "), Value::Null);
        assert_eq!(parse_cell(""), Value::Null);
        assert!(matches!(parse_cell("2024-03-01"), Value::DateTime(_)));
        assert_eq!(parse_cell("North"), Value::Text("North".into()));
    }

    #[test]
    fn test_merge_tags_rows_with_their_source() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(&dir, "a.csv", b"region,sales\nNorth,10\nSouth,20\n");
        let b = write_file(&dir, "b.csv", b"region,units\nEast,3\n");
        let loaded = load_files(&[a, b]);

        let merged = merge_datasets(&loaded.successful).unwrap();
        assert_eq!(merged.row_count(), 3);
        let names: Vec<&str> = merged.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["region", "sales", "units", "_source_file", "_source_sheet"]
        );

        let sales = merged.column("sales").unwrap();
        assert_eq!(sales.values, vec![Value::Int(10), Value::Int(20), Value::Null]);
        let units = merged.column("units").unwrap();
        assert_eq!(units.missing_count(), 2);
        assert_eq!(
            merged.column("_source_file").unwrap().values,
            vec![
                Value::Text("a.csv".into()),
                Value::Text("a.csv".into()),
                Value::Text("b.csv".into())
            ]
        );
        assert_eq!(merged.column("_source_sheet").unwrap().missing_count(), 3);
        assert!(merged.validate().is_ok());
    }

    #[test]
    fn test_merge_nothing_is_an_error() {
        assert!(matches!(
            merge_datasets(&[]),
            Err(LoadError::NothingToMerge)
        ));
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3\n"), b';');
        assert_eq!(sniff_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
        assert_eq!(sniff_delimiter("single\n1\n"), b',');
    }

    #[test]
    fn test_column_names() {
        let names = column_names(vec!["a".into(), "".into(), "a".into(), " b ".into()]);
        assert_eq!(names, vec!["a", "Unnamed: 1", "a.1", "b"]);
    }

    #[test]
    fn test_load_csv_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sales.csv",
            b"\xEF\xBB\xBFRegion,Sales,When\nNorth,10,2024-01-01\nSouth,,2024-01-02\nEast,7.5,\n",
        );
        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.len(), 1);

        let dataset = &loaded[0].dataset;
        assert_eq!(loaded[0].filename, "sales.csv");
        assert_eq!(loaded[0].sheet_name, None);
        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.column("Region").unwrap().dtype, DType::Text);
        assert_eq!(dataset.column("Sales").unwrap().dtype, DType::Float);
        assert_eq!(dataset.column("Sales").unwrap().missing_count(), 1);
        assert_eq!(dataset.column("When").unwrap().dtype, DType::DateTime);
    }

    #[test]
    fn test_gbk_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let (encoded, _, _) = encoding_rs::GBK.encode("城市,人口\n北京,2154\n");
        let path = write_file(&dir, "cities.csv", &encoded);
        let loaded = load_file(&path).unwrap();
        let dataset = &loaded[0].dataset;
        assert!(dataset.column("城市").is_some());
        assert_eq!(dataset.column("人口").unwrap().values[0], Value::Int(2154));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.csv", b"a,b\n");
        assert!(matches!(load_file(&path), Err(LoadError::Empty(_))));
    }

    #[test]
    fn test_load_files_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(&dir, "good.tsv", b"x\ty\n1\t2\n");
        let bad = write_file(&dir, "notes.txt", b"hello");
        let missing = dir.path().join("gone.csv");

        let result = load_files(&[bad, good, missing]);
        assert_eq!(result.successful.len(), 1);
        assert_eq!(result.successful[0].filename, "good.tsv");
        assert_eq!(result.failed.len(), 2);
        assert_eq!(result.failed[0].0, "notes.txt");
        assert!(result.failed[0].1.contains("Unsupported file format"));
        assert_eq!(result.failed[1].0, "gone.csv");
        assert_eq!(result.named_datasets()[0].0, "good.tsv");
    }

    #[test]
    fn test_excel_serial_dates() {
        let dt = excel_serial_to_datetime(45292.5).unwrap();
        assert_eq!(dt.to_string(), "2024-01-01 12:00:00");
    }
}
