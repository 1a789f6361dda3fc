use calamine::{Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

use crate::error::ImportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Result<FileKind, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(FileKind::Csv),
            "xlsx" | "xlsm" => Ok(FileKind::Xlsx),
            _ => Err(ImportError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

/// Ordered, de-duplicated header row. Blank headers become "Column N" and
/// repeated names get a numeric suffix so every header can serve as a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    headers: Vec<String>,
}

impl ColumnSet {
    pub fn from_headers<I>(raw: I) -> ColumnSet
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut headers: Vec<String> = Vec::new();
        for (i, h) in raw.into_iter().enumerate() {
            let trimmed = h.as_ref().trim();
            let base = if trimmed.is_empty() {
                format!("Column {}", i + 1)
            } else {
                trimmed.to_string()
            };
            let mut name = base.clone();
            let mut n = 2;
            while headers.contains(&name) {
                name = format!("{base} ({n})");
                n += 1;
            }
            headers.push(name);
        }
        ColumnSet { headers }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn position(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// One data row, padded or truncated to the width of its [`ColumnSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    values: Vec<String>,
}

impl RawRow {
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTable {
    pub columns: ColumnSet,
    pub rows: Vec<RawRow>,
}

impl ParsedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.columns.position(header)?;
        self.rows.get(row).map(|r| r.get(col))
    }
}

pub fn parse_bytes(data: &[u8], kind: FileKind) -> Result<ParsedTable, ImportError> {
    let table = match kind {
        FileKind::Csv => parse_delimited(data)?,
        FileKind::Xlsx => parse_workbook(data)?,
    };
    tracing::debug!(
        columns = table.columns.len(),
        rows = table.rows.len(),
        "parsed tabular input"
    );
    Ok(table)
}

/// Detects the kind from the file extension, reads the file, and parses it.
pub fn parse_path(path: &Path) -> Result<ParsedTable, ImportError> {
    let kind = FileKind::from_path(path)?;
    let data = std::fs::read(path)?;
    parse_bytes(&data, kind)
}

fn parse_delimited(data: &[u8]) -> Result<ParsedTable, ImportError> {
    let text = String::from_utf8_lossy(data);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut columns: Option<ColumnSet> = None;
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        match &columns {
            None => columns = Some(ColumnSet::from_headers(fields)),
            Some(cols) => {
                let mut values = fields;
                values.resize(cols.len(), String::new());
                rows.push(RawRow { values });
            }
        }
    }

    let columns = columns.ok_or(ImportError::EmptyInput)?;
    Ok(ParsedTable { columns, rows })
}

fn parse_workbook(data: &[u8]) -> Result<ParsedTable, ImportError> {
    let mut workbook =
        Xlsx::new(Cursor::new(data)).map_err(|e| ImportError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptyInput)?
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let mut columns: Option<ColumnSet> = None;
    let mut rows = Vec::new();

    for row in range.rows() {
        let fields: Vec<String> = row.iter().map(cell_text).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        match &columns {
            None => columns = Some(ColumnSet::from_headers(fields)),
            Some(cols) => {
                let mut values = fields;
                values.resize(cols.len(), String::new());
                rows.push(RawRow { values });
            }
        }
    }

    let columns = columns.ok_or(ImportError::EmptyInput)?;
    Ok(ParsedTable { columns, rows })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.trim().to_string(),
        Data::DurationIso(s) => s.trim().to_string(),
    }
}

/// Excel's day zero is 1899-12-30 once the fictitious 1900-02-29 is accounted
/// for.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // ── ColumnSet ─────────────────────────────────────────────────────────────

    #[test]
    fn headers_are_trimmed() {
        let cols = ColumnSet::from_headers(["  Date ", "Amount"]);
        assert_eq!(cols.headers(), ["Date", "Amount"]);
    }

    #[test]
    fn blank_headers_are_named_by_position() {
        let cols = ColumnSet::from_headers(["Date", "", "Amount"]);
        assert_eq!(cols.headers(), ["Date", "Column 2", "Amount"]);
    }

    #[test]
    fn duplicate_headers_get_suffixes() {
        let cols = ColumnSet::from_headers(["Amount", "Amount", "Amount"]);
        assert_eq!(cols.headers(), ["Amount", "Amount (2)", "Amount (3)"]);
        assert_eq!(cols.position("Amount (3)"), Some(2));
    }

    #[test]
    fn suffixed_header_never_collides_with_a_literal_one() {
        let cols = ColumnSet::from_headers(["Amount", "Amount (2)", "Amount"]);
        assert_eq!(cols.headers(), ["Amount", "Amount (2)", "Amount (3)"]);
    }

    // ── CSV parsing ───────────────────────────────────────────────────────────

    #[test]
    fn parse_csv_basic() {
        let data = b"Date,Description,Amount\n2024-01-15,AMAZON,49.99\n2024-01-16,STARBUCKS,-5.00\n";
        let table = parse_bytes(data, FileKind::Csv).unwrap();
        assert_eq!(table.columns.headers(), ["Date", "Description", "Amount"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "Description"), Some("AMAZON"));
        assert_eq!(table.cell(1, "Amount"), Some("-5.00"));
    }

    #[test]
    fn parse_csv_quoted_fields() {
        let data = b"Date,Description,Amount\n2024-01-15,\"SMITH, JONES \"\"AND CO\"\"\",12.00\n";
        let table = parse_bytes(data, FileKind::Csv).unwrap();
        assert_eq!(table.cell(0, "Description"), Some("SMITH, JONES \"AND CO\""));
    }

    #[test]
    fn parse_csv_pads_short_rows_and_truncates_long_ones() {
        let data = b"A,B,C\n1,2\n1,2,3,4\n";
        let table = parse_bytes(data, FileKind::Csv).unwrap();
        assert_eq!(table.rows[0].values(), ["1", "2", ""]);
        assert_eq!(table.rows[1].values(), ["1", "2", "3"]);
    }

    #[test]
    fn parse_csv_drops_blank_rows() {
        let data = b"A,B\n1,2\n,\n\n3,4\n";
        let table = parse_bytes(data, FileKind::Csv).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn parse_csv_strips_bom() {
        let data = b"\xef\xbb\xbfDate,Amount\n2024-01-15,1.00\n";
        let table = parse_bytes(data, FileKind::Csv).unwrap();
        assert_eq!(table.columns.headers()[0], "Date");
    }

    #[test]
    fn parse_csv_empty_input_errors() {
        assert!(matches!(
            parse_bytes(b"", FileKind::Csv),
            Err(ImportError::EmptyInput)
        ));
    }

    #[test]
    fn parse_csv_header_only_is_zero_rows() {
        let table = parse_bytes(b"Date,Amount\n", FileKind::Csv).unwrap();
        assert_eq!(table.row_count(), 0);
    }

    // ── XLSX cell handling ────────────────────────────────────────────────────

    #[test]
    fn cell_text_renders_numbers_without_noise() {
        assert_eq!(cell_text(&Data::Float(15.99)), "15.99");
        assert_eq!(cell_text(&Data::Float(100.0)), "100");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn excel_serial_maps_to_calendar_date() {
        // 2024-01-15 is serial 45306.
        let d = excel_serial_to_date(45306.0).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    // ── file kind detection ───────────────────────────────────────────────────

    #[test]
    fn file_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a.csv")).unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("a.CSV")).unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("a.xlsx")).unwrap(), FileKind::Xlsx);
        assert!(matches!(
            FileKind::from_path(Path::new("a.pdf")),
            Err(ImportError::UnsupportedFormat(_))
        ));
        assert!(FileKind::from_path(Path::new("statement")).is_err());
    }

    #[test]
    fn parse_path_reads_a_csv_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "Date,Amount\n2024-01-15,9.99\n").unwrap();
        let table = parse_path(file.path()).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "Amount"), Some("9.99"));
    }
}
