use crate::Result;
use crate::error::SeriesError;
use crate::table::row::{Observation, RawTable};

use anyhow::{Context, bail};
use calamine::{Data, Range, Reader, open_workbook_auto};
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DATASET: &str = "dataset";
const CLASSIFIER: &str = "classifier";
const OPERATION: &str = "operation";
const IN_TOTAL: &str = "inTotal";
const TIME_DELTA: &str = "timeDelta";

/// Sheet read from workbooks when none is named.
pub const DEFAULT_SHEET: &str = "data";

/// Load a benchmark table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx`, `.xlsm`, `.xls`, `.ods` – workbook, header row on `sheet` (default `data`)
/// * `.csv`         – comma separated, header row
/// * `.tsv`, `.tab` – tab separated, header row
/// * `.json`        – `[{ "dataset": .., "classifier": .., ... }, ...]`
/// * `.xlsx` and other workbooks – one worksheet (`sheet`, default `data`), header row first
///
/// Columns other than the five required ones are ignored.
pub fn load_file(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let source = path.display().to_string();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => {
            let sheet = sheet.unwrap_or(DEFAULT_SHEET);
            let mut workbook = open_workbook_auto(path)
                .with_context(|| format!("open workbook {}", source))?;
            let range = workbook
                .worksheet_range(sheet)
                .with_context(|| format!("read sheet '{}' of {}", sheet, source))?;
            parse_sheet(&range, &format!("{}[{}]", source, sheet))?
        }
        "csv" => {
            let file = File::open(path).with_context(|| format!("open data file {}", source))?;
            parse_delimited(file, b',', &source)?
        }
        "tsv" | "tab" => {
            let file = File::open(path).with_context(|| format!("open data file {}", source))?;
            parse_delimited(file, b'\t', &source)?
        }
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read data file {}", source))?;
            parse_json(&text, &source)?
        }
        other => bail!("unsupported data file extension: .{}", other),
    };

    if table.is_empty() {
        bail!("data file {} contained no observations", source);
    }
    log::debug!("loaded {} observations from {}", table.len(), source);
    Ok(table)
}

/// Positions of the required columns in a header row.
struct Columns {
    dataset: usize,
    classifier: usize,
    operation: usize,
    in_total: usize,
    time_delta: usize,
}

impl Columns {
    fn locate(headers: &[String], source: &str) -> Result<Self> {
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| SeriesError::missing_column(name, format!("header of {}", source)).into())
        };
        Ok(Self {
            dataset: column(DATASET)?,
            classifier: column(CLASSIFIER)?,
            operation: column(OPERATION)?,
            in_total: column(IN_TOTAL)?,
            time_delta: column(TIME_DELTA)?,
        })
    }

    /// Build one observation from a row of cell texts.
    fn observation(&self, cells: &[String], location: &str) -> Result<Observation> {
        let cell = |idx: usize, name: &str| required_cell(cells, idx, name, location);

        Ok(Observation {
            dataset: cell(self.dataset, DATASET)?.to_string(),
            classifier: cell(self.classifier, CLASSIFIER)?.to_string(),
            operation: cell(self.operation, OPERATION)?.to_string(),
            in_total: parse_in_total(cell(self.in_total, IN_TOTAL)?)
                .with_context(|| format!("bad {} at {}", IN_TOTAL, location))?,
            time_delta: parse_time_delta(cell(self.time_delta, TIME_DELTA)?)
                .with_context(|| format!("bad {} at {}", TIME_DELTA, location))?,
        })
    }
}

fn required_cell<'c>(cells: &'c [String], idx: usize, name: &str, location: &str) -> Result<&'c str> {
    match cells.get(idx).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SeriesError::missing_column(name, location).into()),
    }
}

/// Parse delimited text with a header row naming the columns.
pub fn parse_delimited<R: Read>(input: R, delimiter: u8, source: &str) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read header of {}", source))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let columns = Columns::locate(&headers, source)?;

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("read record {} of {}", i + 1, source))?;
        let line = record.position().map(|p| p.line()).unwrap_or(i as u64 + 2);
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        rows.push(columns.observation(&cells, &format!("{}:{}", source, line))?);
    }

    Ok(RawTable::new(rows))
}

/// Parse a worksheet whose first non-empty row names the columns.
///
/// Fully empty rows are skipped; spreadsheets often carry trailing blank rows.
pub fn parse_sheet(range: &Range<Data>, source: &str) -> Result<RawTable> {
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let mut rows_iter = range.rows().enumerate();

    let headers: Vec<String> = match rows_iter.next() {
        Some((_, header)) => header.iter().map(cell_text).collect(),
        None => bail!("{}: sheet is empty", source),
    };
    let columns = Columns::locate(&headers, source)?;

    let mut rows = Vec::new();
    for (i, row) in rows_iter {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        // 1-based sheet row number, as a spreadsheet shows it.
        let location = format!("{} row {}", source, first_row + i + 1);
        rows.push(columns.observation(&cells, &location)?);
    }

    Ok(RawTable::new(rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}

/// Parse a records-oriented JSON array, the shape `DataFrame.to_json(orient="records")` writes.
pub fn parse_json(text: &str, source: &str) -> Result<RawTable> {
    let root: JsonValue =
        serde_json::from_str(text).with_context(|| format!("parse JSON in {}", source))?;
    let records = root
        .as_array()
        .with_context(|| format!("{}: expected a top-level JSON array", source))?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let location = format!("{} record {}", source, i);
        let obj = rec
            .as_object()
            .with_context(|| format!("{} is not a JSON object", location))?;

        let field = |name: &str| json_field(obj, name, &location);
        let label = |name: &str| -> Result<String> {
            Ok(match json_field(obj, name, &location)? {
                JsonValue::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
        };

        let in_total = match field(IN_TOTAL)? {
            JsonValue::String(s) => parse_in_total(s),
            JsonValue::Number(n) => match n.as_u64() {
                Some(v) => Ok(v),
                None => parse_in_total(&n.to_string()),
            },
            other => Err(anyhow::anyhow!("expected a number, got {}", other)),
        }
        .with_context(|| format!("bad {} at {}", IN_TOTAL, location))?;

        let time_delta = match field(TIME_DELTA)? {
            JsonValue::String(s) => parse_time_delta(s),
            JsonValue::Number(n) => parse_time_delta(&n.to_string()),
            other => Err(anyhow::anyhow!("expected a number, got {}", other)),
        }
        .with_context(|| format!("bad {} at {}", TIME_DELTA, location))?;

        rows.push(Observation {
            dataset: label(DATASET)?,
            classifier: label(CLASSIFIER)?,
            operation: label(OPERATION)?,
            in_total,
            time_delta,
        });
    }

    Ok(RawTable::new(rows))
}

fn json_field<'a>(
    obj: &'a serde_json::Map<String, JsonValue>,
    name: &str,
    location: &str,
) -> Result<&'a JsonValue> {
    match obj.get(name) {
        None | Some(JsonValue::Null) => Err(SeriesError::missing_column(name, location).into()),
        Some(JsonValue::String(s)) if s.trim().is_empty() => {
            Err(SeriesError::missing_column(name, location).into())
        }
        Some(v) => Ok(v),
    }
}

/// Spreadsheet exports often write integer columns as `10.0`; accept those.
fn parse_in_total(s: &str) -> Result<u64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u64>() {
        return Ok(v);
    }
    let v: f64 = s
        .parse()
        .with_context(|| format!("'{}' is not a number", s))?;
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v >= u64::MAX as f64 {
        bail!("'{}' is not a non-negative integer", s);
    }
    Ok(v as u64)
}

fn parse_time_delta(s: &str) -> Result<f64> {
    let s = s.trim();
    let v: f64 = s
        .parse()
        .with_context(|| format!("'{}' is not a number", s))?;
    if !v.is_finite() || v < 0.0 {
        bail!("'{}' is not a non-negative finite number", s);
    }
    Ok(v)
}
