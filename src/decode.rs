use std::io::Cursor;
use std::path::Path;

use calamine::Reader;
use csv::{ReaderBuilder, Trim};

use crate::error::AppError;
use crate::models::RawRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
    Ods,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            "ods" => Ok(FileFormat::Ods),
            "" => Err(AppError::UnsupportedFormat("file has no extension".to_string())),
            other => Err(AppError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub fn decode(bytes: &[u8], format: FileFormat) -> Result<Vec<RawRow>, AppError> {
    let rows = match format {
        FileFormat::Csv => decode_csv(bytes)?,
        FileFormat::Xlsx | FileFormat::Xls | FileFormat::Ods => decode_sheet(bytes)?,
    };

    if rows.is_empty() {
        return Err(AppError::EmptyInput);
    }
    Ok(rows)
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<RawRow>, AppError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::UnreadableInput(format!("failed to read CSV headers: {e}")))?
        .clone();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::UnreadableInput(format!("failed to parse CSV row {}: {e}", index + 1))
        })?;
        let row: RawRow = headers.iter().zip(record.iter()).collect();
        if !row.is_blank() {
            rows.push(row);
        }
    }

    Ok(rows)
}

fn decode_sheet(bytes: &[u8]) -> Result<Vec<RawRow>, AppError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| AppError::UnreadableInput(format!("failed to open spreadsheet: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::UnreadableInput("no worksheet found".to_string()))?
        .map_err(|e| AppError::UnreadableInput(format!("failed to read worksheet: {e}")))?;

    let mut lines = range.rows();
    let Some(header_cells) = lines.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_cells
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let rows = lines
        .map(|cells| {
            headers
                .iter()
                .zip(cells.iter())
                .map(|(header, cell)| (header.clone(), cell.to_string().trim().to_string()))
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_blank())
        .collect();

    Ok(rows)
}
