//! Spreadsheet to Polars DataFrame
//!
//! Workbooks are read with calamine. The first row of the used range (after
//! `skip_rows`) is the header unless `has_header` is false.

use super::column::{cells_to_series, dedupe_names, CellValue};
use super::error::{Result, SharePointError};
use super::options::{ExcelEngine, ExcelOptions, SheetSelector};
use calamine::DataType as _;
use calamine::{open_workbook_auto_from_rs, Data, Ods, Range, Reader, Xls, Xlsb, Xlsx};
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

type Source = Cursor<Vec<u8>>;

/// Parse workbook bytes into a DataFrame
pub fn read_excel(bytes: Vec<u8>, options: &ExcelOptions) -> Result<DataFrame> {
    let engine = options.resolved_engine();
    let sheet = options.sheet.clone().unwrap_or_default();
    let source = Cursor::new(bytes);

    let range = match engine {
        ExcelEngine::Xlsx => read_range(Xlsx::new(source), &sheet)?,
        ExcelEngine::Xls => read_range(Xls::new(source), &sheet)?,
        ExcelEngine::Xlsb => read_range(Xlsb::new(source), &sheet)?,
        ExcelEngine::Ods => read_range(Ods::new(source), &sheet)?,
        ExcelEngine::Auto => read_range(open_workbook_auto_from_rs(source), &sheet)?,
    };

    let df = range_to_dataframe(&range, options)?;

    debug!(
        rows = df.height(),
        columns = df.width(),
        ?engine,
        ?sheet,
        "Parsed spreadsheet"
    );

    Ok(df)
}

fn read_range<R, E>(
    workbook: std::result::Result<R, E>,
    sheet: &SheetSelector,
) -> Result<Range<Data>>
where
    R: Reader<Source>,
    E: Into<calamine::Error>,
    R::Error: Into<calamine::Error>,
{
    let mut workbook = workbook.map_err(|e| SharePointError::Spreadsheet(e.into()))?;

    match sheet {
        SheetSelector::Name(name) => workbook
            .worksheet_range(name)
            .map_err(|e| SharePointError::Spreadsheet(e.into())),
        SheetSelector::Index(index) => workbook
            .worksheet_range_at(*index)
            .ok_or_else(|| {
                SharePointError::Parse(format!(
                    "Sheet index {} out of range (workbook has {} sheets)",
                    index,
                    workbook.sheet_names().len()
                ))
            })?
            .map_err(|e| SharePointError::Spreadsheet(e.into())),
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| CellValue::Text(dt.to_string()))
            .unwrap_or(CellValue::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Null,
        #[allow(unreachable_patterns)]
        _ => CellValue::Null,
    }
}

fn header_name(cell: &Data, index: usize) -> String {
    match cell {
        Data::Empty => format!("Unnamed: {}", index),
        Data::String(s) if s.trim().is_empty() => format!("Unnamed: {}", index),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn range_to_dataframe(range: &Range<Data>, options: &ExcelOptions) -> Result<DataFrame> {
    let width = range.width();
    // `skip_rows` counts sheet rows; the range starts at the first used row
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let skip = options.skip_rows.unwrap_or(0).saturating_sub(first_row);
    let mut rows = range.rows().skip(skip);

    let names: Vec<String> = if options.has_header.unwrap_or(true) {
        match rows.next() {
            Some(header) => (0..width)
                .map(|i| {
                    header
                        .get(i)
                        .map_or_else(|| format!("Unnamed: {}", i), |c| header_name(c, i))
                })
                .collect(),
            None => return Ok(DataFrame::empty()),
        }
    } else {
        (0..width).map(|i| format!("column_{}", i)).collect()
    };
    let names = dedupe_names(names);

    let body: Vec<&[Data]> = match options.n_rows {
        Some(n) => rows.take(n).collect(),
        None => rows.collect(),
    };

    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells: Vec<CellValue> = body
                .iter()
                .map(|row| row.get(i).map_or(CellValue::Null, cell_value))
                .collect();
            cells_to_series(name, &cells).into_column()
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}
