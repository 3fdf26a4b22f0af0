//! Cell values to typed Polars columns
//!
//! Spreadsheet cells and list properties arrive as loosely typed values.
//! Each column is typed from what it actually holds:
//! - only booleans → Boolean
//! - only integers → Int64
//! - only numbers → Float64
//! - anything else → String (numbers and booleans rendered as text)
//!
//! Nulls never influence the type. An all-null column becomes a String column.

use polars::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Empty,
    Bool,
    Int,
    Float,
    Text,
}

fn infer_kind(cells: &[CellValue]) -> ColumnKind {
    cells.iter().fold(ColumnKind::Empty, |kind, cell| {
        match (kind, cell) {
            (kind, CellValue::Null) => kind,
            (ColumnKind::Text, _) | (_, CellValue::Text(_)) => ColumnKind::Text,
            (ColumnKind::Empty | ColumnKind::Bool, CellValue::Bool(_)) => ColumnKind::Bool,
            (ColumnKind::Empty | ColumnKind::Int, CellValue::Int(_)) => ColumnKind::Int,
            (ColumnKind::Empty | ColumnKind::Int | ColumnKind::Float, CellValue::Float(_))
            | (ColumnKind::Float, CellValue::Int(_)) => ColumnKind::Float,
            // booleans mixed with numbers
            _ => ColumnKind::Text,
        }
    })
}

/// Build a typed Series from a column of cells
pub fn cells_to_series(name: &str, cells: &[CellValue]) -> Series {
    match infer_kind(cells) {
        ColumnKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    CellValue::Int(i) => Some(*i as f64),
                    CellValue::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Text | ColumnKind::Empty => {
            let values: Vec<Option<String>> = cells.iter().map(CellValue::to_text).collect();
            Series::new(name.into(), values)
        }
    }
}

/// Make column names unique the way pandas does: `a`, `a.1`, `a.2`, ...
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut n = 1;
            loop {
                let candidate = format!("{}.{}", name, n);
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}
