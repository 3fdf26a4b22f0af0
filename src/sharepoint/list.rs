use super::client::{ListItem, SiteAccess};
use super::column::{cells_to_series, CellValue};
use super::error::Result;
use polars::prelude::*;
use serde_json::Value;
use tracing::debug;

/// Load every item of a list and flatten it into a DataFrame
///
/// Items are loaded in a single request; see `HttpConnector::with_page_size`.
pub async fn get_list<S: SiteAccess + ?Sized>(session: &S, list_name: &str) -> Result<DataFrame> {
    let items = session.list_items(list_name).await?;
    debug!(list = list_name, items = items.len(), "Loaded list items");
    records_to_dataframe(&items)
}

/// One row per item, one column per property key seen on any item
///
/// Columns appear in order of first appearance. Properties an item does
/// not carry are null in that row.
pub fn records_to_dataframe(items: &[ListItem]) -> Result<DataFrame> {
    let mut names: Vec<&str> = Vec::new();
    for item in items {
        for key in item.keys() {
            if !names.contains(&key.as_str()) {
                names.push(key);
            }
        }
    }

    if names.is_empty() {
        return Ok(DataFrame::empty_with_height(items.len()));
    }

    let columns: Vec<Column> = names
        .iter()
        .map(|name| {
            let cells: Vec<CellValue> = items
                .iter()
                .map(|item| item.get(*name).map_or(CellValue::Null, json_cell))
                .collect();
            cells_to_series(name, &cells).into_column()
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

fn json_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map_or(CellValue::Null, CellValue::Float),
        },
        Value::String(s) => CellValue::Text(s.clone()),
        // lookups, multi-choice fields, person fields
        Value::Array(_) | Value::Object(_) => CellValue::Text(value.to_string()),
    }
}
