//! Single file download and parse
//!
//! The file extension picks the parser:
//! - `csv` → delimited text
//! - `xls`, `xlsx`, `xlsm`, `xlsb` → spreadsheet
//!
//! Anything else is rejected before the file is downloaded.

use super::client::SiteAccess;
use super::csv_convert::read_csv;
use super::error::{Result, SharePointError};
use super::excel_convert::read_excel;
use super::options::ReadOptions;
use polars::prelude::DataFrame;

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
}

impl FileFormat {
    /// Map a file extension (without the dot, any case) to a format
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension.to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xls" | "xlsx" | "xlsm" | "xlsb" => Ok(FileFormat::Excel),
            _ => Err(SharePointError::UnsupportedFormat(extension.to_string())),
        }
    }
}

/// Split `report.xlsx` into `("report", "xlsx")`
pub fn split_extension(file_name: &str) -> Result<(&str, &str)> {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Ok((stem, ext)),
        _ => Err(SharePointError::UnsupportedFormat(format!(
            "(none) in '{}'",
            file_name
        ))),
    }
}

/// Server-relative URL `<site-path>/<folder>/<file_name>`
pub fn server_relative_path(site_path: &str, folder: &str, file_name: &str) -> String {
    let folder = folder.trim_matches('/');
    let site_path = site_path.trim_end_matches('/');
    if folder.is_empty() {
        format!("{}/{}", site_path, file_name)
    } else {
        format!("{}/{}/{}", site_path, folder, file_name)
    }
}

/// Download `<folder>/<file_name>.<format>` and parse it according to `format`
///
/// # Arguments
/// * `folder` - Folder inside the site, e.g. `Shared Documents/reports`
/// * `file_name` - File name without extension
/// * `format` - Extension: `csv`, `xls`, `xlsx`, `xlsm` or `xlsb`
/// * `options` - Parser options, passed through unchanged
pub async fn get_file<S: SiteAccess + ?Sized>(
    session: &S,
    folder: &str,
    file_name: &str,
    format: &str,
    options: &ReadOptions,
) -> Result<DataFrame> {
    let file_format = FileFormat::from_extension(format)?;
    let path = server_relative_path(
        session.site_path(),
        folder,
        &format!("{}.{}", file_name, format),
    );

    let bytes = session.open_binary(&path).await?;

    match file_format {
        FileFormat::Csv => read_csv(bytes, &options.csv),
        FileFormat::Excel => read_excel(bytes, &options.excel),
    }
}

/// Same as [`get_file`] with the extension already part of `file_name`
pub async fn get_file_by_name<S: SiteAccess + ?Sized>(
    session: &S,
    folder: &str,
    file_name: &str,
    options: &ReadOptions,
) -> Result<DataFrame> {
    let (stem, extension) = split_extension(file_name)?;
    get_file(session, folder, stem, extension, options).await
}
