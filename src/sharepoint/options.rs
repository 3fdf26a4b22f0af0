//! Parser options passed through to the CSV and spreadsheet readers
//!
//! Every field is optional; `None` keeps the reader's own default. The only
//! defaults applied here are the text encoding (UTF-8) and the spreadsheet
//! engine (`Xlsx`), and only when the caller did not choose one.

use super::error::SharePointError;
use std::str::FromStr;

/// Options for both readers; only the set matching the file format is used
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub csv: CsvOptions,
    pub excel: ExcelOptions,
}

impl ReadOptions {
    pub fn csv(options: CsvOptions) -> Self {
        ReadOptions {
            csv: options,
            ..Default::default()
        }
    }

    pub fn excel(options: ExcelOptions) -> Self {
        ReadOptions {
            excel: options,
            ..Default::default()
        }
    }
}

/// Text encoding of a delimited file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Strict UTF-8, invalid bytes are an error
    #[default]
    Utf8,
    /// UTF-8 with invalid sequences replaced
    LossyUtf8,
    /// ISO-8859-1, transcoded to UTF-8 before parsing
    Latin1,
}

impl FromStr for TextEncoding {
    type Err = SharePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "utf8-lossy" | "utf-8-lossy" | "lossy" => Ok(TextEncoding::LossyUtf8),
            "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            other => Err(SharePointError::Config(format!(
                "Unsupported text encoding: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    pub separator: Option<u8>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
    pub n_rows: Option<usize>,
    pub columns: Option<Vec<String>>,
    pub quote_char: Option<u8>,
    pub null_values: Option<Vec<String>>,
    pub infer_schema_length: Option<usize>,
    pub try_parse_dates: Option<bool>,
    pub encoding: Option<TextEncoding>,
}

impl CsvOptions {
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    pub fn with_n_rows(mut self, n_rows: usize) -> Self {
        self.n_rows = Some(n_rows);
        self
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_quote_char(mut self, quote_char: u8) -> Self {
        self.quote_char = Some(quote_char);
        self
    }

    pub fn with_null_values(mut self, null_values: Vec<String>) -> Self {
        self.null_values = Some(null_values);
        self
    }

    /// Rows scanned to infer column types; `0` reads every column as text
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    pub fn with_try_parse_dates(mut self, try_parse_dates: bool) -> Self {
        self.try_parse_dates = Some(try_parse_dates);
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Encoding to decode with: the caller's choice, UTF-8 otherwise
    pub fn resolved_encoding(&self) -> TextEncoding {
        self.encoding.unwrap_or_default()
    }
}

/// Spreadsheet reader implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExcelEngine {
    /// Office Open XML (xlsx, xlsm)
    #[default]
    Xlsx,
    /// Legacy BIFF (xls)
    Xls,
    /// Binary workbook (xlsb)
    Xlsb,
    /// OpenDocument spreadsheet
    Ods,
    /// Detect from content
    Auto,
}

impl FromStr for ExcelEngine {
    type Err = SharePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "xlsm" | "openpyxl" => Ok(ExcelEngine::Xlsx),
            "xls" | "xlrd" => Ok(ExcelEngine::Xls),
            "xlsb" | "pyxlsb" => Ok(ExcelEngine::Xlsb),
            "ods" | "odf" => Ok(ExcelEngine::Ods),
            "auto" | "calamine" => Ok(ExcelEngine::Auto),
            other => Err(SharePointError::Config(format!(
                "Unsupported spreadsheet engine: {}",
                other
            ))),
        }
    }
}

/// Worksheet selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl From<&str> for SheetSelector {
    /// Numeric strings select by position, anything else by name
    fn from(s: &str) -> Self {
        match s.parse::<usize>() {
            Ok(index) => SheetSelector::Index(index),
            Err(_) => SheetSelector::Name(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExcelOptions {
    pub sheet: Option<SheetSelector>,
    pub has_header: Option<bool>,
    pub skip_rows: Option<usize>,
    pub n_rows: Option<usize>,
    pub engine: Option<ExcelEngine>,
}

impl ExcelOptions {
    pub fn with_sheet(mut self, sheet: impl Into<SheetSelector>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = Some(skip_rows);
        self
    }

    pub fn with_n_rows(mut self, n_rows: usize) -> Self {
        self.n_rows = Some(n_rows);
        self
    }

    pub fn with_engine(mut self, engine: ExcelEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Engine to read with: the caller's choice, `Xlsx` otherwise
    pub fn resolved_engine(&self) -> ExcelEngine {
        self.engine.unwrap_or_default()
    }
}
