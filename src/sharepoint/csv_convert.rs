//! Delimited text to Polars DataFrame
//!
//! Options map one-to-one onto Polars' `CsvReadOptions`; unset options keep
//! Polars' defaults. Latin-1 input is transcoded to UTF-8 first because the
//! Polars reader only understands UTF-8.

use super::error::Result;
use super::options::{CsvOptions, TextEncoding};
use polars::prelude::*;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Parse CSV bytes into a DataFrame
pub fn read_csv(bytes: Vec<u8>, options: &CsvOptions) -> Result<DataFrame> {
    let encoding = options.resolved_encoding();

    let (bytes, csv_encoding) = match encoding {
        TextEncoding::Utf8 => (bytes, CsvEncoding::Utf8),
        TextEncoding::LossyUtf8 => (bytes, CsvEncoding::LossyUtf8),
        TextEncoding::Latin1 => (latin1_to_utf8(&bytes), CsvEncoding::Utf8),
    };

    let mut read_options = CsvReadOptions::default();
    if let Some(has_header) = options.has_header {
        read_options = read_options.with_has_header(has_header);
    }
    if let Some(skip_rows) = options.skip_rows {
        read_options = read_options.with_skip_rows(skip_rows);
    }
    if options.n_rows.is_some() {
        read_options = read_options.with_n_rows(options.n_rows);
    }
    if options.infer_schema_length.is_some() {
        read_options = read_options.with_infer_schema_length(options.infer_schema_length);
    }
    if let Some(columns) = &options.columns {
        let columns: Arc<[PlSmallStr]> = columns.iter().map(|c| PlSmallStr::from(c.as_str())).collect();
        read_options = read_options.with_columns(Some(columns));
    }

    let read_options = read_options.map_parse_options(|mut parse| {
        parse = parse.with_encoding(csv_encoding);
        if let Some(separator) = options.separator {
            parse = parse.with_separator(separator);
        }
        if let Some(quote_char) = options.quote_char {
            parse = parse.with_quote_char(Some(quote_char));
        }
        if let Some(null_values) = &options.null_values {
            let values = null_values.iter().map(|v| PlSmallStr::from(v.as_str())).collect();
            parse = parse.with_null_values(Some(NullValues::AllColumns(values)));
        }
        if let Some(try_parse_dates) = options.try_parse_dates {
            parse = parse.with_try_parse_dates(try_parse_dates);
        }
        parse
    });

    let df = read_options
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    debug!(
        rows = df.height(),
        columns = df.width(),
        ?encoding,
        "Parsed delimited text"
    );

    Ok(df)
}

/// ISO-8859-1 maps every byte to the code point with the same value
fn latin1_to_utf8(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .map(|&b| b as char)
        .collect::<String>()
        .into_bytes()
}
