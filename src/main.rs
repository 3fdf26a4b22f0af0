//! SharePoint Frames - command line entry point
//!
//! Fetches a file or a list from a SharePoint site and prints it as a table.
//!
//! Usage:
//! ```bash
//! export SHAREPOINT_URL=https://contoso.sharepoint.com/sites/dataanalytics
//! export SHAREPOINT_CLIENT_ID=analyst@contoso.com
//! export SHAREPOINT_CLIENT_SECRET=...
//! sharepoint_frames get-file --folder "Shared Documents" --file sales --format csv
//! sharepoint_frames get-file --folder "Shared Documents" --name sales.xlsx --sheet Vendas
//! sharepoint_frames get-list --list tb_analytics
//! ```

use anyhow::{anyhow, bail, Context, Result};
use sharepoint_frames::sharepoint::{CsvOptions, ExcelOptions, ReadOptions};
use sharepoint_frames::{SharePoint, SiteConfig};
use std::collections::HashMap;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().collect();
    let (command, flags) = parse_args(&args)?;

    let config = load_config(&flags)?;
    print_config_info(&config);

    let sharepoint = SharePoint::new(config);

    let df = match command.as_str() {
        "get-file" => {
            let folder = flags.get("folder").map(String::as_str).unwrap_or("");
            let options = read_options(&flags)?;
            match flags.get("name") {
                Some(name) => sharepoint.get_file_by_name(folder, name, &options).await?,
                None => {
                    let file = require(&flags, "file")?;
                    let format = require(&flags, "format")?;
                    sharepoint.get_file(folder, file, format, &options).await?
                }
            }
        }
        "get-list" => {
            let list = require(&flags, "list")?;
            sharepoint.get_list(list).await?
        }
        other => bail!("Unknown command '{}'. Expected get-file or get-list", other),
    };

    println!("{}", df);
    Ok(())
}

/// Split `<command> --flag value ...` into the command and a flag map
fn parse_args(args: &[String]) -> Result<(String, HashMap<String, String>)> {
    let command = args
        .get(1)
        .cloned()
        .ok_or_else(|| anyhow!("Usage: sharepoint_frames <get-file|get-list> [--flag value]..."))?;

    let mut flags = HashMap::new();
    let mut i = 2;
    while i < args.len() {
        match args[i].strip_prefix("--") {
            Some(flag) if i + 1 < args.len() => {
                flags.insert(flag.to_string(), args[i + 1].clone());
                i += 2;
            }
            Some(flag) => bail!("Missing value for --{}", flag),
            None => bail!("Unexpected argument '{}'", args[i]),
        }
    }

    Ok((command, flags))
}

/// `--url/--clientId/--clientSecret` win over the `--config` file,
/// which wins over `SHAREPOINT_*` env vars
fn load_config(flags: &HashMap<String, String>) -> Result<SiteConfig> {
    let mut params = Vec::new();
    for (flag, key) in [
        ("url", "url"),
        ("clientId", "client_id"),
        ("clientSecret", "client_secret"),
    ] {
        if let Some(value) = flags.get(flag) {
            params.push((key, value.clone()));
        }
    }
    let mut config = SiteConfig::from_params(params)?;

    if let Some(path) = flags.get("config") {
        let from_file = SiteConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path))?;
        config = config.or(from_file);
    }

    Ok(config.or(SiteConfig::from_env()))
}

fn read_options(flags: &HashMap<String, String>) -> Result<ReadOptions> {
    let mut csv = CsvOptions::default();
    if let Some(separator) = flags.get("separator") {
        match separator.as_bytes() {
            [b] => csv = csv.with_separator(*b),
            _ => bail!("--separator must be a single byte, got '{}'", separator),
        }
    }
    if let Some(encoding) = flags.get("encoding") {
        csv = csv.with_encoding(encoding.parse()?);
    }

    let mut excel = ExcelOptions::default();
    if let Some(sheet) = flags.get("sheet") {
        excel = excel.with_sheet(sheet.as_str());
    }
    if let Some(engine) = flags.get("engine") {
        excel = excel.with_engine(engine.parse()?);
    }

    Ok(ReadOptions { csv, excel })
}

fn require<'a>(flags: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    flags
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing required flag --{}", name))
}

/// Print connection info for debugging, with the secret hidden
fn print_config_info(config: &SiteConfig) {
    eprintln!("SharePoint Frames v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("  URL: {}", config.url().unwrap_or("not set"));
    eprintln!("  Client ID: {}", config.client_id().unwrap_or("not set"));
    eprintln!(
        "  Client secret: {}",
        if config.client_secret().is_some() {
            "***"
        } else {
            "not set"
        }
    );
    eprintln!();
}
