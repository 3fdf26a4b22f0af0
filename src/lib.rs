//! SharePoint Frames Library
//!
//! Reads files (CSV, Excel) and lists from a SharePoint site into Polars DataFrames.

pub mod config;
pub mod secret;
pub mod sharepoint;

pub use config::SiteConfig;
pub use sharepoint::{SharePoint, SharePointError};
