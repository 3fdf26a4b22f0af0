//! SharePoint REST client module
//!
//! Structure:
//! - `client.rs`: authenticated REST session and the `SiteAccess` trait
//! - `auth.rs`: credential flow selection and token acquisition
//! - `connector.rs`: config → authenticated session
//! - `file.rs` / `list.rs`: the two fetch operations
//! - `csv_convert.rs` / `excel_convert.rs` / `column.rs`: bytes and records → DataFrame
//! - `site.rs`: `SharePoint` reader tying it together
//! - `error.rs`: error types

pub mod auth;
pub mod client;
pub mod column;
pub mod connector;
pub mod csv_convert;
pub mod error;
pub mod excel_convert;
pub mod file;
pub mod list;
pub mod options;
pub mod site;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use auth::{CredentialFlow, EmailHeuristic, IdentityPolicy, OrganizationDomain};
pub use client::{SharePointClient, SiteAccess};
pub use connector::{Connector, HttpConnector};
pub use error::{Result, SharePointError};
pub use options::{CsvOptions, ExcelEngine, ExcelOptions, ReadOptions, SheetSelector, TextEncoding};
pub use site::SharePoint;
