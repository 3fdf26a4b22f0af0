//! Connection parameters for a SharePoint site
//!
//! Exactly three parameters are recognized: `url`, `client_id` and `client_secret`.
//! Any of them may be left out; an unrecognized key is rejected when the
//! configuration is built, before any network activity.
//!
//! Sources:
//! - a key/value mapping (`from_params`)
//! - a JSON object (`from_json`, `from_file`)
//! - the `SHAREPOINT_URL`, `SHAREPOINT_CLIENT_ID`, `SHAREPOINT_CLIENT_SECRET`
//!   environment variables (`from_env`)

use crate::secret::Secret;
use crate::sharepoint::error::{Result, SharePointError};
use serde_json::Value;
use std::path::Path;

/// Recognized parameter names, in declaration order
pub const PARAMETER_NAMES: [&str; 3] = ["url", "client_id", "client_secret"];

#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    /// Site URL, e.g. https://contoso.sharepoint.com/sites/dataanalytics
    url: Option<String>,

    /// User e-mail or app principal id
    client_id: Option<String>,

    /// User password or app secret
    client_secret: Option<Secret<String>>,
}

impl SiteConfig {
    pub fn new(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: Some(url.into()),
            client_id: Some(client_id.into()),
            client_secret: Some(Secret::new(client_secret.into())),
        }
    }

    /// Build a configuration from a key/value mapping
    ///
    /// Fails with `UnknownParameter` naming the first key outside
    /// `url`, `client_id`, `client_secret`. Later duplicates overwrite earlier ones.
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();

        for (key, value) in params {
            match key.as_ref() {
                "url" => config.url = Some(value.into()),
                "client_id" => config.client_id = Some(value.into()),
                "client_secret" => config.client_secret = Some(Secret::new(value.into())),
                other => {
                    return Err(SharePointError::UnknownParameter {
                        name: other.to_string(),
                    })
                }
            }
        }

        Ok(config)
    }

    /// Build a configuration from a JSON object such as
    /// `{"url": "...", "client_id": "...", "client_secret": "..."}`
    ///
    /// `null` values are treated as absent.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let object = match value {
            Value::Object(map) => map,
            _ => {
                return Err(SharePointError::Config(
                    "Expected a JSON object with connection parameters".to_string(),
                ))
            }
        };

        let mut params = Vec::with_capacity(object.len());
        for (key, value) in object {
            // Key validation comes first so an unknown key is reported even if its value is odd
            if !PARAMETER_NAMES.contains(&key.as_str()) {
                return Err(SharePointError::UnknownParameter { name: key });
            }
            match value {
                Value::String(s) => params.push((key, s)),
                Value::Null => {}
                other => {
                    return Err(SharePointError::Config(format!(
                        "Parameter '{}' must be a string, got {}",
                        key, other
                    )))
                }
            }
        }

        Self::from_params(params)
    }

    /// Read a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Create a configuration from environment variables
    ///
    /// Optional environment variables:
    /// - `SHAREPOINT_URL`
    /// - `SHAREPOINT_CLIENT_ID`
    /// - `SHAREPOINT_CLIENT_SECRET`
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("SHAREPOINT_URL").ok(),
            client_id: std::env::var("SHAREPOINT_CLIENT_ID").ok(),
            client_secret: std::env::var("SHAREPOINT_CLIENT_SECRET")
                .ok()
                .map(Secret::new),
        }
    }

    /// Fill unset values from `other`
    pub fn or(self, other: SiteConfig) -> Self {
        Self {
            url: self.url.or(other.url),
            client_id: self.client_id.or(other.client_id),
            client_secret: self.client_secret.or(other.client_secret),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&Secret<String>> {
        self.client_secret.as_ref()
    }

    pub fn require_url(&self) -> Result<&str> {
        self.url()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SharePointError::Config("url is not set".into()))
    }

    pub fn require_client_id(&self) -> Result<&str> {
        self.client_id()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SharePointError::Config("client_id is not set".into()))
    }

    pub fn require_client_secret(&self) -> Result<&str> {
        self.client_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SharePointError::Config("client_secret is not set".into()))
    }
}
