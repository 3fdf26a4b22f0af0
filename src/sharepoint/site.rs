//! SharePoint site reader
//!
//! Holds the connection parameters and a connector. Every fetch signs in
//! again; no session is kept between calls.

use super::connector::{Connector, HttpConnector};
use super::error::Result;
use super::file;
use super::list;
use super::options::ReadOptions;
use crate::config::SiteConfig;
use polars::prelude::DataFrame;

pub struct SharePoint<C = HttpConnector> {
    config: SiteConfig,
    connector: C,
}

impl SharePoint<HttpConnector> {
    pub fn new(config: SiteConfig) -> Self {
        Self::with_connector(config, HttpConnector::new())
    }

    /// Validate `url` / `client_id` / `client_secret` parameters and build a reader
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Ok(Self::new(SiteConfig::from_params(params)?))
    }
}

impl<C: Connector> SharePoint<C> {
    pub fn with_connector(config: SiteConfig, connector: C) -> Self {
        SharePoint { config, connector }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Sign in and return a fresh session
    pub async fn auth(&self) -> Result<C::Session> {
        self.connector.authenticate(&self.config).await
    }

    /// Fetch `<folder>/<file_name>.<format>` as a DataFrame
    pub async fn get_file(
        &self,
        folder: &str,
        file_name: &str,
        format: &str,
        options: &ReadOptions,
    ) -> Result<DataFrame> {
        // Reject unsupported formats before signing in
        file::FileFormat::from_extension(format)?;
        let session = self.auth().await?;
        file::get_file(&session, folder, file_name, format, options).await
    }

    /// Fetch `<folder>/<file_name>` where `file_name` carries its extension
    pub async fn get_file_by_name(
        &self,
        folder: &str,
        file_name: &str,
        options: &ReadOptions,
    ) -> Result<DataFrame> {
        let (_, extension) = file::split_extension(file_name)?;
        file::FileFormat::from_extension(extension)?;
        let session = self.auth().await?;
        file::get_file_by_name(&session, folder, file_name, options).await
    }

    /// Fetch every item of a list as a DataFrame
    pub async fn get_list(&self, list_name: &str) -> Result<DataFrame> {
        let session = self.auth().await?;
        list::get_list(&session, list_name).await
    }
}
