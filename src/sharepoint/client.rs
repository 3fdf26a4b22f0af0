use super::auth::Credential;
use super::error::{Result, SharePointError};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

/// OData verbosity used for every REST call
const ODATA_JSON: &str = "application/json;odata=nometadata";

/// Default `$top` for list item requests
pub const DEFAULT_PAGE_SIZE: u32 = 5000;

/// A list item: property name → value
pub type ListItem = Map<String, Value>;

/// Remote operations available on an authenticated site
///
/// Implementations:
/// - `SharePointClient`: SharePoint REST API over HTTP
#[async_trait]
pub trait SiteAccess: Send + Sync {
    /// Server-relative path of the site, e.g. `/sites/dataanalytics` (empty for the root site)
    fn site_path(&self) -> &str;

    /// Display title of the site
    async fn web_title(&self) -> Result<String>;

    /// Full content of the file at a server-relative URL
    async fn open_binary(&self, server_relative_url: &str) -> Result<Vec<u8>>;

    /// All items of the list with the given title, in a single request
    async fn list_items(&self, list_title: &str) -> Result<Vec<ListItem>>;
}

/// Parsed site URL
#[derive(Debug, Clone)]
pub struct SiteUrl {
    origin: String,
    host: String,
    path: String,
}

impl SiteUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| SharePointError::Config(format!("Invalid site url '{}': {}", url, e)))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| SharePointError::Config(format!("Site url '{}' has no host", url)))?
            .to_string();

        let origin = parsed.origin().ascii_serialization();
        let path = parsed.path().trim_end_matches('/').to_string();

        Ok(SiteUrl { origin, host, path })
    }

    /// Scheme + host (+ port), e.g. `https://contoso.sharepoint.com`
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server-relative site path without trailing slash
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute site URL without trailing slash
    pub fn base(&self) -> String {
        format!("{}{}", self.origin, self.path)
    }
}

/// Quote a value for use inside an OData string literal in a URL path
pub(crate) fn odata_literal(value: &str) -> String {
    urlencoding::encode(&value.replace('\'', "''")).into_owned()
}

#[derive(Debug, Deserialize)]
struct WebInfo {
    #[serde(rename = "Title")]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ItemsPage {
    value: Vec<ListItem>,
    #[serde(rename = "odata.nextLink")]
    next_link: Option<String>,
}

/// Authenticated SharePoint REST session
pub struct SharePointClient {
    http: reqwest::Client,
    site: SiteUrl,
    credential: Credential,
    page_size: u32,
}

impl SharePointClient {
    pub fn new(http: reqwest::Client, site: SiteUrl, credential: Credential) -> Self {
        SharePointClient {
            http,
            site,
            credential,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the `$top` used for list item requests
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn site(&self) -> &SiteUrl {
        &self.site
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        debug!(method = "GET", url, request_id = %request_id, "SharePoint request");

        let request = self
            .http
            .get(url)
            .header(ACCEPT, ODATA_JSON)
            .header("client-request-id", request_id);

        match &self.credential {
            Credential::Bearer(token) => request.bearer_auth(token.expose_secret()),
            Credential::Cookies => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SharePointError::Remote {
            status: status.as_u16(),
            message: odata_error_message(&body).unwrap_or(body),
        })
    }
}

/// Extract `odata.error.message.value` from a SharePoint error body
fn odata_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("odata.error").or_else(|| value.get("error"))?;
    match error.get("message")? {
        Value::String(s) => Some(s.clone()),
        message => message.get("value")?.as_str().map(str::to_string),
    }
}

#[async_trait]
impl SiteAccess for SharePointClient {
    fn site_path(&self) -> &str {
        self.site.path()
    }

    async fn web_title(&self) -> Result<String> {
        let url = format!("{}/_api/web?$select=Title", self.site.base());
        let response = self.send(self.get(&url)).await?;
        let web: WebInfo = response.json().await?;
        Ok(web.title)
    }

    async fn open_binary(&self, server_relative_url: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/_api/web/GetFileByServerRelativeUrl('{}')/$value",
            self.site.base(),
            odata_literal(server_relative_url)
        );
        let response = self.send(self.get(&url)).await?;
        let bytes = response.bytes().await?;
        debug!(path = server_relative_url, bytes = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }

    async fn list_items(&self, list_title: &str) -> Result<Vec<ListItem>> {
        let url = format!(
            "{}/_api/web/lists/GetByTitle('{}')/items?$top={}",
            self.site.base(),
            odata_literal(list_title),
            self.page_size
        );
        let response = self.send(self.get(&url)).await?;
        let page: ItemsPage = response.json().await?;

        if page.next_link.is_some() {
            warn!(
                list = list_title,
                loaded = page.value.len(),
                "List has more items than one page; remaining items were not loaded"
            );
        }

        Ok(page.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::Secret;
    use crate::sharepoint::testing::{capture_logs, CannedResponse, FakeServer, RecordedRequest};

    const FILE_PATH: &str =
        "/sites/data/_api/web/GetFileByServerRelativeUrl('%2Fsites%2Fdata%2FDocs%2Fa.csv')/$value";
    const ITEMS_PATH: &str = "/sites/data/_api/web/lists/GetByTitle('Tarefas')/items";
    const BROKEN_ITEMS_PATH: &str = "/sites/data/_api/web/lists/GetByTitle('Broken')/items";

    fn site_routes(request: &RecordedRequest) -> CannedResponse {
        match (request.method.as_str(), request.path()) {
            ("GET", "/sites/data/_api/web") => {
                CannedResponse::json(200, r#"{"Title":"Data Analytics"}"#)
            }
            ("GET", FILE_PATH) => CannedResponse::new(200, "x,y\n1,2\n"),
            ("GET", ITEMS_PATH) => CannedResponse::json(
                200,
                r#"{"value":[{"Title":"t1"},{"Title":"t2"}],"odata.nextLink":"http://next"}"#,
            ),
            ("GET", BROKEN_ITEMS_PATH) => CannedResponse::new(503, "upstream down"),
            _ => CannedResponse::json(
                404,
                r#"{"odata.error":{"code":"-2130575338, Microsoft.SharePoint.SPException","message":{"lang":"en-US","value":"File Not Found."}}}"#,
            ),
        }
    }

    fn session(server: &FakeServer, credential: Credential) -> SharePointClient {
        let site = SiteUrl::parse(&server.url("/sites/data")).unwrap();
        SharePointClient::new(reqwest::Client::new(), site, credential)
    }

    #[test]
    fn test_site_url_parse() {
        let site = SiteUrl::parse("https://contoso.sharepoint.com/sites/dataanalytics/").unwrap();
        assert_eq!(site.origin(), "https://contoso.sharepoint.com");
        assert_eq!(site.host(), "contoso.sharepoint.com");
        assert_eq!(site.path(), "/sites/dataanalytics");
        assert_eq!(
            site.base(),
            "https://contoso.sharepoint.com/sites/dataanalytics"
        );
    }

    #[test]
    fn test_root_site_has_empty_path() {
        let site = SiteUrl::parse("https://contoso.sharepoint.com").unwrap();
        assert_eq!(site.path(), "");
        assert_eq!(site.base(), "https://contoso.sharepoint.com");
    }

    #[test]
    fn test_invalid_site_url() {
        assert!(matches!(
            SiteUrl::parse("not a url"),
            Err(SharePointError::Config(_))
        ));
    }

    #[test]
    fn test_odata_literal_escapes_quotes_and_spaces() {
        assert_eq!(
            odata_literal("/sites/a/Shared Documents/O'Brien.csv"),
            "%2Fsites%2Fa%2FShared%20Documents%2FO%27%27Brien.csv"
        );
    }

    #[test]
    fn test_odata_error_message() {
        let body = r#"{"odata.error":{"code":"-2130575338, Microsoft.SharePoint.SPException","message":{"lang":"en-US","value":"The file /sites/a/x.csv does not exist."}}}"#;
        assert_eq!(
            odata_error_message(body).as_deref(),
            Some("The file /sites/a/x.csv does not exist.")
        );
        assert_eq!(odata_error_message("<html>"), None);
    }

    #[tokio::test]
    async fn test_bearer_session_requests() {
        let server = FakeServer::start(site_routes).await;
        let client = session(&server, Credential::Bearer(Secret::new("tok-1".to_string())));

        assert_eq!(client.web_title().await.unwrap(), "Data Analytics");
        let bytes = client.open_binary("/sites/data/Docs/a.csv").await.unwrap();
        assert_eq!(bytes, b"x,y\n1,2\n");

        let web = server.request_to("/sites/data/_api/web").unwrap();
        assert_eq!(web.target, "/sites/data/_api/web?$select=Title");

        let file = server.request_to(FILE_PATH).unwrap();
        assert_eq!(file.header("authorization"), Some("Bearer tok-1"));
        assert_eq!(file.header("accept"), Some(ODATA_JSON));
        let request_id = file.header("client-request-id").unwrap();
        assert!(Uuid::parse_str(request_id).is_ok());
        assert_ne!(web.header("client-request-id"), Some(request_id));
    }

    #[tokio::test]
    async fn test_cookie_session_sends_no_bearer() {
        let server = FakeServer::start(site_routes).await;
        let client = session(&server, Credential::Cookies);

        client.web_title().await.unwrap();

        let web = server.request_to("/sites/data/_api/web").unwrap();
        assert_eq!(web.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_list_items_single_page_warns_on_next_link() {
        let server = FakeServer::start(site_routes).await;
        let client = session(&server, Credential::Cookies).with_page_size(2);
        let (logs, _guard) = capture_logs();

        let items = client.list_items("Tarefas").await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["Title"], "t2");
        let request = server.request_to(ITEMS_PATH).unwrap();
        assert_eq!(request.target, format!("{}?$top=2", ITEMS_PATH));
        assert!(logs
            .contents()
            .contains("remaining items were not loaded"));
    }

    #[tokio::test]
    async fn test_error_status_becomes_remote_error() {
        let server = FakeServer::start(site_routes).await;
        let client = session(&server, Credential::Cookies);

        match client.open_binary("/sites/data/Docs/missing.csv").await {
            Err(SharePointError::Remote { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "File Not Found.");
            }
            other => panic!("expected Remote error, got {:?}", other),
        }

        match client.list_items("Broken").await {
            Err(SharePointError::Remote { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected Remote error, got {:?}", other),
        }
    }
}
