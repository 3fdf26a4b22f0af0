//! Credential flow selection and token acquisition
//!
//! Two flows are supported:
//! - `User`: SharePoint Online SAML sign-in (extSTS + FedAuth cookies)
//! - `Application`: app-only client credentials through ACS (bearer token)
//!
//! Which one is used is decided by an [`IdentityPolicy`] looking at the
//! principal identifier. The default policy is [`EmailHeuristic`].

use super::client::SiteUrl;
use super::error::{Result, SharePointError};
use crate::secret::Secret;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use serde::Deserialize;
use tracing::debug;

/// Principal id of SharePoint Online in ACS
const SHAREPOINT_PRINCIPAL: &str = "00000003-0000-0ff1-ce00-000000000000";

/// Authentication flow for a principal identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFlow {
    /// Username + password
    User,
    /// App principal id + secret
    Application,
}

/// Decides which credential flow a principal identifier uses
pub trait IdentityPolicy: Send + Sync {
    fn flow(&self, client_id: &str) -> CredentialFlow;
}

impl<F> IdentityPolicy for F
where
    F: Fn(&str) -> CredentialFlow + Send + Sync,
{
    fn flow(&self, client_id: &str) -> CredentialFlow {
        self(client_id)
    }
}

/// `User` for anything shaped like `name@domain.tld`, `Application` otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailHeuristic;

impl IdentityPolicy for EmailHeuristic {
    fn flow(&self, client_id: &str) -> CredentialFlow {
        if looks_like_email(client_id) {
            CredentialFlow::User
        } else {
            CredentialFlow::Application
        }
    }
}

fn looks_like_email(id: &str) -> bool {
    let Some((local, domain)) = id.trim().rsplit_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// `User` only for identifiers under one organization's mail domain
#[derive(Debug, Clone)]
pub struct OrganizationDomain {
    suffix: String,
}

impl OrganizationDomain {
    pub fn new(domain: impl AsRef<str>) -> Self {
        let domain = domain.as_ref().trim_start_matches('@');
        Self {
            suffix: format!("@{}", domain.to_lowercase()),
        }
    }
}

impl IdentityPolicy for OrganizationDomain {
    fn flow(&self, client_id: &str) -> CredentialFlow {
        if client_id.trim().to_lowercase().ends_with(&self.suffix) {
            CredentialFlow::User
        } else {
            CredentialFlow::Application
        }
    }
}

/// Security token service endpoints
///
/// Defaults point at the public Microsoft cloud.
#[derive(Debug, Clone)]
pub struct AuthEndpoints {
    /// WS-Trust endpoint for the user flow
    pub sts_url: String,
    /// ACS host for the app-only flow
    pub acs_url: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            sts_url: "https://login.microsoftonline.com/extSTS.srf".to_string(),
            acs_url: "https://accounts.accesscontrol.windows.net".to_string(),
        }
    }
}

/// How an authenticated session proves itself on each request
#[derive(Debug, Clone)]
pub enum Credential {
    /// App-only access token
    Bearer(Secret<String>),
    /// FedAuth/rtFa cookies held by the HTTP client's cookie store
    Cookies,
}

#[derive(Debug, Deserialize)]
struct AcsTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Acquire an app-only access token from ACS
pub async fn acquire_token_for_app(
    http: &reqwest::Client,
    site: &SiteUrl,
    endpoints: &AuthEndpoints,
    client_id: &str,
    client_secret: &str,
) -> Result<Credential> {
    let realm = discover_realm(http, site).await?;
    debug!(realm = %realm, "Discovered tenant realm");

    let token_url = format!(
        "{}/{}/tokens/OAuth/2",
        endpoints.acs_url.trim_end_matches('/'),
        realm
    );
    let principal = format!("{}@{}", client_id, realm);
    let resource = format!("{}/{}@{}", SHAREPOINT_PRINCIPAL, site.host(), realm);

    let response = http
        .post(&token_url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", principal.as_str()),
            ("client_secret", client_secret),
            ("resource", resource.as_str()),
        ])
        .send()
        .await
        .map_err(|e| SharePointError::Auth(format!("Token request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| SharePointError::Auth(format!("Failed to read token response: {}", e)))?;

    let token: AcsTokenResponse = serde_json::from_str(&body).map_err(|_| {
        SharePointError::Auth(format!(
            "Unexpected token response (HTTP {}): {}",
            status.as_u16(),
            body
        ))
    })?;

    match token.access_token {
        Some(access_token) if status.is_success() => {
            Ok(Credential::Bearer(Secret::new(access_token)))
        }
        _ => Err(SharePointError::Auth(
            token
                .error_description
                .or(token.error)
                .unwrap_or_else(|| format!("Token request rejected (HTTP {})", status.as_u16())),
        )),
    }
}

/// Ask the site for its tenant realm via an empty bearer challenge
async fn discover_realm(http: &reqwest::Client, site: &SiteUrl) -> Result<String> {
    let url = format!("{}/_vti_bin/client.svc", site.base());
    let response = http
        .get(&url)
        .header(AUTHORIZATION, "Bearer")
        .send()
        .await
        .map_err(|e| SharePointError::Auth(format!("Realm discovery failed: {}", e)))?;

    response
        .headers()
        .get(WWW_AUTHENTICATE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_realm)
        .ok_or_else(|| {
            SharePointError::Auth(format!(
                "No realm in WWW-Authenticate challenge from {}",
                url
            ))
        })
}

/// Extract `realm="..."` from a `WWW-Authenticate: Bearer ...` header value
pub(crate) fn parse_realm(header: &str) -> Option<String> {
    let params = header.trim().strip_prefix("Bearer")?;
    params
        .split(',')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("realm"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|realm| !realm.is_empty())
}

/// Sign in as a user: exchange credentials for a SAML token, then trade the
/// token for session cookies on the site.
///
/// The cookies land in `http`'s cookie store, so it must be built with
/// `cookie_store(true)`.
pub async fn acquire_token_for_user(
    http: &reqwest::Client,
    site: &SiteUrl,
    endpoints: &AuthEndpoints,
    username: &str,
    password: &str,
) -> Result<Credential> {
    let envelope = saml_envelope(&endpoints.sts_url, site.origin(), username, password);

    let response = http
        .post(&endpoints.sts_url)
        .header(CONTENT_TYPE, "application/soap+xml; charset=utf-8")
        .body(envelope)
        .send()
        .await
        .map_err(|e| SharePointError::Auth(format!("STS request failed: {}", e)))?;

    let body = response
        .text()
        .await
        .map_err(|e| SharePointError::Auth(format!("Failed to read STS response: {}", e)))?;

    let token = extract_security_token(&body)?;

    let signin_url = format!("{}/_forms/default.aspx?wa=wsignin1.0", site.origin());
    let response = http
        .post(&signin_url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(token)
        .send()
        .await
        .map_err(|e| SharePointError::Auth(format!("Sign-in request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(SharePointError::Auth(format!(
            "Sign-in rejected by {} (HTTP {})",
            site.origin(),
            response.status().as_u16()
        )));
    }

    Ok(Credential::Cookies)
}

/// WS-Trust issue request for a SAML 1.0 token scoped to `endpoint`
pub(crate) fn saml_envelope(sts_url: &str, endpoint: &str, username: &str, password: &str) -> String {
    use quick_xml::escape::escape;

    format!(
        r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:a="http://www.w3.org/2005/08/addressing" xmlns:u="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">
  <s:Header>
    <a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2005/02/trust/RST/Issue</a:Action>
    <a:ReplyTo><a:Address>http://www.w3.org/2005/08/addressing/anonymous</a:Address></a:ReplyTo>
    <a:To s:mustUnderstand="1">{sts}</a:To>
    <o:Security s:mustUnderstand="1" xmlns:o="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
      <o:UsernameToken>
        <o:Username>{username}</o:Username>
        <o:Password>{password}</o:Password>
      </o:UsernameToken>
    </o:Security>
  </s:Header>
  <s:Body>
    <t:RequestSecurityToken xmlns:t="http://schemas.xmlsoap.org/ws/2005/02/trust">
      <wsp:AppliesTo xmlns:wsp="http://schemas.xmlsoap.org/ws/2004/09/policy">
        <a:EndpointReference><a:Address>{endpoint}</a:Address></a:EndpointReference>
      </wsp:AppliesTo>
      <t:KeyType>http://schemas.xmlsoap.org/ws/2005/05/identity/NoProofKey</t:KeyType>
      <t:RequestType>http://schemas.xmlsoap.org/ws/2005/02/trust/Issue</t:RequestType>
      <t:TokenType>urn:oasis:names:tc:SAML:1.0:assertion</t:TokenType>
    </t:RequestSecurityToken>
  </s:Body>
</s:Envelope>"#,
        sts = escape(sts_url),
        username = escape(username),
        password = escape(password),
        endpoint = escape(endpoint),
    )
}

/// Pull `BinarySecurityToken` out of an STS response, or the fault text if
/// the STS refused the request
pub(crate) fn extract_security_token(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_token = false;
    let mut in_fault_text = false;
    let mut token = None;
    let mut fault = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"BinarySecurityToken" => in_token = true,
                b"text" => in_fault_text = true,
                _ => {}
            },
            Ok(Event::End(_)) => {
                in_token = false;
                in_fault_text = false;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| SharePointError::Auth(format!("Malformed STS response: {}", e)))?
                    .into_owned();
                if in_token {
                    token = Some(text);
                } else if in_fault_text && fault.is_none() {
                    fault = Some(text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SharePointError::Auth(format!(
                    "Malformed STS response at {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    match (token, fault) {
        (Some(token), _) if !token.is_empty() => Ok(token),
        (_, Some(fault)) => Err(SharePointError::Auth(fault)),
        _ => Err(SharePointError::Auth(
            "STS response contained no security token".to_string(),
        )),
    }
}
