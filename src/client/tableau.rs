//! Tableau REST API client
//!
//! Provides [`TableauClient`] for unauthenticated calls (server info, sign-in)
//! and [`Session`] for site-scoped calls made with a sign-in token.

use super::PersonalAccessToken;
use eyre::{Context, Result, eyre};
use reqwest::{Client, Method};
use serde::Deserialize;
use url::Url;

/// REST API version used before negotiation; the oldest that accepts personal access tokens
pub const MIN_TOKEN_API_VERSION: &str = "3.6";

/// Server info is served on every version from 2.4 onwards
const SERVER_INFO_API_VERSION: &str = "2.4";

const AUTH_HEADER: &str = "X-Tableau-Auth";

/// Tableau server client.
///
/// All requests ask for JSON responses. Paths are relative to
/// `{url}/api/{api_version}/`.
///
/// # Example
/// ```no_run
/// use tdsx_exporter::client::{PersonalAccessToken, TableauClient};
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("https://tableau.example.com")?;
/// let mut client = TableauClient::try_new(url)?;
/// client.negotiate_version().await?;
///
/// let token = PersonalAccessToken::new("etl-bot", "secret", "FiscalService");
/// let session = client.sign_in(&token).await?;
/// let response = session.get("projects").await?;
/// session.sign_out().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TableauClient {
    client: Client,
    url: Url,
    api_version: String,
}

impl TableauClient {
    /// Create a client for the server at `url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn try_new(url: Url) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, "application/json".parse()?);
        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            url: with_trailing_slash(url),
            api_version: MIN_TOKEN_API_VERSION.to_string(),
        })
    }

    /// Pin the REST API version instead of negotiating it
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Get the base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// REST API version used for requests
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Absolute URL of an API path for the current version
    pub fn api_url(&self, path: &str) -> Result<Url> {
        self.versioned_url(&self.api_version, path)
    }

    fn versioned_url(&self, version: &str, path: &str) -> Result<Url> {
        let path_stripped = path.strip_prefix('/').unwrap_or(path);
        self.url
            .join(&format!("api/{}/{}", version, path_stripped))
            .with_context(|| format!("Invalid API path: {}", path))
    }

    /// Fetch product and REST API versions from `GET /api/2.4/serverinfo`.
    pub async fn server_info(&self) -> Result<ServerInfo> {
        let url = self.versioned_url(SERVER_INFO_API_VERSION, "serverinfo")?;
        log::debug!("Fetching server info from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Failed to fetch server info ({}): {}", status, body);
        }

        let info: ServerInfoResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse server info response")?;

        Ok(info.server_info)
    }

    /// Adopt the newest REST API version the server supports.
    ///
    /// # Errors
    /// Returns an error if the server is unreachable or too old for
    /// personal access token sign-in
    pub async fn negotiate_version(&mut self) -> Result<ServerInfo> {
        let info = self.server_info().await?;

        if !supports_personal_access_tokens(&info.rest_api_version)? {
            eyre::bail!(
                "Tableau REST API {} does not support personal access tokens (requires {} or newer)",
                info.rest_api_version,
                MIN_TOKEN_API_VERSION
            );
        }

        log::info!(
            "Tableau Server {} (build {}), REST API {}",
            info.product_version.value,
            info.product_version.build,
            info.rest_api_version
        );
        self.api_version = info.rest_api_version.clone();

        Ok(info)
    }

    /// Sign in with a personal access token and open a site-scoped session.
    pub async fn sign_in(&self, token: &PersonalAccessToken) -> Result<Session> {
        let url = self.api_url("auth/signin")?;
        log::debug!("Signing in to site '{}' as {}", token.site, token);

        let response = self
            .client
            .post(url)
            .json(&token.sign_in_request())
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Failed to sign in to Tableau ({}): {}", status, body);
        }

        let signed_in: SignInResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse sign-in response")?;

        log::debug!(
            "Signed in to site {} as user {}",
            signed_in.credentials.site.id,
            signed_in.credentials.user.id
        );

        Ok(Session {
            client: self.clone(),
            token: signed_in.credentials.token,
            site_id: signed_in.credentials.site.id,
        })
    }
}

impl std::fmt::Display for TableauClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (api: {})", self.url, self.api_version)
    }
}

/// An authenticated, site-scoped connection to Tableau.
///
/// Paths passed to [`Session::get`] are prefixed with `sites/{site_id}/`.
/// Sign out with [`Session::sign_out`] or [`Session::close`] when done.
#[derive(Debug)]
pub struct Session {
    client: TableauClient,
    token: String,
    site_id: String,
}

impl Session {
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Site-scoped API path
    pub fn site_path(&self, path: &str) -> String {
        let path_stripped = path.strip_prefix('/').unwrap_or(path);
        format!("sites/{}/{}", self.site_id, path_stripped)
    }

    /// Helper for site-scoped GET requests.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.request(Method::GET, &self.site_path(path), &[]).await
    }

    /// Helper for site-scoped GET requests with query parameters.
    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        self.request(Method::GET, &self.site_path(path), query)
            .await
    }

    /// Send an authenticated request to an API path (not site-scoped).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        let url = self.client.api_url(path)?;
        log::trace!("{} {}", method, url);

        self.client
            .client
            .request(method, url)
            .header(AUTH_HEADER, self.token.as_str())
            .query(query)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {}", e))
    }

    /// Invalidate the session token.
    pub async fn sign_out(self) -> Result<()> {
        let response = self.request(Method::POST, "auth/signout", &[]).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Failed to sign out of Tableau ({}): {}", status, body);
        }

        log::debug!("Signed out of site {}", self.site_id);
        Ok(())
    }

    /// Sign out, then hand back `result`.
    ///
    /// An error in `result` takes precedence over a sign-out failure, which is
    /// only logged in that case.
    pub async fn close<T>(self, result: Result<T>) -> Result<T> {
        match (self.sign_out().await, result) {
            (Ok(()), result) => result,
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(original)) => {
                log::warn!("{}", e);
                Err(original)
            }
        }
    }
}

/// Parse a REST API version such as `3.15` into a comparable version
pub fn parse_api_version(version: &str) -> Result<semver::Version> {
    let padded = match version.matches('.').count() {
        0 => format!("{}.0.0", version),
        1 => format!("{}.0", version),
        _ => version.to_string(),
    };
    semver::Version::parse(&padded)
        .with_context(|| format!("Invalid REST API version: {}", version))
}

/// Whether a REST API version accepts personal access token sign-in
pub fn supports_personal_access_tokens(version: &str) -> Result<bool> {
    Ok(parse_api_version(version)? >= parse_api_version(MIN_TOKEN_API_VERSION)?)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfoResponse {
    server_info: ServerInfo,
}

/// Versions reported by `serverinfo`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub product_version: ProductVersion,
    pub rest_api_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductVersion {
    pub value: String,
    #[serde(default)]
    pub build: String,
}

#[derive(Deserialize)]
struct SignInResponse {
    credentials: SignedInCredentials,
}

#[derive(Deserialize)]
struct SignedInCredentials {
    token: String,
    site: IdOnly,
    user: IdOnly,
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}
