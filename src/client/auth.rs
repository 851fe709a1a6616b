use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tableau personal access token credentials for one site
#[derive(Clone, Deserialize)]
pub struct PersonalAccessToken {
    #[serde(rename = "token_name")]
    pub name: String,
    #[serde(rename = "token_secret")]
    pub secret: String,
    /// Site content URL; empty for the default site
    #[serde(skip)]
    pub site: String,
}

impl PersonalAccessToken {
    pub fn new(name: impl Into<String>, secret: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            site: site.into(),
        }
    }

    /// Parse the `{"token_name": ..., "token_secret": ...}` secret blob
    pub fn from_json(blob: &str, site: impl Into<String>) -> Result<Self> {
        let mut token: PersonalAccessToken =
            serde_json::from_str(blob).context("Failed to parse personal access token secret")?;
        token.site = site.into();
        Ok(token)
    }

    /// Request body for `POST /api/{version}/auth/signin`
    pub(crate) fn sign_in_request(&self) -> SignInRequest<'_> {
        SignInRequest {
            credentials: Credentials {
                personal_access_token_name: &self.name,
                personal_access_token_secret: &self.secret,
                site: SiteRef {
                    content_url: &self.site,
                },
            },
        }
    }
}

// Never print the secret
impl std::fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalAccessToken")
            .field("name", &self.name)
            .field("secret", &"********")
            .field("site", &self.site)
            .finish()
    }
}

impl std::fmt::Display for PersonalAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PersonalAccessToken({})", self.name)
    }
}

#[derive(Serialize)]
pub(crate) struct SignInRequest<'a> {
    credentials: Credentials<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    personal_access_token_name: &'a str,
    personal_access_token_secret: &'a str,
    site: SiteRef<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteRef<'a> {
    content_url: &'a str,
}
