//! Projects API
//!
//! Lists projects via GET /api/{version}/sites/{site-id}/projects

use super::pagination::{Named, Page, PageRequest, PageSource, Pagination};
use crate::client::Session;

use eyre::{Context, Result};
use serde::Deserialize;

/// A published project
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_project_id: Option<String>,
}

impl Named for Project {
    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.id)
    }
}

#[derive(Deserialize)]
struct ProjectsResponse {
    pagination: Pagination,
    #[serde(default)]
    projects: ProjectList,
}

#[derive(Default, Deserialize)]
struct ProjectList {
    #[serde(default)]
    project: Vec<Project>,
}

/// Parse one page of the projects listing
pub fn parse_projects_page(body: &str) -> Result<Page<Project>> {
    let response: ProjectsResponse =
        serde_json::from_str(body).with_context(|| "Failed to parse projects response")?;
    Ok(Page {
        items: response.projects.project,
        pagination: response.pagination,
    })
}

/// Paged listing of the projects of the signed-in site
///
/// # Example
/// ```no_run
/// use tdsx_exporter::client::{PersonalAccessToken, TableauClient};
/// use tdsx_exporter::tableau::{ProjectListing, find_by_name};
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let client = TableauClient::try_new(Url::parse("https://tableau.example.com")?)?;
/// let token = PersonalAccessToken::new("etl-bot", "secret", "FiscalService");
/// let session = client.sign_in(&token).await?;
/// let project = find_by_name(&ProjectListing::new(&session), "Production").await?;
/// session.sign_out().await?;
/// # Ok(())
/// # }
/// ```
pub struct ProjectListing<'a> {
    session: &'a Session,
}

impl<'a> ProjectListing<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }
}

impl PageSource for ProjectListing<'_> {
    type Item = Project;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Project>> {
        log::debug!("Fetching projects page {}", request.number);

        let response = self
            .session
            .get_with_query("projects", &request.query())
            .await
            .with_context(|| "Failed to fetch projects from Tableau")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eyre::bail!("Failed to fetch projects ({}): {}", status, body);
        }

        let body = response
            .text()
            .await
            .with_context(|| "Failed to read projects response")?;

        parse_projects_page(&body)
    }
}
