//! CLI helper functions
//!
//! Each operation opens its own Tableau session from a [`Config`] and signs
//! out before returning.

use crate::{
    client::{PersonalAccessToken, ServerInfo, Session, TableauClient},
    config::Config,
    export::{Conversion, ConversionOutput},
    hyper::HyperServer,
    storage::{EnvSecrets, ObjectStorage, SecretSource},
    tableau::{
        DataSource, DataSourceListing, Project, ProjectListing, download_datasource,
        find_by_name, find_first, pagination::DEFAULT_PAGE_SIZE,
    },
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;

/// Load configuration from environment variables
///
/// See [`Config::from_env`] for the variables read.
pub fn load_config() -> Result<Config> {
    Config::from_env().context("Failed to load configuration")
}

/// Fetch and parse the personal access token blob named by the config
pub async fn load_token<S: SecretSource>(secrets: &S, config: &Config) -> Result<PersonalAccessToken> {
    let blob = secrets
        .get_secret(&config.token_name)
        .await
        .with_context(|| format!("Failed to fetch secret '{}'", config.token_name))?;
    PersonalAccessToken::from_json(&blob, config.site_name.clone())
}

/// Create a client for the configured server using its newest REST API version
pub async fn connect(config: &Config) -> Result<TableauClient> {
    let mut client = TableauClient::try_new(config.server_url.clone())
        .context("Failed to create Tableau client")?;
    client.negotiate_version().await?;
    Ok(client)
}

async fn open_session(config: &Config) -> Result<Session> {
    let client = connect(config).await?;
    let token = load_token(&EnvSecrets, config).await?;
    client.sign_in(&token).await
}

/// Product and REST API versions of the configured server
pub async fn server_version(config: &Config) -> Result<ServerInfo> {
    let mut client = TableauClient::try_new(config.server_url.clone())
        .context("Failed to create Tableau client")?;
    client.negotiate_version().await
}

/// Look up a project by exact name
pub async fn get_project_by_name(config: &Config, name: &str) -> Result<Option<Project>> {
    let session = open_session(config).await?;
    let found = find_by_name(&ProjectListing::new(&session), name).await;
    let found = session.close(found).await?;

    match &found {
        Some(project) => log::info!("Found project {} {}", project.name.green(), project.id),
        None => log::warn!("Project {} not found", name.yellow()),
    }

    Ok(found)
}

/// Whether `datasource` is named `name`, and sits in `project` when one is given
pub fn datasource_matches(datasource: &DataSource, name: &str, project: Option<&str>) -> bool {
    datasource.name == name && project.is_none_or(|p| datasource.project_name() == Some(p))
}

/// Look up a data source by exact name, optionally within a named project
pub async fn get_datasource_by_name(
    config: &Config,
    name: &str,
    project: Option<&str>,
) -> Result<Option<DataSource>> {
    let session = open_session(config).await?;
    let found = find_first(
        &DataSourceListing::new(&session),
        DEFAULT_PAGE_SIZE,
        |datasource| datasource_matches(datasource, name, project),
    )
    .await;
    let found = session.close(found).await?;

    match &found {
        Some(datasource) => log::info!(
            "Found data source {} {}",
            datasource.name.green(),
            datasource.id
        ),
        None => match project {
            Some(project) => log::warn!(
                "Data source {} not found in project {}",
                name.yellow(),
                project.yellow()
            ),
            None => log::warn!("Data source {} not found", name.yellow()),
        },
    }

    Ok(found)
}

/// Download a data source, convert its extracts, and publish them
///
/// `filename` only names the staging and remote paths.
pub async fn convert_hyper_to_store(
    config: &Config,
    datasource_id: &str,
    filename: &str,
) -> Result<ConversionOutput> {
    let engine = HyperServer::new(&config.hyper_endpoint)?;
    let storage = ObjectStorage::from_env(config.region.clone());
    let conversion = Conversion::from_config(config, filename, engine, &storage)?;
    conversion.prepare()?;

    let session = open_session(config).await?;
    let downloaded =
        download_datasource(&session, datasource_id, conversion.layout().download_path()).await;
    let package = session.close(downloaded).await?;

    let output = conversion
        .run(&package)
        .await
        .with_context(|| format!("Failed to convert data source '{}'", datasource_id))?;

    log::info!(
        "Converted {} to {} ({} columns)",
        datasource_id.cyan(),
        output.remote_uri.bright_blue(),
        output.columns.len()
    );

    Ok(output)
}

/// Look up a data source by name and convert it, or `None` when not found
pub async fn export_datasource(
    config: &Config,
    name: &str,
    filename: &str,
    project: Option<&str>,
) -> Result<Option<ConversionOutput>> {
    let Some(datasource) = get_datasource_by_name(config, name, project).await? else {
        return Ok(None);
    };
    convert_hyper_to_store(config, &datasource.id, filename)
        .await
        .map(Some)
}
