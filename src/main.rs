use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use tdsx_exporter::cli;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Export Tableau data source extracts as tab-delimited files to object storage
#[derive(Parser)]
#[command(name = "tdsx", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source configuration from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the Tableau Server and REST API versions
    Version,

    /// Look up a project by name
    Project {
        /// Exact project name
        name: String,
    },

    /// Look up a data source by name
    Datasource {
        /// Exact data source name
        name: String,

        /// Only match data sources in this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Download a data source by id and publish its extract
    Convert {
        /// Data source id (LUID)
        datasource_id: String,

        /// File name the staging and remote paths are derived from
        filename: String,
    },

    /// Look up a data source by name and publish its extract
    Export {
        /// Exact data source name
        name: String,

        /// File name the staging and remote paths are derived from
        filename: String,

        /// Only match data sources in this project
        #[arg(short, long)]
        project: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dotenv = dotenvy::from_filename(&cli.env);

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match dotenv {
        Ok(path) => log::debug!("Loaded environment from {}", path.display().bright_black()),
        Err(e) if e.not_found() => log::debug!("No {} file found", cli.env.bright_black()),
        Err(e) => return Err(e.into()),
    }

    let config = cli::load_config()?;

    match cli.command {
        Commands::Version => {
            let info = cli::server_version(&config).await?;
            println!(
                "{} (build {}), REST API {}",
                info.product_version.value, info.product_version.build, info.rest_api_version
            );
        }
        Commands::Project { name } => {
            log::info!("Looking up project {}", name.cyan());
            if let Some(project) = cli::get_project_by_name(&config, &name).await? {
                println!("{}", project);
            }
        }
        Commands::Datasource { name, project } => {
            log::info!("Looking up data source {}", name.cyan());
            if let Some(datasource) =
                cli::get_datasource_by_name(&config, &name, project.as_deref()).await?
            {
                println!("{}", datasource);
            }
        }
        Commands::Convert {
            datasource_id,
            filename,
        } => {
            log::info!(
                "Converting data source {} as {}",
                datasource_id.cyan(),
                filename.bright_black()
            );
            let output = cli::convert_hyper_to_store(&config, &datasource_id, &filename).await?;
            println!("{}", output.remote_uri);
        }
        Commands::Export {
            name,
            filename,
            project,
        } => {
            log::info!(
                "Exporting data source {} as {}",
                name.cyan(),
                filename.bright_black()
            );
            match cli::export_datasource(&config, &name, &filename, project.as_deref()).await? {
                Some(output) => println!("{}", output.remote_uri),
                None => eyre::bail!("Data source '{}' not found", name),
            }
        }
    }

    Ok(())
}
