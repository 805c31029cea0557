use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use slice_core::migrations::Migrator;
use slice_core::openapi::ApiDoc;
use slice_core::{logging, seed, services, App, Config};
use utoipa::OpenApi;

#[derive(Parser)]
#[command(name = "slice")]
#[command(about = "Slice food-ordering backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },
    /// Insert the starter menu (existing products are kept)
    Seed,
    /// Give a user the admin role
    Promote {
        /// Email of the account to promote
        email: String,
    },
    /// OpenAPI documentation operations
    Docs {
        #[command(subcommand)]
        action: DocsCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Run pending migrations
    Migrate,
    /// Roll back applied migrations
    Rollback {
        /// Number of migrations to roll back
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
}

#[derive(Subcommand)]
enum DocsCommands {
    /// Export the OpenAPI spec as JSON
    Export {
        /// Output file path
        #[arg(long, default_value = "openapi.json")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.is_production() {
        logging::init_logging_json();
    } else if config.is_dev() {
        logging::init_logging_pretty();
    } else {
        logging::init_logging();
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve => {
            let app = App::with_config(config).await?;
            app.run().await?;
        }
        Commands::Db { action } => {
            let db = slice_core::db::connect(&config).await?;
            match action {
                DbCommands::Migrate => {
                    tracing::info!("Running pending database migrations...");
                    Migrator::up(&db, None).await?;
                    tracing::info!("Migrations complete.");
                }
                DbCommands::Rollback { steps } => {
                    tracing::info!("Rolling back {} migration(s)...", steps);
                    Migrator::down(&db, Some(steps)).await?;
                    tracing::info!("Rollback complete.");
                }
            }
        }
        Commands::Seed => {
            let app = App::with_config(config).await?;
            let report = seed::seed_catalog(&app.db).await?;
            tracing::info!(
                "Seeding complete: {} inserted, {} already present (menu has {} products)",
                report.inserted,
                report.skipped,
                seed::menu_size()
            );
        }
        Commands::Promote { email } => {
            let app = App::with_config(config).await?;
            let user = services::auth::promote_to_admin(&app.db, &email).await?;
            tracing::info!("{} ({}) is now an admin", user.username, user.email);
        }
        Commands::Docs { action } => match action {
            DocsCommands::Export { output } => {
                let spec = ApiDoc::openapi().to_pretty_json()?;
                std::fs::write(&output, spec)?;
                tracing::info!("OpenAPI spec written to {}", output);
            }
        },
    }
    Ok(())
}
