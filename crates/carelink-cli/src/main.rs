use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;

use carelink_cli::cli::{Cli, Commands};
use carelink_cli::config::{self, AppConfig};
use carelink_cli::output::print_error;
use carelink_cli::{commands, observability};
use carelink_gateway::{EnvToken, FhirStoreClient};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();
    let cfg = config::loader::load_config(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    observability::init_tracing_with_level(cli.log_level.as_deref().unwrap_or(&cfg.logging.level));
    let format = cli.format.unwrap_or_default();

    match &cli.command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&cfg)?);
        }
        Commands::Bootstrap => {
            let client = make_client(&cfg)?;
            commands::bootstrap::bootstrap(&client).await?;
        }
        Commands::Get(args) => {
            let client = make_client(&cfg)?;
            commands::resources::get(&client, &args.reference, format).await?;
        }
        Commands::Search(args) => {
            let client = make_client(&cfg)?;
            commands::resources::search(
                &client,
                &args.resource_type,
                &args.params,
                args.count,
                format,
            )
            .await?;
        }
        Commands::Visit(args) => {
            let client = make_client(&cfg)?;
            commands::clinical::visit(&client, &args.encounter_id, args.count, format).await?;
        }
        Commands::Timeline(args) => {
            let client = make_client(&cfg)?;
            commands::clinical::timeline(&client, &args.episode_id, args.count, format).await?;
        }
        Commands::Problems(args) => {
            let client = make_client(&cfg)?;
            commands::clinical::problems(&client, &args.patient_id, format).await?;
        }
        Commands::Allergies(args) => {
            let client = make_client(&cfg)?;
            commands::clinical::allergies(&client, &args.patient_id, format).await?;
        }
    }

    Ok(())
}

fn make_client(cfg: &AppConfig) -> Result<FhirStoreClient> {
    let tokens = Arc::new(EnvToken::new(&cfg.store.token_env));
    Ok(FhirStoreClient::new(cfg.store.gateway_config(), tokens)?)
}
