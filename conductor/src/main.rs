mod cli;

use clap::Parser;
use tracing::{error, info};

use cli::{Cli, Commands};
use conductor::Conductor;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Configcheck => {
            conductor_config::Config::load(&cli.config)?;
            println!("configuration OK");
            Ok(())
        }

        Commands::Run => {
            let config = conductor_config::Config::load(&cli.config)?;
            let _conductor = Conductor::bootstrap(&config).await?;
            info!(nodes = config.nodes.len(), "conductor started");

            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            Ok(())
        }

        Commands::Route { file } => {
            let config = conductor_config::Config::load(&cli.config)?;
            let conductor = Conductor::bootstrap(&config).await?;
            let contents = std::fs::read_to_string(&file)?;

            for statement in contents.split(';') {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }

                println!("-- {statement}");
                match conductor.query(statement, &[]).await {
                    Ok(result) => {
                        for row in &result.rows {
                            println!("{row:?}");
                        }
                        println!("rows_affected: {}", result.rows_affected);
                    }
                    Err(err) => error!(%statement, "{err}"),
                }
            }

            Ok(())
        }
    }
}
