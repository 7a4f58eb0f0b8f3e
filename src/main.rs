//! Loan Default API - Main Entry Point
//!
//! Serves the HTTP API by default; `train` and `predict` run offline against
//! the same artifacts directory.

use clap::Parser;
use loan_default_api::cli::{cmd_predict, cmd_serve, cmd_train, Cli, Commands};
use loan_default_api::inference::FeatureVector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_default_api=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Train { data, test_size, random_state, artifacts }) => {
            // Fitting is CPU bound; keep it off the async workers
            tokio::task::spawn_blocking(move || cmd_train(&data, test_size, random_state, artifacts)).await??;
        }
        Some(Commands::Predict { model, threshold, age, income, loan_amount, credit_score, artifacts }) => {
            let features = FeatureVector::new(age, income, loan_amount, credit_score);
            cmd_predict(model, threshold, features, artifacts)?;
        }
        Some(Commands::Serve { host, port, artifacts }) => {
            cmd_serve(host, port, artifacts).await?;
        }
        None => {
            cmd_serve(None, None, None).await?;
        }
    }

    Ok(())
}
