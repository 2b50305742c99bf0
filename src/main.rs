//! Crop recommender - Main Entry Point
//!
//! Trains, serves, or queries the crop classifier.

use clap::Parser;
use crop_recommender::cli::{cmd_predict, cmd_serve, cmd_train, Cli, Commands, ServeArgs};
use crop_recommender::inference::CropFeatures;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_recommender=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Train { data, output }) => {
            cmd_train(&data, &output)?;
        }
        Some(Commands::Predict { model, temperature, humidity, ph, rainfall }) => {
            cmd_predict(&model, CropFeatures::new(temperature, humidity, ph, rainfall))?;
        }
        Some(Commands::Serve { host, port, data, model, retrain }) => {
            cmd_serve(ServeArgs { host, port, data, model, retrain }).await?;
        }
        None => {
            // Default: serve with environment configuration
            cmd_serve(ServeArgs::default()).await?;
        }
    }

    Ok(())
}
