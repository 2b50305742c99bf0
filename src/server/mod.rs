//! Crop recommendation server module
//!
//! Serves the trained classifier over HTTP. On startup the retrain policy
//! decides whether the artifact is rebuilt from the dataset, then the
//! artifact is loaded once and shared by every request.

mod api;
mod error;
mod handlers;
mod state;

pub use api::{create_router, origin_matches};
pub use error::ServerError;
pub use state::AppState;

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{CropError, Result};
use crate::inference::Predictor;
use crate::training::{train_and_save, TrainingConfig};

/// Origins allowed by default, matching the deployed frontends
pub const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "https://*.vercel.app",
    "https://agri-aid-kappa.vercel.app",
];

/// When the server rebuilds the artifact at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrainPolicy {
    /// Retrain on every start, overwriting the artifact
    Always,
    /// Train only when no artifact exists
    #[default]
    IfMissing,
}

impl RetrainPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrainPolicy::Always => "always",
            RetrainPolicy::IfMissing => "if-missing",
        }
    }
}

impl fmt::Display for RetrainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetrainPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(RetrainPolicy::Always),
            "if-missing" | "if_missing" | "missing" => Ok(RetrainPolicy::IfMissing),
            other => Err(format!(
                "unknown retrain policy '{}', expected 'always' or 'if-missing'",
                other
            )),
        }
    }
}

/// Allowed CORS origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    /// Exact origins or patterns with one `*` in the host
    List(Vec<String>),
}

impl CorsOrigins {
    /// Parse a comma separated list; `*` alone allows any origin
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if origins.iter().any(|o| o == "*") {
            CorsOrigins::Any
        } else {
            CorsOrigins::List(origins)
        }
    }
}

impl Default for CorsOrigins {
    fn default() -> Self {
        CorsOrigins::List(DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect())
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dataset_path: PathBuf,
    pub artifact_path: PathBuf,
    pub retrain: RetrainPolicy,
    pub cors_origins: CorsOrigins,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            dataset_path: "Crop_recommendation.csv".into(),
            artifact_path: "crop_env_model.json".into(),
            retrain: RetrainPolicy::default(),
            cors_origins: CorsOrigins::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `HOST`, `PORT`, `CROP_DATASET`, `CROP_MODEL`,
    /// `RETRAIN_POLICY` and `CORS_ORIGINS`.
    ///
    /// An unparseable `PORT` or `RETRAIN_POLICY` is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] over an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = var("PORT") {
            config.port = port.trim().parse().map_err(|_| {
                CropError::ValidationError(format!("PORT must be a port number, got '{}'", port))
            })?;
        }
        if let Some(path) = var("CROP_DATASET") {
            config.dataset_path = path.into();
        }
        if let Some(path) = var("CROP_MODEL") {
            config.artifact_path = path.into();
        }
        if let Some(policy) = var("RETRAIN_POLICY") {
            config.retrain = policy
                .parse()
                .map_err(|e| CropError::ValidationError(format!("RETRAIN_POLICY: {}", e)))?;
        }
        if let Some(origins) = var("CORS_ORIGINS") {
            config.cors_origins = CorsOrigins::parse(&origins);
        }

        Ok(config)
    }
}

/// Whether startup should train given the policy and the artifact's presence
pub fn should_retrain(policy: RetrainPolicy, artifact_exists: bool) -> bool {
    match policy {
        RetrainPolicy::Always => true,
        RetrainPolicy::IfMissing => !artifact_exists,
    }
}

/// Apply the retrain policy, then load the artifact
pub fn prepare_predictor(config: &ServerConfig, training: TrainingConfig) -> Result<Predictor> {
    let exists = config.artifact_path.exists();
    let retrain = should_retrain(config.retrain, exists);

    info!(
        policy = %config.retrain,
        artifact = %config.artifact_path.display(),
        artifact_exists = exists,
        retrain,
        "Resolved retrain policy"
    );

    if retrain {
        let report = train_and_save(training, &config.dataset_path, &config.artifact_path)?;
        info!(
            accuracy = report.metrics.accuracy,
            classes = report.n_classes(),
            "Startup training finished"
        );
    }

    Predictor::load(&config.artifact_path)
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        dataset = %config.dataset_path.display(),
        artifact = %config.artifact_path.display(),
        started_at = %start_time.to_rfc3339(),
        "Preparing model"
    );

    let predictor = prepare_predictor(&config, TrainingConfig::default())?;

    let state = Arc::new(AppState::new(predictor));
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        cors = ?config.cors_origins,
        "Crop recommendation server starting"
    );
    info!(url = %format!("http://{}/predict", addr), "Prediction endpoint available");
    info!(url = %format!("http://{}/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install ctrl+c handler, running until killed");
            std::future::pending::<()>().await;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
