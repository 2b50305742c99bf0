//! Crop recommender CLI module
//!
//! Command-line interface for training, serving and offline prediction.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::inference::{CropFeatures, Predictor};
use crate::server::{run_server, RetrainPolicy, ServerConfig};
use crate::training::{train_and_save, TrainingConfig, TrainingReport};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "crop-recommender")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Crop recommendation from temperature, humidity, pH and rainfall")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the classifier and write the model artifact
    Train {
        /// Labeled dataset (CSV)
        #[arg(short, long, default_value = "Crop_recommendation.csv")]
        data: PathBuf,

        /// Artifact output path
        #[arg(short, long, default_value = "crop_env_model.json")]
        output: PathBuf,
    },

    /// Serve predictions over HTTP
    Serve {
        /// Bind address [env: HOST]
        #[arg(long)]
        host: Option<String>,

        /// Server port [env: PORT]
        #[arg(short, long)]
        port: Option<u16>,

        /// Dataset used when training at startup [env: CROP_DATASET]
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Model artifact path [env: CROP_MODEL]
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Startup retraining: always or if-missing [env: RETRAIN_POLICY]
        #[arg(long)]
        retrain: Option<RetrainPolicy>,
    },

    /// Predict one crop offline from a saved artifact
    Predict {
        /// Model artifact path
        #[arg(short, long, default_value = "crop_env_model.json")]
        model: PathBuf,

        #[arg(long, allow_negative_numbers = true)]
        temperature: f64,

        #[arg(long, allow_negative_numbers = true)]
        humidity: f64,

        #[arg(long, allow_negative_numbers = true)]
        ph: f64,

        #[arg(long, allow_negative_numbers = true)]
        rainfall: f64,
    },
}

/// Overrides from the `serve` flags, applied on top of environment defaults
#[derive(Debug, Default, Clone)]
pub struct ServeArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data: Option<PathBuf>,
    pub model: Option<PathBuf>,
    pub retrain: Option<RetrainPolicy>,
}

impl ServeArgs {
    pub fn into_config(self, base: ServerConfig) -> ServerConfig {
        ServerConfig {
            host: self.host.unwrap_or(base.host),
            port: self.port.unwrap_or(base.port),
            dataset_path: self.data.unwrap_or(base.dataset_path),
            artifact_path: self.model.unwrap_or(base.artifact_path),
            retrain: self.retrain.unwrap_or(base.retrain),
            cors_origins: base.cors_origins,
        }
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(data_path: &Path, output: &Path) -> anyhow::Result<()> {
    section("Train");

    step_run(&format!("Training on {}", data_path.display()));
    let start = Instant::now();
    let report = train_and_save(TrainingConfig::default(), data_path, output)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&report);
    println!("  {:<16} {}", muted("Artifact"), output.display().to_string().white());
    println!();

    Ok(())
}

fn print_report(report: &TrainingReport) {
    println!();
    println!("  {:<16} {}", muted("Accuracy"), format!("{:.4}", report.accuracy()).white().bold());
    println!("  {:<16} {}", muted("F1 (macro)"), format!("{:.4}", report.metrics.f1_score).white());
    println!("  {:<16} {}", muted("Classes"), report.n_classes().to_string().white());
    println!(
        "  {:<16} {}",
        muted("Rows"),
        format!("{} train / {} holdout", report.n_train, report.n_holdout).white()
    );
    for (name, importance) in &report.feature_importances {
        println!("  {:<16} {}", muted(name), dim(&format!("{:.3}", importance)));
    }
    println!("  {:<16} {}", muted("Time"), format!("{:.3}s", report.training_time_secs).white());
}

pub fn cmd_predict(model_path: &Path, features: CropFeatures) -> anyhow::Result<()> {
    section("Predict");

    step_run(&format!("Loading {}", model_path.display()));
    let predictor = Predictor::load(model_path)?;
    step_done(&format!("{} classes", predictor.classes().len()));

    let crop = predictor.predict(&features)?;
    println!();
    println!("  {:<16} {}", muted("Crop"), crop.green().bold());
    println!();

    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.into_config(ServerConfig::from_env()?);
    let base = format!("http://{}:{}", config.host, config.port);

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Crop Recommender".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Predict", &format!("{}/predict", base)));
    line_box(&kv("Health ", &format!("{}/health", base)));
    line_box(&kv("Model  ", &config.artifact_path.display().to_string()));
    line_box(&kv("Retrain", config.retrain.as_str()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::CorsOrigins;
    use clap::CommandFactory;

    fn base() -> ServerConfig {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            dataset_path: "data.csv".into(),
            artifact_path: "model.json".into(),
            retrain: RetrainPolicy::IfMissing,
            cors_origins: CorsOrigins::Any,
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["crop-recommender"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_flags_override() {
        let cli = Cli::try_parse_from([
            "crop-recommender", "serve", "--port", "5001", "--retrain", "always",
        ])
        .unwrap();
        let Some(Commands::Serve { host, port, data, model, retrain }) = cli.command else {
            panic!("expected serve");
        };
        let config = ServeArgs { host, port, data, model, retrain }.into_config(base());
        assert_eq!(config.port, 5001);
        assert_eq!(config.retrain, RetrainPolicy::Always);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.artifact_path, PathBuf::from("model.json"));
    }

    #[test]
    fn test_predict_args() {
        let cli = Cli::try_parse_from([
            "crop-recommender", "predict", "--temperature", "-2.5", "--humidity", "80",
            "--ph", "6.5", "--rainfall", "200",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Predict { temperature, ph, .. }) => {
                assert_eq!(temperature, -2.5);
                assert_eq!(ph, 6.5);
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_predict_accepts_negative_values() {
        let cli = Cli::try_parse_from([
            "crop-recommender", "predict", "--temperature", "-1", "--humidity", "-2",
            "--ph", "-3", "--rainfall", "-4",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Predict { temperature, humidity, ph, rainfall, .. }) => {
                assert_eq!([temperature, humidity, ph, rainfall], [-1.0, -2.0, -3.0, -4.0]);
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1mhi\x1b[0m"), "hi");
    }
}
