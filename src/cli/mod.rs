//! Loan Default API CLI Module
//!
//! Command-line interface for serving the API, offline training and
//! one-off predictions against stored models.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::inference::{FeatureVector, InferenceConfig, InferenceEngine};
use crate::preprocessing::LoanDataset;
use crate::store::ModelStore;
use crate::training::{MetricsRecord, ModelKind, TrainEngine, TrainingConfig};

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
#[command(name = "loan-default-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train loan-default classifiers and serve predictions over HTTP")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Bind address [env: API_HOST]
        #[arg(long)]
        host: Option<String>,

        /// Port [env: API_PORT]
        #[arg(short, long)]
        port: Option<u16>,

        /// Model artifacts directory [env: ARTIFACTS_DIR]
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// Train both models from a CSV file and store them
    Train {
        /// CSV with columns Age, Income, LoanAmount, CreditScore, Default
        data: PathBuf,

        /// Held-out fraction, between 0.1 and 0.5
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Seed for the train/test split
        #[arg(long, default_value = "42")]
        random_state: u64,

        /// Model artifacts directory [env: ARTIFACTS_DIR]
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },

    /// Score one applicant with a stored model
    Predict {
        /// Model kind (logreg, tree)
        #[arg(short, long, default_value = "logreg")]
        model: ModelKind,

        /// Classification threshold, between 0.1 and 0.9
        #[arg(short, long, default_value = "0.5")]
        threshold: f64,

        #[arg(long)]
        age: f64,

        #[arg(long)]
        income: f64,

        #[arg(long)]
        loan_amount: f64,

        #[arg(long)]
        credit_score: f64,

        /// Model artifacts directory [env: ARTIFACTS_DIR]
        #[arg(long)]
        artifacts: Option<PathBuf>,
    },
}

fn artifacts_or_default(artifacts: Option<PathBuf>) -> PathBuf {
    artifacts.unwrap_or_else(|| crate::server::ServerConfig::default().artifacts_dir)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    data_path: &Path,
    test_size: f64,
    random_state: u64,
    artifacts: Option<PathBuf>,
) -> anyhow::Result<()> {
    section("Train");

    let config = TrainingConfig::new(test_size, random_state)?;

    step_run("Loading data");
    let start = Instant::now();
    let bytes = std::fs::read(data_path)?;
    let dataset = LoanDataset::from_csv_bytes(&bytes)?;
    step_done(&format!("{} rows in {:?}", dataset.n_rows(), start.elapsed()));

    step_run("Training logreg and tree");
    let start = Instant::now();
    let outcome = TrainEngine::new(config).fit(&dataset)?;
    step_done(&format!("{:?}", start.elapsed()));

    let store = ModelStore::open(artifacts_or_default(artifacts))?;
    step_run("Saving models");
    store.save_all(outcome.models.iter().map(|(model, _)| model))?;
    step_done(&store.root().display().to_string());

    let summary = &outcome.summary;
    println!();
    println!("  {:<16} {}", muted("Rows"), summary.rows.to_string().white());
    println!("  {:<16} {}", muted("Default rate"), format!("{:.4}", summary.default_rate).white());
    println!("  {:<16} {}", muted("Credit avg"), format!("{:.1}", summary.credit_avg).white());
    println!("  {:<16} {}", muted("DTI avg"), format!("{:.4}", summary.dti_avg).white());

    for (_, metrics) in &outcome.models {
        print_metrics(metrics);
    }
    println!();

    Ok(())
}

fn print_metrics(m: &MetricsRecord) {
    section(m.model.as_str());
    println!("  {:<16} {}", muted("Accuracy"), format!("{:.4}", m.accuracy).white().bold());
    println!("  {:<16} {}", muted("Precision"), format!("{:.4}", m.precision).white());
    println!("  {:<16} {}", muted("Recall"), format!("{:.4}", m.recall).white());
    println!("  {:<16} {}", muted("F1"), format!("{:.4}", m.f1).white());
    println!(
        "  {:<16} {}",
        muted("Confusion"),
        dim(&format!("tp={} tn={} fp={} fn={}", m.tp, m.tn, m.fp, m.fn_))
    );
}

pub fn cmd_predict(
    model: ModelKind,
    threshold: f64,
    features: FeatureVector,
    artifacts: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = InferenceConfig::new(model, threshold)?;
    let engine = InferenceEngine::new(ModelStore::open(artifacts_or_default(artifacts))?);

    let prediction = engine.predict(&features, &config)?;
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    artifacts: Option<PathBuf>,
) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(dir) = artifacts {
        config = config.with_artifacts_dir(dir);
    }

    let base = format!("http://{}:{}", config.host, config.port);
    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Loan Default API".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API      ", &format!("{}/api", base)));
    line_box(&kv("Health   ", &format!("{}/api/health", base)));
    line_box(&kv("Artifacts", &config.artifacts_dir.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}
