use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use compass::bloom::classifier::arg_max;
use compass::bloom::evaluation::{one_vs_rest_auc, Evaluation};
use compass::bloom::levels::BloomLevel;
use compass::bloom::{BloomClassifier, HostedBloomClassifier, LabelMap};
use compass::config::ClassifierConfig;

#[derive(Parser)]
#[command(name = "evaluate-bloom")]
#[command(about = "Scores the Bloom classifier against a labeled question CSV")]
struct Args {
    /// CSV with `question` and `label` columns
    #[arg(short, long, default_value = "bloom_dataset.csv")]
    data: PathBuf,

    /// Label mappings file (overrides BLOOM_LABEL_MAP_PATH)
    #[arg(long)]
    label_map: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct LabeledQuestion {
    question: String,
    label: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("compass=info,evaluate_bloom=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ClassifierConfig::from_env()?;
    if let Some(path) = args.label_map {
        config.label_map_path = path;
    }
    let classifier = HostedBloomClassifier::new(
        config.model_url.clone(),
        config.hf_api_token.clone(),
        LabelMap::load(&config.label_map_path)?,
    );

    info!("Loading test data from {}", args.data.display());
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&args.data)
        .with_context(|| format!("Failed to open {}", args.data.display()))?;
    let rows = reader
        .deserialize::<LabeledQuestion>()
        .collect::<Result<Vec<_>, _>>()
        .context("Expected `question` and `label` columns")?;

    let classes: Vec<String> = BloomLevel::ALL.iter().map(|l| l.code().to_string()).collect();
    if let Some(row) = rows.iter().find(|r| !classes.contains(&r.label)) {
        bail!("Label '{}' is not one of L1..L6", row.label);
    }

    info!("Classifying {} questions", rows.len());
    let mut truth = Vec::with_capacity(rows.len());
    let mut predicted = Vec::with_capacity(rows.len());
    let mut scores = Vec::with_capacity(rows.len());
    for row in rows {
        let label_scores = classifier
            .label_scores(&row.question)
            .await
            .with_context(|| format!("Classification failed for {:?}", row.question))?;
        let level = arg_max(&label_scores)
            .map(|best| best.label.clone())
            .with_context(|| format!("No scores returned for {:?}", row.question))?;
        scores.push(
            classes
                .iter()
                .map(|class| {
                    label_scores
                        .iter()
                        .find(|s| &s.label == class)
                        .map_or(0.0, |s| s.score)
                })
                .collect::<Vec<f64>>(),
        );
        truth.push(row.label);
        predicted.push(level);
    }

    let evaluation = Evaluation::new(&classes, &truth, &predicted)?;
    let aucs = one_vs_rest_auc(&classes, &truth, &scores)?;

    println!("\n--- EVALUATION RESULTS ---");
    println!("Accuracy: {:.4}", evaluation.accuracy());
    println!("\nClassification Report:");
    println!("{}", evaluation.report());
    println!("\nConfusion Matrix (rows = true, columns = predicted):");
    println!("{}", evaluation.confusion_report());
    println!("\nROC AUC (one-vs-rest):");
    for (class, auc) in classes.iter().zip(&aucs) {
        match auc {
            Some(auc) => println!("{class:>5} {auc:.4}"),
            None => println!("{class:>5}    n/a"),
        }
    }

    Ok(())
}
