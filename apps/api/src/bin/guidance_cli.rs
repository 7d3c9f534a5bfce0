use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use compass::config::GuidanceConfig;
use compass::guidance::GuidanceEngine;

#[derive(Parser)]
#[command(name = "guidance-cli")]
#[command(about = "Interactive career recommendations from the terminal")]
struct Args {
    /// Student records CSV (overrides STUDENT_DATA_PATH)
    #[arg(long)]
    student_data: Option<PathBuf>,

    /// Research paper PDF used to build the index (overrides RESEARCH_PAPER_PATH)
    #[arg(long)]
    research_paper: Option<PathBuf>,

    /// Vector index directory (overrides VECTOR_INDEX_PATH)
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

const RULE_WIDTH: usize = 62;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("compass={level}"))))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = GuidanceConfig::from_env()?;
    if let Some(path) = args.student_data {
        config.student_data_path = path;
    }
    if let Some(path) = args.research_paper {
        config.research_paper_path = path;
    }
    if let Some(path) = args.index_dir {
        config.vector_index_path = path;
    }

    println!("--- Initializing guidance engine (the first run builds the index)... ---");
    let engine = GuidanceEngine::from_config(&config)
        .await
        .context("Check the data files and the .env settings")?;
    println!("--- Engine ready. ---");

    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        println!("\n{}", "=".repeat(50));
        println!("Career Guidance");
        println!("Enter student details below (type 'exit' at any prompt to quit).");
        println!("{}", "=".repeat(50));

        let Some(enrollment) = prompt(&mut input, "> Enrollment number (Enter if none): ")? else {
            break;
        };

        let Some(aq_raw) = prompt(&mut input, "> AQ score: ")? else {
            break;
        };
        let aq_score: i32 = match aq_raw.parse() {
            Ok(score) => score,
            Err(_) => {
                println!("Invalid AQ score, please enter a number. Restarting...");
                continue;
            }
        };

        let Some(skills_raw) = prompt(&mut input, "> Skills (comma-separated, e.g. Python, SQL): ")? else {
            break;
        };
        let skills = split_list(&skills_raw, false);

        let Some(traits_raw) = prompt(&mut input, "> Traits (optional, comma-separated, e.g. C, O, R): ")? else {
            break;
        };
        let traits = split_list(&traits_raw, true);

        println!("\nAnalyzing profile and generating recommendations...");
        let recommendations = match engine
            .generate_recommendations(&enrollment, aq_score, &skills, &traits)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                println!("Could not reach the model: {e}");
                continue;
            }
        };

        print_report(&enrollment, aq_score, &skills, &traits, &recommendations);
    }

    Ok(())
}

/// Reads one trimmed line. `None` on `exit` or end of input.
fn prompt(input: &mut impl BufRead, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") {
        return Ok(None);
    }
    Ok(Some(line.to_string()))
}

fn split_list(raw: &str, upper: bool) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| if upper { s.to_uppercase() } else { s.to_string() })
        .collect()
}

fn print_report(enrollment: &str, aq_score: i32, skills: &[String], traits: &[String], careers: &[String]) {
    let enrollment = if enrollment.is_empty() { "N/A" } else { enrollment };

    println!("\n{} CAREER GUIDANCE REPORT {}", "-".repeat(19), "-".repeat(19));
    println!("  Enrollment ID: {enrollment}");
    println!("  AQ Score:      {aq_score}");
    println!("  Skills:        {}", skills.join(", "));
    if !traits.is_empty() {
        println!("  Traits:        {}", traits.join(", "));
    }
    println!("{}", "-".repeat(RULE_WIDTH));
    println!("  Top 3 Career Recommendations:");
    if careers.is_empty() {
        println!("     Could not generate specific recommendations based on the input.");
    }
    for (i, career) in careers.iter().enumerate() {
        println!("     {}. {career}", i + 1);
    }
    println!("{}", "-".repeat(RULE_WIDTH));
}
