//! Mathilda Control - CLI client for the math routing agent.
//!
//! Thin presentation layer: reads configuration from the environment,
//! drives `mathilda_core::MathRouter`, and renders envelopes. All routing
//! semantics live in the core.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use mathilda_core::knowledge::sample_dataset;
use mathilda_core::{Config, MathRouter};
use owo_colors::OwoColorize;
use std::fs;

#[derive(Parser)]
#[command(name = "mathildactl")]
#[command(about = "Mathilda - Step-by-step mathematics assistant", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a mathematics question
    Ask {
        /// The question to route
        question: String,

        /// Print the raw envelope as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rate a solution and optionally get a refined one
    Feedback {
        /// The original question
        #[arg(long)]
        query: String,

        /// The solution being rated
        #[arg(long)]
        solution: String,

        /// What should be improved
        #[arg(long)]
        text: String,

        /// Rating from 1 (poor) to 5 (excellent)
        #[arg(long)]
        rating: u8,
    },

    /// Show recent feedback history
    History {
        /// Number of entries to show
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Show component status
    Status,

    /// Seed the sample dataset into the configured dataset path
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Ask { question, json } => ask(&config, &question, json).await,
        Commands::Feedback {
            query,
            solution,
            text,
            rating,
        } => feedback(&config, &query, &solution, &text, rating).await,
        Commands::History { limit } => history(&config, limit),
        Commands::Status => status(&config),
        Commands::Init => init(&config),
    }
}

async fn ask(config: &Config, question: &str, json: bool) -> Result<()> {
    let router = MathRouter::new(config);
    let envelope = router.process_query(question).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    if envelope.success {
        println!("{} {}", "Source:".bold(), envelope.source.cyan());
        if envelope.confidence > 0.0 {
            println!(
                "{} {}%",
                "Confidence:".bold(),
                (envelope.confidence * 100.0).round() as u32
            );
        }
        println!();
        println!("{}", envelope.solution.unwrap_or_default());
    } else {
        let reason = envelope.error.unwrap_or_else(|| "unknown error".to_string());
        println!("{} {}", "Rejected:".red().bold(), reason);
    }

    Ok(())
}

async fn feedback(
    config: &Config,
    query: &str,
    solution: &str,
    text: &str,
    rating: u8,
) -> Result<()> {
    if !(1..=5).contains(&rating) {
        bail!("rating must be between 1 and 5");
    }

    let router = MathRouter::new(config);
    let response = router.process_feedback(query, solution, text, rating).await;

    if response.success {
        println!("{}", response.message.green());
        if rating < 3 {
            if let Some(refined) = response.refined_solution {
                println!();
                println!("{}", "Refined solution:".bold());
                println!("{}", refined);
            }
        }
    } else {
        println!("{} {}", "Feedback failed:".red().bold(), response.message);
    }

    Ok(())
}

fn history(config: &Config, limit: usize) -> Result<()> {
    let router = MathRouter::new(config);
    let entries = router.feedback_history(limit);

    if entries.is_empty() {
        println!("No feedback recorded yet.");
        return Ok(());
    }

    for entry in entries.iter().rev() {
        println!(
            "{}  {}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            "★".repeat(entry.rating as usize).yellow(),
            entry.query.bold()
        );
        println!("  {}", entry.feedback);
        println!();
    }

    Ok(())
}

fn status(config: &Config) -> Result<()> {
    let router = MathRouter::new(config);

    println!("{}", "Mathilda status".bold());
    println!(
        "  Knowledge base: {} records ({})",
        router.knowledge_size(),
        config.dataset_path.display()
    );
    println!("  Search providers: {}", router.search_providers().join(" -> "));
    println!(
        "  Generation: perplexity={} huggingface={}",
        configured(config.perplexity_api_key.is_some()),
        configured(config.hf_api_token.is_some())
    );
    println!(
        "  Fast mode: {}",
        if config.fast_mode { "on" } else { "off" }
    );
    println!("  Feedback log: {}", config.feedback_path.display());

    Ok(())
}

fn configured(present: bool) -> &'static str {
    if present {
        "configured"
    } else {
        "unconfigured"
    }
}

fn init(config: &Config) -> Result<()> {
    if config.dataset_path.exists() {
        println!(
            "Dataset already exists at {}, leaving it alone.",
            config.dataset_path.display()
        );
        return Ok(());
    }

    if let Some(parent) = config.dataset_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let records = sample_dataset();
    fs::write(
        &config.dataset_path,
        serde_json::to_string_pretty(&records)?,
    )?;

    println!(
        "Seeded {} sample problems into {}.",
        records.len(),
        config.dataset_path.display()
    );
    Ok(())
}
