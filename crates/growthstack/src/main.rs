mod analysis;
mod batch;
mod cache;
mod config;
mod error;
mod model;
mod pillar;
mod report;
#[cfg(test)]
mod testutil;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use growthstack_common::gemini::{GeminiClient, GeminiConfig};
use growthstack_common::store::RedisStore;

use analysis::{Analyzer, Coordinates};
use cache::AuditCache;
use config::Config;
use model::AuditResult;
use pillar::Pillar;
use report::AuditReport;

#[derive(Parser)]
#[command(name = "growthstack", version, about = "AI keyword & competitive audit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Audit a single pillar for a domain.
    Analyze {
        /// Target domain, e.g. https://example.com
        domain: String,
        /// Marketing pillar to audit.
        #[arg(long, value_enum)]
        pillar: Pillar,
        /// Latitude for map-grounded pillars.
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        /// Longitude for map-grounded pillars.
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
    },
    /// Audit all six pillars and export the PDF report.
    Report {
        /// Target domain, e.g. https://example.com
        domain: String,
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
        /// Output directory for the PDF (defaults to the current directory).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 1. Configuration and model client; bail early without a credential.
    let config = Config::from_env();
    let client = GeminiClient::new(GeminiConfig::from_env())?;
    if !client.config().has_credential() {
        credential_guidance();
        std::process::exit(2);
    }

    // 2. Result cache (optional; graceful degradation without Redis).
    let store = RedisStore::connect(config.redis_url.as_deref()).await;
    if store.is_available() {
        info!("audit cache connected");
    } else {
        info!("audit cache unavailable, every analysis recomputes");
    }

    // 3. Orchestrator.
    let analyzer = Analyzer::new(client, AuditCache::new(store));

    match cli.command {
        Command::Analyze {
            domain,
            pillar,
            lat,
            lng,
        } => {
            match analyzer
                .analyze(pillar, &domain, coordinates(lat, lng))
                .await
            {
                Ok(result) => print_result(pillar, &result),
                Err(e) if e.is_auth() => {
                    error!(error = %e, "authorization failed");
                    credential_guidance();
                    std::process::exit(2);
                }
                Err(e) => {
                    // Generic failures surface as the fixed degraded result;
                    // it is never cached.
                    error!(error = %e, "analysis failed");
                    print_result(pillar, &AuditResult::service_error());
                }
            }
        }
        Command::Report {
            domain,
            lat,
            lng,
            out,
        } => {
            let results = match batch::run_full_audit(
                &analyzer,
                &domain,
                coordinates(lat, lng),
                |progress| info!(progress, "analyzing search landscape"),
            )
            .await
            {
                Ok(results) => results,
                Err(e) if e.is_auth() => {
                    error!(error = %e, "authorization failed");
                    credential_guidance();
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };

            let report = AuditReport::new(&domain, &results);
            let dir = out.unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(report.file_name());
            report.render_pdf(&path)?;
            info!(path = %path.display(), "report written");
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn coordinates(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinates> {
    match (lat, lng) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    }
}

fn credential_guidance() {
    eprintln!("No model credential configured or the configured key was rejected.");
    eprintln!("Select or create an API key in your host environment, then export it:");
    eprintln!("  export GEMINI_API_KEY=<your key>");
}

fn print_result(pillar: Pillar, result: &AuditResult) {
    let info = pillar.info();
    println!("== {} :: {} ==", info.title, info.objective);
    println!("{}", info.description);
    println!();
    println!("\"{}\"", result.the_difference);

    if let Some(comparison) = &result.comparison {
        println!();
        println!("Scores (current -> target):");
        let rows = [
            ("SEO", comparison.current.seo, comparison.target.seo),
            (
                "Performance",
                comparison.current.performance,
                comparison.target.performance,
            ),
            (
                "Accessibility",
                comparison.current.accessibility,
                comparison.target.accessibility,
            ),
            (
                "Best Practices",
                comparison.current.best_practices,
                comparison.target.best_practices,
            ),
            (
                "AEO Readiness",
                comparison.current.aeo_readiness,
                comparison.target.aeo_readiness,
            ),
        ];
        for (label, current, target) in rows {
            println!("  {label:<14} {current:>3} -> {target:>3}");
        }
    }

    if !result.keywords.is_empty() {
        println!();
        println!("Keyword landscape:");
        for keyword in &result.keywords {
            let mut extras = Vec::new();
            if let Some(volume) = &keyword.volume {
                extras.push(format!("vol {volume}"));
            }
            if let Some(difficulty) = &keyword.difficulty {
                extras.push(format!("diff {difficulty}"));
            }
            let extras = if extras.is_empty() {
                String::new()
            } else {
                format!(" [{}]", extras.join(", "))
            };
            println!("  - {} ({}){}", keyword.term, keyword.intent, extras);
        }
    }

    if !result.competitors.is_empty() {
        println!();
        println!("Rivals detected:");
        for competitor in &result.competitors {
            println!("  {}", competitor.name);
            println!("    advantage:   {}", competitor.advantage);
            println!("    how to beat: {}", competitor.gap);
        }
    }

    if !result.findings.is_empty() {
        println!();
        println!("Forensic discoveries:");
        for (i, finding) in result.findings.iter().enumerate() {
            println!("  {}. {finding}", i + 1);
        }
    }

    if let Some(metadata) = &result.metadata {
        if metadata.channel_exists == Some(true) {
            println!();
            println!(
                "Video channel: {}",
                metadata.channel_link.as_deref().unwrap_or("found")
            );
        }
        if let Some(sources) = &metadata.review_sources {
            if !sources.is_empty() {
                println!();
                println!("Review sources:");
                for source in sources {
                    match source.rating {
                        Some(rating) => println!(
                            "  - {}: {} reviews, {rating:.1} stars",
                            source.source, source.count
                        ),
                        None => println!("  - {}: {} reviews", source.source, source.count),
                    }
                }
            }
        }
    }

    if !result.citations.is_empty() {
        println!();
        println!("Grounded in:");
        for citation in &result.citations {
            if citation.title.is_empty() {
                println!("  - {}", citation.uri);
            } else {
                println!("  - {} <{}>", citation.title, citation.uri);
            }
        }
    }

    println!();
    println!("Strategic roadmap:");
    println!("{}", result.text);
}
