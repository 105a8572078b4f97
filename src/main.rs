mod config;
mod context;
mod dataset;
mod engine;
mod extract;
mod ledger;
mod records;
mod session;
mod sink;
mod traverse;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::records::Entity;
use crate::sink::SinkOutcome;
use crate::traverse::PhaseOutcome;

#[derive(Parser)]
#[command(name = "shop_scraper", about = "Scrape products, reviews and testimonials from web-scraping.dev")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the site and write JSON + CSV per entity
    Run {
        /// Output directory (default: scraped_data)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Site root
        #[arg(long)]
        base_url: Option<String>,
        /// Oldest review year to keep
        #[arg(long)]
        cutoff: Option<i32>,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
        /// Only crawl these entities (products, reviews, testimonials)
        #[arg(long, value_delimiter = ',')]
        only: Vec<Entity>,
    },
    /// Summarize previously written output files
    Summary {
        /// Directory holding the output files
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Year used for reviews with unparseable dates
        #[arg(long)]
        reference_year: Option<i32>,
    },
    /// Print effective settings
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    let result = match cli.command {
        Commands::Run {
            output,
            base_url,
            cutoff,
            headed,
            only,
        } => {
            if let Some(dir) = output {
                settings.output_dir = dir;
            }
            if let Some(url) = base_url {
                settings.base_url = url;
            }
            if let Some(year) = cutoff {
                settings.stale_cutoff_year = year;
            }
            if headed {
                settings.headless = false;
            }
            let entities: Vec<Entity> = if only.is_empty() {
                Entity::ALL.to_vec()
            } else {
                Entity::ALL.into_iter().filter(|e| only.contains(e)).collect()
            };

            println!("Scraping {} from {}", join(&entities), settings.base_url);
            let output_dir = settings.output_dir.clone();
            let report = engine::run(settings, &entities).await?;
            print_report(&report, &output_dir);
            Ok(())
        }
        Commands::Summary {
            dir,
            reference_year,
        } => {
            let dir = dir.unwrap_or_else(|| settings.output_dir.clone());
            let year = reference_year.unwrap_or(settings.stale_cutoff_year);
            let data = dataset::load(&dir, year);

            println!("Products:     {}", data.products.len());
            println!(
                "Reviews:      {}{}",
                data.reviews.len(),
                rating_suffix(data.average_rating(Entity::Review))
            );
            println!(
                "Testimonials: {}{}",
                data.testimonials.len(),
                rating_suffix(data.average_rating(Entity::Testimonial))
            );

            let defaulted = data.reviews.iter().filter(|r| r.parsed.defaulted).count();
            let months = data.monthly_counts();
            if !months.is_empty() {
                println!("\n--- Reviews per month ---");
                for ((y, m), n) in &months {
                    println!("  {}-{:02}: {}", y, m, n);
                }
                if defaulted > 0 {
                    println!("  ({} undated reviews counted as June {})", defaulted, year);
                }
            }
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn print_report(report: &engine::RunReport, output_dir: &std::path::Path) {
    println!("\n{:<13} | {:>7} | {:>7} | {:>5} | Result", "Entity", "Records", "Skipped", "Steps");
    println!("{}", "-".repeat(70));
    for p in &report.phases {
        let result = match &p.outcome {
            PhaseOutcome::Finished(reason) => reason.to_string(),
            PhaseOutcome::Failed(msg) => format!("FAILED: {}", msg),
        };
        println!(
            "{:<13} | {:>7} | {:>7} | {:>5} | {}",
            p.entity, p.admitted, p.skipped, p.steps, result
        );
    }
    let failed = report.phases.iter().filter(|p| p.failed()).count();
    if failed > 0 {
        println!("{} phase(s) ended early; records collected before the failure were kept", failed);
    }

    println!();
    for s in &report.sinks {
        match &s.outcome {
            SinkOutcome::Written { records, files } => {
                let names: Vec<String> = files
                    .iter()
                    .filter_map(|f| f.file_name())
                    .map(|f| f.to_string_lossy().into_owned())
                    .collect();
                println!("Saved {} {} ({})", records, s.entity, names.join(", "));
            }
            SinkOutcome::Empty => println!("No {} to save", s.entity),
            SinkOutcome::Failed(e) => println!("Could not save {}: {}", s.entity, e),
        }
    }
    println!("Output: {}", output_dir.display());
}

fn rating_suffix(avg: Option<f64>) -> String {
    avg.map(|a| format!(" (avg rating {:.2})", a)).unwrap_or_default()
}

fn join(entities: &[Entity]) -> String {
    entities
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
