mod catalog;
mod download;
mod extract;
mod locate;
mod normalize;
mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use catalog::Catalog;
use pipeline::{RunStats, Source};

#[derive(Parser)]
#[command(name = "flag_scrape", about = "Wikipedia flag gallery harvester")]
struct Cli {
    /// Directory receiving the downloaded flag images
    #[arg(long, default_value = "drapeau")]
    dir: PathBuf,

    /// Catalog file mapping identifier -> original label
    #[arg(long, default_value = "drapeaux.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest the flag gallery page
    Gallery {
        /// Max candidates to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Harvest the flags-by-proportions page (more countries, spottier markup)
    Proportions {
        /// Max candidates to process (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Harvest both pages, gallery first
    Run {
        /// Max candidates to process per page
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show catalog and image-store counts
    Stats,
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

    let result = match cli.command {
        Commands::Gallery { limit } => {
            let mut catalog = Catalog::load(&cli.catalog);
            let stats = pipeline::run(&Source::gallery(), &cli.dir, &mut catalog, limit).await?;
            print_summary(&stats, &catalog);
            Ok(())
        }
        Commands::Proportions { limit } => {
            let mut catalog = Catalog::load(&cli.catalog);
            let stats =
                pipeline::run(&Source::proportions(), &cli.dir, &mut catalog, limit).await?;
            print_summary(&stats, &catalog);
            Ok(())
        }
        Commands::Run { limit } => {
            let mut catalog = Catalog::load(&cli.catalog);
            let mut total = RunStats::default();
            for source in [Source::gallery(), Source::proportions()] {
                let stats = pipeline::run(&source, &cli.dir, &mut catalog, limit).await?;
                total.downloaded += stats.downloaded;
                total.errors += stats.errors;
                total.labels_seen += stats.labels_seen;
            }
            print_summary(&total, &catalog);
            Ok(())
        }
        Commands::Stats => {
            let catalog = Catalog::load(&cli.catalog);
            let images = match std::fs::read_dir(&cli.dir) {
                Ok(entries) => entries.filter_map(Result::ok).count(),
                Err(_) => 0,
            };
            println!("Cataloged: {}", catalog.len());
            println!("Images:    {}", images);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn print_summary(stats: &RunStats, catalog: &Catalog) {
    println!("Downloaded: {}", stats.downloaded);
    println!("Errors:     {}", stats.errors);
    println!("Labels:     {}", stats.labels_seen);
    println!("Catalog:    {} entries", catalog.len());
}
