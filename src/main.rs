mod catalog;
mod db;
mod feeds;
mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use catalog::StoreType;

#[derive(Parser)]
#[command(name = "halal_catalog", about = "Halal store catalog ingest pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingest pipeline over a directory of feed files and persist
    /// the resulting catalog
    Import {
        /// Directory containing butchers.json, restaurants.json,
        /// wholesalers.json, abattoirs.json, directory.json and an
        /// optional logos.json
        #[arg(short, long)]
        feeds: PathBuf,
        /// Run the transform and print stats without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Show persisted catalog statistics
    Stats,
    /// Stores overview table
    Overview {
        /// Filter by store type (butcher, restaurant, wholesaler,
        /// abattoir, supermarket, other)
        #[arg(short = 't', long)]
        store_type: Option<String>,
        /// Filter by city
        #[arg(short, long)]
        city: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import { feeds, dry_run } => {
            let input = feeds::load_feeds(&feeds)?;
            println!(
                "Loaded feeds: {} butchers, {} restaurants, {} wholesalers, {} abattoirs, {} directory entries",
                input.butchers.len(),
                input.restaurants.len(),
                input.wholesalers.len(),
                input.abattoirs.len(),
                input.directory.entries.len(),
            );
            println!("Directory feed fetched at {}", input.directory.fetched_at);

            let output = pipeline::run(&input);
            output.stats.print();

            if dry_run {
                println!("Dry run: skipping database writes.");
            } else {
                let conn = db::connect()?;
                db::init_schema(&conn)?;
                db::save_catalog(&conn, &output)?;
                let retired = db::retire_dropped(&conn, &output.dropped_source_ids)?;
                db::record_run(&conn, &output)?;
                println!(
                    "Saved {} stores and {} hours rows ({} stale records retired).",
                    output.stores.len(),
                    output.hours.len(),
                    retired,
                );
            }
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Stores:   {}", s.stores);
            println!("Active:   {}", s.active);
            println!("AVS:      {}", s.avs);
            println!("Achahada: {}", s.achahada);
            println!("Hours:    {}", s.hours);
            match s.last_run {
                Some(ran_at) => println!("Last run: {}", ran_at),
                None => println!("Last run: never"),
            }
            Ok(())
        }
        Commands::Overview {
            store_type,
            city,
            limit,
        } => {
            let store_type = match store_type.as_deref() {
                Some(raw) => Some(
                    StoreType::parse(raw)
                        .ok_or_else(|| anyhow::anyhow!("unknown store type: {raw}"))?,
                ),
                None => None,
            };
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, store_type, city.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No stores found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<28} | {:<10} | {:<18} | {:<5} | {:<8} | {:<13} | {:>5} | {:<6}",
                "#", "Name", "Type", "City", "CP", "Cert", "Phone", "Hours", "Active"
            );
            println!("{}", "-".repeat(112));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<28} | {:<10} | {:<18} | {:<5} | {:<8} | {:<13} | {:>5} | {:<6}",
                    i + 1,
                    truncate(&r.name, 28),
                    r.store_type,
                    truncate(&r.city, 18),
                    r.postal_code,
                    r.certifier_code,
                    r.phone,
                    r.hour_count,
                    if r.active { "yes" } else { "no" },
                );
            }
            println!("\n{} stores", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
