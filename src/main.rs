mod categories;
mod cli;
mod collector;
mod eda;
mod error;
mod storage;
mod sync;
mod types;
mod youtube;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use colored::*;
use log::{error, info};
use std::time::Duration;
use storage::ObjectStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let result = run(cli.command).await;
    if let Err(e) = &result {
        error!("{:#}", e);
        eprintln!("{}", "Run failed".red());
    }
    result
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Collect {
            api_key,
            regions,
            output_dir,
            max_results,
            pause_secs,
        } => {
            info!("Collecting {} regions into {}", regions.len(), output_dir.display());
            let collector = collector::Collector::new(
                youtube::YouTubeClient::new(api_key),
                output_dir,
                Duration::from_secs(pause_secs),
                max_results,
            );
            let reports = collector
                .collect_all(&regions)
                .await
                .context("trend collection failed")?;

            println!("\n{}", "Collection Summary:".bold());
            for report in &reports {
                println!(
                    "✓ {} {} rows -> {}",
                    report.region.to_string().green(),
                    report.rows,
                    report.output_path.display()
                );
            }
        }
        Command::Regions { api_key } => {
            let client = youtube::YouTubeClient::new(api_key);
            let regions = client.list_regions().await.context("listing regions failed")?;
            for region in regions {
                println!("{}\t{}", region.gl.bold(), region.name);
            }
        }
        Command::ApiCategories { api_key, region } => {
            let client = youtube::YouTubeClient::new(api_key);
            let categories = client
                .list_video_categories(region)
                .await
                .with_context(|| format!("listing categories for {} failed", region))?;
            for category in categories {
                let assignable = if category.assignable { "assignable" } else { "-" };
                println!("{:>3}\t{}\t{}", category.id, category.title, assignable.dimmed());
            }
        }
        Command::Blobs {
            bucket,
            prefix,
            delimiter,
        } => {
            let store = storage::GcsStore::from_env();
            let names = match &prefix {
                Some(prefix) => {
                    store
                        .list_objects_with_prefix(&bucket, prefix, delimiter.as_deref())
                        .await
                }
                None => store.list_objects(&bucket).await,
            }
            .with_context(|| format!("listing gs://{} failed", bucket))?;
            for name in names {
                println!("{}", name);
            }
        }
        Command::Sync {
            region,
            bucket,
            data_dir,
        } => {
            let store = storage::GcsStore::from_env();
            let report = sync::sync_region(&store, &bucket, &region, &data_dir)
                .await
                .with_context(|| format!("sync of {} from gs://{} failed", region, bucket))?;

            println!(
                "Found {} blobs for {} in gs://{}",
                report.remote_matches, report.region, bucket
            );
            if report.downloaded.is_empty() {
                println!("{}", "All blobs already downloaded.".green());
            } else {
                println!(
                    "Downloaded {} new files into {} ({} already present)",
                    report.downloaded.len().to_string().green(),
                    report.local_dir.display(),
                    report.already_present
                );
            }
        }
        Command::Size { path, extension } => {
            let bytes = sync::local_size(&path, &extension)
                .with_context(|| format!("cannot read {}", path.display()))?;
            println!(
                "Size of all {}s in {}: {} MB",
                extension,
                path.display(),
                bytes as f64 / 1e6
            );
        }
        Command::Eda {
            region,
            data_dir,
            top,
        } => {
            let dir = data_dir.join(region.as_str());
            let rows = eda::load_region(&dir)
                .with_context(|| format!("cannot load CSVs from {}", dir.display()))?;
            let summary = eda::summarize(&rows, top);

            println!("\n{} {}", "Trend Summary:".bold(), region.to_string().green());
            println!("Rows: {}", summary.rows);
            println!("Distinct videos: {}", summary.distinct_videos);
            println!("Distinct channels: {}", summary.distinct_channels);
            match summary.mean_duration_secs {
                Some(mean) => println!("Mean duration: {:.1} s", mean),
                None => println!("Mean duration: n/a"),
            }
            println!("Titles with emoji: {:.1}%", summary.emoji_title_share * 100.0);
            println!("\n{}", "Top categories:".bold());
            for (name, count) in &summary.top_categories {
                println!("  {:<24} {}", name, count);
            }
        }
        Command::Categories => {
            for (id, name) in categories::all() {
                println!("{:>3}\t{}", id, name);
            }
        }
    }

    Ok(())
}
