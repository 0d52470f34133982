//! # danmaku CLI
//!
//! Command-line front end for a harvest run: keyword discovery, cached
//! collection of every video's danmaku, then the frequency summary and word
//! cloud. Progress for the collection stage is shown with an indicatif bar;
//! log lines go to stderr and, with `--log-dir`, to a file as well.

mod telemetry;

use anyhow::bail;
use clap::Parser;
use danmaku::config::{DEFAULT_MAX_PAGES, DEFAULT_TARGET_COUNT, DEFAULT_TOP_K, HarvestConfig};
use danmaku::crawler::{CollectProgress, ItemStatus};
use danmaku::pipeline::{Harvester, RunOutcome, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::instrument;

#[derive(Parser, Debug)]
#[command(author, version, about = "Harvest Bilibili danmaku for a search keyword", long_about = None)]
struct Cli {
    /// Search keyword; prompted for when omitted
    keyword: Option<String>,

    /// Number of unique videos to collect
    #[arg(short, long, default_value_t = DEFAULT_TARGET_COUNT)]
    target: usize,

    /// Maximum number of search pages to request
    #[arg(short = 'p', long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,

    /// Directory holding one cache record per video
    #[arg(short, long, default_value = "danmaku_data")]
    cache_dir: PathBuf,

    /// Directory for the summary report and word cloud
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Number of rows in the frequency summary
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top: usize,

    /// Font used for the word cloud (must cover CJK glyphs)
    #[arg(short, long)]
    font: Option<PathBuf>,

    /// Skip word cloud rendering
    #[arg(long)]
    no_render: bool,

    /// Cookie header sent with every request
    #[arg(long, env = "DANMAKU_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Also write logs to harvest.log in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _otel = telemetry::init_tracing_subscriber(cli.log_dir.as_deref())?;

    let keyword = match cli.keyword.clone() {
        Some(keyword) => keyword,
        None => prompt_keyword()?,
    };
    let keyword = keyword.trim().to_string();
    if keyword.is_empty() {
        bail!("Keyword must not be empty");
    }

    harvest_command(&cli, &keyword).await
}

/// Read the keyword from stdin
fn prompt_keyword() -> anyhow::Result<String> {
    print!("Search keyword: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}

fn build_config(cli: &Cli) -> HarvestConfig {
    let mut builder = HarvestConfig::builder()
        .target_count(cli.target)
        .max_pages(cli.max_pages)
        .cache_dir(&cli.cache_dir)
        .output_dir(&cli.output_dir)
        .top_k(cli.top)
        .font_path(cli.font.clone())
        .render(!cli.no_render);
    if let Some(cookie) = &cli.cookie {
        builder = builder.cookie(cookie.clone());
    }
    builder.build()
}

#[instrument(skip(cli))]
async fn harvest_command(cli: &Cli, keyword: &str) -> anyhow::Result<()> {
    let harvester = Harvester::from_config(build_config(cli))?;

    println!("Harvesting danmaku for '{}'...", keyword);
    let start_time = std::time::Instant::now();

    let (progress_sender, mut progress_receiver) = mpsc::channel::<CollectProgress>(100);

    // Length is unknown until discovery finishes; the first update sets it
    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );

    let progress_handle = tokio::spawn({
        let progress_bar = progress_bar.clone();
        async move {
            while let Some(update) = progress_receiver.recv().await {
                progress_bar.set_length(update.total as u64);
                progress_bar.inc(1);
                let status = match update.status {
                    ItemStatus::Cached => "cached",
                    ItemStatus::Fetched => "fetched",
                    ItemStatus::Failed => "failed",
                };
                progress_bar.set_message(format!(
                    "{:03} {} {}",
                    update.index, update.handle, status
                ));
            }
            progress_bar.finish_and_clear();
        }
    });

    let result = harvester.run(keyword, Some(progress_sender)).await;

    // Ends once the pipeline has dropped its sender
    let _ = progress_handle.await;
    let summary = result?;

    print_summary(&summary);
    println!("Finished in {:.2?}", start_time.elapsed());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let discovery = &summary.discovery;
    println!(
        "Discovered {} videos over {} pages ({})",
        discovery.handles.len(),
        discovery.pages_fetched,
        discovery.stop
    );

    match &summary.outcome {
        RunOutcome::NoHandles => {
            println!("No videos found for '{}', nothing to collect", summary.keyword);
            return;
        }
        RunOutcome::EmptyCorpus => {
            println!("No danmaku collected, skipping summary and word cloud");
        }
        RunOutcome::Reported { .. } => {}
    }

    let collection = &summary.collection;
    println!(
        "Videos: {} cached, {} fetched, {} failed",
        collection.cached(),
        collection.fetched(),
        collection.failed()
    );
    println!("Total danmaku entries: {}", summary.total_entries());

    if let RunOutcome::Reported {
        table,
        summary_path,
        image_path,
    } = &summary.outcome
    {
        println!("\nTop {} danmaku:", table.rows().len());
        for (rank, (text, count)) in table.rows().iter().enumerate() {
            println!("{:>2}. {} ({})", rank + 1, text, count);
        }
        println!("\nSummary saved to {}", summary_path.display());
        match image_path {
            Some(path) => println!("Word cloud saved to {}", path.display()),
            None => println!("Word cloud not generated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["danmaku", "大模型"]).unwrap();
        assert_eq!(cli.keyword.as_deref(), Some("大模型"));
        assert_eq!(cli.target, 360);
        assert_eq!(cli.max_pages, 30);
        assert_eq!(cli.top, 8);
        assert!(!cli.no_render);

        let config = build_config(&cli);
        assert_eq!(config.cache_dir, PathBuf::from("danmaku_data"));
        assert!(config.render);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "danmaku",
            "LLM",
            "--target",
            "20",
            "--max-pages",
            "2",
            "--top",
            "3",
            "--no-render",
            "--cookie",
            "SESSDATA=abc",
        ])
        .unwrap();

        let config = build_config(&cli);
        assert_eq!(config.target_count, 20);
        assert_eq!(config.max_pages, 2);
        assert_eq!(config.top_k, 3);
        assert!(!config.render);
        assert_eq!(config.headers.cookie, "SESSDATA=abc");
    }
}
