mod analysis;
mod app;
mod cloud;
mod config;
mod frequency;
mod normalize;
mod punctuation;
mod rank;
mod report;
mod segment;
mod stopwords;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use app::{run, RunOptions};
use segment::SegmenterKind;

/// Chat log high-frequency word analyzer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Chat log to analyze (plain text, UTF-8)
    input_file: Option<PathBuf>,

    /// Path to config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Path to the user stopword list
    #[arg(long, default_value = "stopwords.txt")]
    stopwords: PathBuf,

    /// Directory for reports and the word cloud
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Word segmentation backend
    #[arg(long, value_enum, default_value_t = SegmenterKind::Jieba)]
    segmenter: SegmenterKind,

    /// Write a stopword template and exit
    #[arg(short = 'c', long)]
    create_exclude: bool,

    /// Write a default config file and exit
    #[arg(long)]
    create_config: bool,
}

const USAGE_HINT: &str = "\
Usage:
  chat_freq <chat-log.txt>
  chat_freq <chat-log.txt> --config my_config.toml
  chat_freq --create-exclude
  chat_freq --create-config";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    if args.create_exclude {
        match stopwords::create_exclude_list(&args.stopwords) {
            Ok(p) => info!("Edit {} to add the words you want excluded", p.display()),
            Err(e) => error!("Could not create stopword template - {}", e),
        }
        return Ok(());
    }

    if args.create_config {
        if let Err(e) = config::create_default_config(&args.config) {
            error!("Could not create config file - {}", e);
        }
        return Ok(());
    }

    let Some(input) = args.input_file else {
        error!("A chat log path is required");
        println!("{}", USAGE_HINT);
        return Ok(());
    };

    if !input.exists() {
        error!("Input file does not exist - path={}", input.display());
        return Ok(());
    }

    let opts = RunOptions {
        input,
        config: args.config,
        stopwords: args.stopwords,
        output_dir: args.output_dir,
        segmenter: args.segmenter,
    };
    if let Err(e) = run(&opts) {
        error!("Run failed - {:#}", e);
    }
    Ok(())
}
