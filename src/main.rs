use anyhow::{bail, Context};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod ingest;
mod llm;
mod pipeline;
mod prompt;
mod similarity;
mod storage;
mod summarize;
mod text;
mod translate;
#[cfg(test)]
mod tests;

use cli::GenerateArgs;
use config::Config;
use ingest::ListingTable;
use llm::ChatClient;
use pipeline::Pipeline;
use similarity::Encoder;
use summarize::HostedSummarizer;

const DEFAULT_LOG_FILTER: &str = "staysmart=info";

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // stdout carries the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn get_base_path() -> anyhow::Result<String> {
    if let Ok(base_path) = std::env::var("STAYSMART_BASE_PATH") {
        return Ok(base_path);
    }

    let home = homedir::my_home()
        .ok()
        .flatten()
        .context("Could not determine home directory")?;
    Ok(format!("{}/.local/share/staysmart", home.to_string_lossy()))
}

/// Build the services once, run the pipeline, print the report.
fn enrich(
    config: &Config,
    description: &str,
    comments: &[String],
    generate_args: &GenerateArgs,
) -> anyhow::Result<()> {
    // fail before loading models if generation cannot happen
    let chat = if generate_args.generate {
        Some(ChatClient::from_env(&config.llm)?)
    } else {
        None
    };

    let encoder = Encoder::load(&config.encoder_dir(), config.encoder.max_length)
        .context("failed to load the sentence encoder")?;
    log::debug!("encoder output has {} dimensions", encoder.dimensions());
    let translator = translate::from_config(&config.translation)?;
    let summarizer = HostedSummarizer::from_env(&config.summarizer)?;

    let pipeline = Pipeline::new(translator.as_ref(), &encoder, &summarizer, config.top_k);
    let mut report = pipeline.run(description, comments)?;

    if let Some(chat) = chat {
        pipeline::generate(&chat, &mut report)?;
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            bail!("failed to read .env: {err}");
        }
    }
    init_logging();

    let args = cli::Args::parse();
    let config = Config::load_with(&get_base_path()?)?;

    match args.command {
        cli::Command::Listings { file } => {
            let table = ListingTable::load(&file)?;
            if table.is_empty() {
                log::warn!("{} contains no listings", file.display());
            }
            let overview: Vec<_> = table
                .listings()
                .iter()
                .map(|l| {
                    json!({
                        "index": l.index,
                        "description": l.description,
                        "comments": l.comments.len(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&overview)?);
            Ok(())
        }

        cli::Command::Analyze {
            file,
            index,
            generate_args,
        } => {
            let table = ListingTable::load(&file)?;
            log::debug!("{} listings in {}", table.len(), file.display());
            let Some(listing) = table.get(index) else {
                match table.max_index() {
                    Some(max) => bail!("listing index {index} out of range (0..={max})"),
                    None => bail!("{} contains no listings", file.display()),
                }
            };

            enrich(&config, &listing.description, &listing.comments, &generate_args)
        }

        cli::Command::Page {
            html,
            url,
            generate_args,
        } => {
            let page = match (html, url) {
                (Some(path), _) => {
                    let html = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    ingest::parse_listing_page(&html)
                }
                (None, Some(url)) => ingest::fetch_listing_page(&url)?,
                (None, None) => bail!("either --html or --url is required"),
            };

            enrich(&config, &page.description, &page.comments, &generate_args)
        }
    }
}
