use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    /// Also ask the LLM for a new description (needs GROQ_API_KEY).
    #[clap(long, default_value = "false")]
    pub generate: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the listings found in a CSV export
    /// (columns: description, comment).
    Listings {
        /// CSV file
        file: PathBuf,
    },

    /// Enrich one listing of a CSV export.
    Analyze {
        /// CSV file
        file: PathBuf,

        /// Listing index as printed by `listings`
        #[clap(short, long)]
        index: usize,

        #[clap(flatten)]
        generate_args: GenerateArgs,
    },

    /// Enrich a single listing page.
    Page {
        /// Saved HTML of the rendered listing page
        #[clap(long, conflicts_with = "url", required_unless_present = "url")]
        html: Option<PathBuf>,

        /// Listing URL, fetched with a plain HTTP request
        #[clap(long)]
        url: Option<String>,

        #[clap(flatten)]
        generate_args: GenerateArgs,
    },
}
