//! Medialib CLI - browse and edit a media library snapshot.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error
  65  Invalid data (bad filter, wrong kind, unusable representation)
  66  Library or asset not found
  69  Store unavailable (permission or network)
  74  I/O error writing the library";

#[derive(Parser)]
#[command(name = "medialib")]
#[command(author, version, about = "Typed access to a media library snapshot", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Library snapshot (JSON)
    #[arg(long, global = true, env = "MEDIALIB_LIBRARY", value_name = "FILE")]
    library: Option<PathBuf>,

    /// Include hidden assets in results
    #[arg(long, global = true)]
    include_hidden: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Print only errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List assets, newest first
    List {
        /// Restrict to one kind (photo, video, audio, live-photo)
        #[arg(short, long)]
        kind: Option<String>,

        /// Subtype of the selected kind; repeat to match any of several
        #[arg(short, long = "subtype", requires = "kind")]
        subtypes: Vec<String>,

        /// Only favorites
        #[arg(long)]
        favorites: bool,

        /// Sort key
        #[arg(long, value_enum, default_value_t = commands::list::SortArg::Creation)]
        sort: commands::list::SortArg,

        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,

        /// Maximum number of assets
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the metadata of one asset
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// List albums
    Albums {
        /// Album type (user, cloud, smart); regular albums when omitted
        #[arg(short = 't', long = "type")]
        album_type: Option<String>,

        /// Print the members of each album
        #[arg(long)]
        members: bool,
    },

    /// Mark an asset as favorite and save the library
    Favorite {
        #[arg(value_name = "ID")]
        id: String,

        /// Clear the favorite flag instead
        #[arg(long)]
        unset: bool,
    },

    /// Render a preview of an asset
    Preview {
        #[arg(value_name = "ID")]
        id: String,

        #[arg(long, default_value_t = 320)]
        width: u32,

        #[arg(long, default_value_t = 240)]
        height: u32,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "medialib_core=debug,medialib_cli=debug,info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let library = cli.library;
    let include_hidden = cli.include_hidden;
    let quiet = cli.quiet;

    match cli.command {
        Commands::List {
            kind,
            subtypes,
            favorites,
            sort,
            ascending,
            limit,
            json,
        } => {
            let options = commands::list::ListOptions {
                kind,
                subtypes,
                favorites,
                sort,
                ascending,
                limit,
                json,
            };
            commands::list::execute(library, include_hidden, options)
        }
        Commands::Show { id } => commands::show::execute(library, include_hidden, &id),
        Commands::Albums {
            album_type,
            members,
        } => commands::albums::execute(library, include_hidden, album_type, members),
        Commands::Favorite { id, unset } => {
            commands::favorite::execute(library, include_hidden, &id, !unset, quiet).await
        }
        Commands::Preview { id, width, height } => {
            commands::preview::execute(library, include_hidden, &id, width, height, quiet).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = run(cli).await {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = &exit.message {
            eprintln!("{} {}", "error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
