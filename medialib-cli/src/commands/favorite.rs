//! Favorite command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use super::show::find_media;
use crate::utils::open_library;

/// Execute the favorite command.
pub async fn execute(
    library: Option<PathBuf>,
    include_hidden: bool,
    id: &str,
    favorite: bool,
    quiet: bool,
) -> Result<()> {
    let opened = open_library(library, include_hidden)?;
    let media = find_media(&opened.library, id)?;

    if media.metadata().is_favorite == favorite {
        info!(id, favorite, "Favorite flag already set");
    } else {
        opened
            .library
            .mutations()
            .favorite(&media, favorite)
            .await
            .context("Favorite change failed")?;
        opened.save()?;
        info!(id, favorite, path = %opened.path.display(), "Saved favorite change");
    }

    if !quiet {
        let state = if favorite {
            "favorite".yellow()
        } else {
            "not favorite".normal()
        };
        println!("{} {} is {}", "✓".green(), id.bold(), state);
    }
    Ok(())
}
