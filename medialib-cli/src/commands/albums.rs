//! Albums command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use medialib_core::{AlbumType, MediaError};
use tracing::info;

use crate::exit_codes::{CliError, USAGE_ERROR};
use crate::utils::open_library;

/// Execute the albums command.
pub fn execute(
    library: Option<PathBuf>,
    include_hidden: bool,
    album_type: Option<String>,
    members: bool,
) -> Result<()> {
    let album_type = album_type
        .map(|t| t.parse::<AlbumType>())
        .transpose()
        .map_err(|e: MediaError| CliError::new(USAGE_ERROR, e.to_string()))?;

    let opened = open_library(library, include_hidden)?;
    let albums = opened.library.fetch_albums(album_type, &[], &[])?;
    info!(count = albums.len(), "Listed albums");

    if albums.is_empty() {
        println!("{}", "No albums".dimmed());
        return Ok(());
    }

    for album in &albums {
        let kind = album
            .album_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "other".to_string());
        println!(
            "{:<24} {:<8} {}",
            album.localized_title().bold(),
            kind,
            album.identifier().dimmed()
        );

        if members {
            for media in album.media() {
                println!("    {:<24} {}", media.identifier(), media.kind());
            }
        }
    }
    Ok(())
}
