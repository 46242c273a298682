//! Show command implementation.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use medialib_core::{AnyMedia, MediaLibrary};

use crate::exit_codes::{CliError, INPUT_ERROR};
use crate::utils::{format_date, open_library};

/// Resolve an identifier to a domain object, or fail with "not found".
pub fn find_media(library: &MediaLibrary, id: &str) -> Result<AnyMedia> {
    library
        .media_with_identifier(id)?
        .ok_or_else(|| CliError::new(INPUT_ERROR, format!("Asset not found: {id}")).into())
}

/// Execute the show command.
pub fn execute(library: Option<PathBuf>, include_hidden: bool, id: &str) -> Result<()> {
    let opened = open_library(library, include_hidden)?;
    let media = find_media(&opened.library, id)?;
    let metadata = media.metadata();

    println!("{} {}", "Identifier:".dimmed(), media.identifier().bold());
    println!("{} {}", "Kind:".dimmed(), media.kind());
    if !metadata.subtypes.is_empty() {
        println!("{} {:?}", "Subtypes:".dimmed(), metadata.subtypes);
    }
    println!("{} {:?}", "Source:".dimmed(), metadata.source_type);
    println!(
        "{} {}",
        "Created:".dimmed(),
        format_date(metadata.creation_date)
    );
    println!(
        "{} {}",
        "Modified:".dimmed(),
        format_date(metadata.modification_date)
    );
    if let Some(location) = &metadata.location {
        let geohash = location.geohash(9).unwrap_or_default();
        println!(
            "{} {:.5}, {:.5} ({})",
            "Location:".dimmed(),
            location.latitude,
            location.longitude,
            geohash
        );
    }
    println!(
        "{} {}",
        "Favorite:".dimmed(),
        if metadata.is_favorite { "yes".yellow() } else { "no".normal() }
    );
    if metadata.is_hidden {
        println!("{} yes", "Hidden:".dimmed());
    }
    Ok(())
}
