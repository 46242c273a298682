//! Preview command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use medialib_core::{AnyMedia, ContentMode, Fidelity, MediaLibrary, Representation, TargetSize};
use tracing::{info, warn};

use super::show::find_media;
use crate::exit_codes::{CliError, DATA_ERROR, USAGE_ERROR};
use crate::utils::open_library;

async fn render(library: &MediaLibrary, media: &AnyMedia, size: TargetSize) -> Result<Representation> {
    let mode = ContentMode::AspectFit;
    let representation = match media {
        AnyMedia::Photo(photo) => library.display_representation(photo, size, mode).await,
        AnyMedia::LivePhoto(live) => library.display_representation(live, size, mode).await,
        AnyMedia::Video(video) => library.display_representation(video, size, mode).await,
        AnyMedia::Audio(_) => {
            return Err(CliError::new(
                DATA_ERROR,
                format!("{} is audio and has no visual representation", media.identifier()),
            )
            .into())
        }
    };
    representation.context("Representation request failed")
}

/// Execute the preview command.
pub async fn execute(
    library: Option<PathBuf>,
    include_hidden: bool,
    id: &str,
    width: u32,
    height: u32,
    quiet: bool,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(CliError::new(USAGE_ERROR, "--width and --height must be positive").into());
    }

    let opened = open_library(library, include_hidden)?;
    let media = find_media(&opened.library, id)?;
    let representation = render(&opened.library, &media, TargetSize::new(width, height)).await?;

    if representation.is_degraded() {
        warn!(id, "Only a degraded representation was available");
    }
    info!(
        id,
        bytes = representation.payload.len(),
        fidelity = ?representation.fidelity,
        "Rendered preview"
    );

    if !quiet {
        let fidelity = match representation.fidelity {
            Fidelity::Full => "full".green(),
            Fidelity::Degraded => "degraded".yellow(),
        };
        let shown = &representation.payload[..representation.payload.len().min(16)];
        println!("   {} {}", "Fidelity:".dimmed(), fidelity);
        println!("   {} {} bytes", "Size:".dimmed(), representation.payload.len());
        println!("   {} {}", "Hex:".dimmed(), hex::encode(shown));
    }
    Ok(())
}
