//! List command implementation.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use medialib_core::{
    AssetSortKey, Audio, Field, Filter, LibraryConfig, LivePhoto, Media, MediaError, MediaKind,
    MediaLibrary, MediaSubtype, Metadata, NativeSubtypes, Photo, Predicate, Resolve, Sort, Video,
};
use serde_json::json;
use tracing::info;

use crate::exit_codes::{CliError, USAGE_ERROR};
use crate::utils::{format_date, open_library};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Creation,
    Modification,
    Identifier,
}

impl SortArg {
    fn key(self) -> AssetSortKey {
        match self {
            Self::Creation => AssetSortKey::CreationDate,
            Self::Modification => AssetSortKey::ModificationDate,
            Self::Identifier => AssetSortKey::Identifier,
        }
    }
}

pub struct ListOptions {
    pub kind: Option<String>,
    pub subtypes: Vec<String>,
    pub favorites: bool,
    pub sort: SortArg,
    pub ascending: bool,
    pub limit: Option<usize>,
    pub json: bool,
}

/// One printed asset.
struct Row {
    identifier: String,
    kind: MediaKind,
    metadata: Metadata,
}

impl Row {
    fn from_media<M: Media>(media: &M) -> Self {
        Self {
            identifier: media.identifier(),
            kind: M::KIND,
            metadata: media.metadata(),
        }
    }
}

fn usage(err: MediaError) -> CliError {
    CliError::new(USAGE_ERROR, err.to_string())
}

fn base_filters<S: MediaSubtype>(favorites: bool) -> Vec<Filter<S>> {
    if favorites {
        vec![Filter::Custom(Predicate::equals(Field::IsFavorite, true))]
    } else {
        Vec::new()
    }
}

fn list_kind<M>(
    library: &MediaLibrary,
    subtypes: &[String],
    favorites: bool,
    sort: Sort<AssetSortKey>,
) -> Result<Vec<Row>>
where
    M: Media + Resolve,
    M::Subtype: FromStr<Err = MediaError>,
{
    let mut filters = base_filters::<M::Subtype>(favorites);
    if !subtypes.is_empty() {
        let parsed = subtypes
            .iter()
            .map(|s| s.parse::<M::Subtype>().map_err(usage))
            .collect::<Result<Vec<_>, _>>()?;
        filters.push(Filter::subtypes(parsed));
    }

    let assets = library.fetch_assets::<M>(&filters, &[sort])?;
    Ok(assets.iter().map(Row::from_media).collect())
}

fn list_all(library: &MediaLibrary, favorites: bool, sort: Sort<AssetSortKey>) -> Result<Vec<Row>> {
    let filters = base_filters::<NativeSubtypes>(favorites);
    let media = library.fetch_media(&filters, &[sort])?;
    Ok(media
        .iter()
        .map(|m| Row {
            identifier: m.identifier(),
            kind: m.kind(),
            metadata: m.metadata(),
        })
        .collect())
}

/// Execute the list command.
pub fn execute(library: Option<PathBuf>, include_hidden: bool, options: ListOptions) -> Result<()> {
    if options.limit == Some(0) {
        return Err(CliError::new(USAGE_ERROR, "--limit must be positive").into());
    }

    let opened = open_library(library, include_hidden)?;

    let config = LibraryConfig {
        fetch_limit: options.limit.or(opened.library.config().fetch_limit),
        ..opened.library.config().clone()
    };
    let library = MediaLibrary::with_config(opened.store.clone(), config);
    let sort = Sort::new(options.sort.key(), options.ascending);

    let rows = match options.kind.as_deref() {
        None => list_all(&library, options.favorites, sort)?,
        Some(kind) => {
            let kind: MediaKind = kind.parse().map_err(usage)?;
            let (subtypes, favorites) = (&options.subtypes, options.favorites);
            match kind {
                MediaKind::Photo => list_kind::<Photo>(&library, subtypes, favorites, sort)?,
                MediaKind::Video => list_kind::<Video>(&library, subtypes, favorites, sort)?,
                MediaKind::Audio => list_kind::<Audio>(&library, subtypes, favorites, sort)?,
                MediaKind::LivePhoto => {
                    list_kind::<LivePhoto>(&library, subtypes, favorites, sort)?
                }
            }
        }
    };

    info!(count = rows.len(), "Listed assets");

    if options.json {
        let items: Vec<_> = rows
            .iter()
            .map(|row| {
                json!({
                    "identifier": row.identifier,
                    "kind": row.kind,
                    "metadata": row.metadata,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", "No assets".dimmed());
        return Ok(());
    }

    for row in &rows {
        let star = if row.metadata.is_favorite { "★" } else { " " };
        println!(
            "{} {:<24} {:<11} {}",
            star.yellow(),
            row.identifier,
            row.kind.to_string(),
            format_date(row.metadata.creation_date).dimmed()
        );
    }
    Ok(())
}
