//! Example demonstrating the tracing output of fetches, mutations and
//! representation requests.
//!
//! Run with: cargo run -p medialib-core --example library_tracing

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{fmt, EnvFilter};
use medialib_core::{
    AssetHandle, ContentMode, InMemoryStore, LibraryConfig, MediaLibrary, Media, NativeMediaType,
    NativeSubtypes, RepresentationDelivery, SourceType, TargetSize,
};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("medialib_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Media Library Tracing Demo ===\n");

    let store = InMemoryStore::new().with_delivery_interval(Duration::from_millis(100));
    store.insert(AssetHandle::new("beach", NativeMediaType::Image).created_at(Utc::now()));
    store.insert(
        AssetHandle::new("sunset", NativeMediaType::Image)
            .with_subtypes(NativeSubtypes::PHOTO_LIVE)
            .with_source_type(SourceType::CloudShared)
            .created_at(Utc::now()),
    );
    store.script_representation(
        "beach",
        vec![
            RepresentationDelivery::interim(b"blurry".to_vec()),
            RepresentationDelivery::complete(b"sharp beach".to_vec()),
        ],
    );

    let config = LibraryConfig::from_env();
    println!("Config: {:?}\n", config);
    let library = MediaLibrary::with_config(Arc::new(store), config);

    let photos = match library.photos() {
        Ok(photos) => photos,
        Err(e) => {
            eprintln!("Failed to declare photos: {}", e);
            return;
        }
    };
    println!("Photos: {}", photos.len());

    let Some(beach) = photos.first() else {
        eprintln!("No photos in the library");
        return;
    };

    println!("\nMarking {} as favorite...\n", beach.identifier());
    if let Err(e) = library.mutations().favorite(beach, true).await {
        println!("\n❌ Failed: {}", e);
    }

    println!("\nRequesting preview...\n");
    match library
        .display_representation(beach, TargetSize::new(320, 240), ContentMode::AspectFit)
        .await
    {
        Ok(preview) => {
            println!("\n✅ Success!");
            println!("   Fidelity: {:?}", preview.fidelity);
            println!("   Hex:      {}", hex::encode(&preview.payload));
        }
        Err(e) => {
            println!("\n❌ Failed: {}", e);
        }
    }
}
