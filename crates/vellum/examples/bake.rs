//! Example walking one asset through its whole lifecycle.
//!
//! This example shows how to:
//! - Register an asset type and its attributes
//! - Create an asset whose compile step writes derived data
//! - Reload it and read the compiled blob without copying
//! - Delete it and watch the events the system records
//!
//! Run with: cargo run -p vellum --example bake

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use vellum::prelude::*;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TextSource {
    text: String,
}

impl Attribute for TextSource {
    const TYPE_NAME: &'static str = "TextSource";
}

/// Compiles its text into an upper-cased blob.
#[derive(Default)]
struct Shout {
    length: AtomicUsize,
}

fn shout_key(path: ResourcePath) -> DerivedDataKey {
    DerivedDataKey::derive("example.shout", path.as_str())
}

impl AssetBehavior for Shout {
    fn compile(&self, asset: &AssetInstance, system: &AssetsSystem) -> AssetResult<()> {
        let text = asset.attributes().get::<TextSource>().text.to_uppercase();
        system
            .cache()
            .create_derived_data(shout_key(asset.path()), text.as_bytes())?;
        println!("Compiled {} ({} bytes)", asset.path(), text.len());
        Ok(())
    }

    fn derived_data_keys(&self, asset: &AssetInstance) -> Vec<DerivedDataKey> {
        vec![shout_key(asset.path())]
    }

    fn on_initialize(&self, asset: &AssetInstance, system: &AssetsSystem) -> AssetResult<()> {
        if let Some(blob) = system
            .cache()
            .get_resource_handle(shout_key(asset.path()), MapOptions::default())?
        {
            self.length.store(blob.len(), Ordering::Release);
        }
        Ok(())
    }
}

impl AssetType for Shout {
    const TYPE_NAME: &'static str = "Shout";

    fn construct(_system: &AssetsSystem, _definition: &InstanceDefinition) -> AssetResult<Self> {
        Ok(Shout::default())
    }

    fn on_deleted(system: &AssetsSystem, path: ResourcePath, _data: &vellum::assets::AssetInstanceData) {
        if let Err(e) = system.cache().delete_derived_data(shout_key(path)) {
            eprintln!("Failed to remove derived data of {}: {}", path, e);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    vellum::init();

    let project = tempfile::tempdir()?;
    let system = AssetsSystem::builder(AssetsConfig::in_directory(project.path()))
        .with_asset_type::<Shout>()
        .with_attribute::<TextSource>()
        .build()?;

    println!("=== Create ===\n");
    let created = system
        .create_asset(
            CreateAssetInfo::of::<Shout>("Greetings/Hello.asset").with_initializer(|attributes| {
                attributes.create(TextSource {
                    text: "hello, derived data".to_string(),
                });
            }),
        )?;
    created.await_initialization();
    let path = created.path();
    drop(created);

    println!("\n=== Reload ===\n");
    let handle = system.load_and_init_asset(path)?;
    if let Some(blob) = system
        .cache()
        .get_resource_handle(shout_key(path), MapOptions::default())?
    {
        println!(
            "Blob: {}",
            String::from_utf8_lossy(blob.immutable_span())
        );
    }
    if let Some(shout) = handle.behavior_as::<Shout>() {
        println!("Initialized with {} bytes", shout.length.load(Ordering::Acquire));
    }

    println!("\n=== Delete ===\n");
    let result = system.delete_asset(path)?;
    println!("Delete: {:?}, still loaded: {}", result, system.is_asset_loaded(path));
    drop(handle);

    for event in system.drain_events() {
        println!("{:?}", event);
    }
    Ok(())
}
