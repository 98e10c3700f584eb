use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, warn};

use crate::cli::CropsCommand;
use crate::model::CropCatalogue;
use crate::store::SqliteStore;
use crate::store::crops::insert_missing_crops;
use crate::util::print_json;

pub fn run(command: CropsCommand, db_path: &Path) -> Result<()> {
    match command {
        CropsCommand::Load { crops_file } => {
            let inserted = load_crops(&crops_file, db_path)?;
            print_json(&json!({ "message": format!("{inserted} crops added") }))
        }
    }
}

pub fn load_crops(crops_file: &Path, db_path: &Path) -> Result<usize> {
    if !crops_file.exists() {
        warn!(path = %crops_file.display(), "crop catalogue does not exist");
        return Ok(0);
    }

    let raw = fs::read(crops_file)
        .with_context(|| format!("failed to read {}", crops_file.display()))?;
    let catalogue: CropCatalogue = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", crops_file.display()))?;

    let mut store = SqliteStore::open(db_path)?;
    let inserted = insert_missing_crops(store.connection_mut(), &catalogue.crops)?;

    info!(
        path = %crops_file.display(),
        catalogue = catalogue.crops.len(),
        inserted,
        "all crops added"
    );
    Ok(inserted)
}
