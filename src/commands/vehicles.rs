use std::path::Path;

use anyhow::{Result, bail};
use serde_json::json;
use tracing::info;

use crate::cli::VehiclesArgs;
use crate::store::{EquipmentStore, SqliteStore};
use crate::util::print_json;

pub fn run(args: VehiclesArgs, db_path: &Path) -> Result<()> {
    let mut store = SqliteStore::open(db_path)?;

    match (args.id, args.delete) {
        (Some(id), true) => {
            if !store.delete(id)? {
                bail!("vehicle {id} does not exist");
            }
            info!(id, "vehicle deleted");
            print_json(&json!({ "message": format!("Vehicle {id} has been deleted.") }))
        }
        (Some(id), false) => match store.query_by_key(id)? {
            Some(vehicle) => print_json(&vehicle),
            None => bail!("vehicle {id} does not exist"),
        },
        (None, _) => {
            let vehicles = store.query_all()?;
            info!(vehicles = vehicles.len(), "listing vehicles");
            print_json(&vehicles)
        }
    }
}
