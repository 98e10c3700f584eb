use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::cli::IngestArgs;
use crate::model::{IngestPaths, IngestRunManifest};
use crate::store::SqliteStore;
use crate::store::schema::count_rows;
use crate::util::{now_utc_string, print_json, utc_compact_string, write_json_pretty};

use super::walk::run_ingestion;

pub fn run(args: IngestArgs, db_path: &Path) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        default_manifest_path(&args.static_dir, &utc_compact_string(started_ts))
    });

    info!(
        game_data = %args.game_data.display(),
        static_dir = %args.static_dir.display(),
        run_id = %run_id,
        "starting equipment ingest"
    );

    let mut store = SqliteStore::open(db_path)?;
    let counts = run_ingestion(&args.game_data, &args.static_dir, &mut store)?;
    let vehicles_total = count_rows(store.connection(), "SELECT COUNT(*) FROM vehicle")?;

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id,
        status: match counts.skipped {
            Some(_) => "skipped".to_string(),
            None => "completed".to_string(),
        },
        started_at,
        updated_at: now_utc_string(),
        paths: IngestPaths {
            source_root: args.game_data.display().to_string(),
            static_dir: args.static_dir.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts: counts.clone(),
        vehicles_total,
    };

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote ingest run manifest");

    print_json(&json!({
        "message": format!(
            "{} Valid XML Files, {} Invalid XML files",
            counts.valid_count, counts.invalid_count
        )
    }))
}

// Next to the staging directory, never inside it: anything in there marks
// the equipment as already ingested.
fn default_manifest_path(static_dir: &Path, stamp: &str) -> PathBuf {
    static_dir
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("manifests")
        .join(format!("ingest_run_{stamp}.json"))
}
