use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::IngestError;
use crate::model::{EquipmentRecord, IngestionRun, SkipReason};
use crate::store::EquipmentStore;
use crate::util::directory_has_entries;

use super::classify::{is_ignorable, is_xml_file};
use super::document::Document;
use super::extract::extract_records;
use super::texture::{TextureConverter, WebpConverter};

/// Walks `source_root` once, staging every extracted equipment record in
/// `store`, and commits them together after the walk.
///
/// A missing source root or a non-empty `staging_dir` turns the run into a
/// no-op. Per-file failures are logged and skipped; only the final commit can
/// fail the run.
pub(crate) fn run_ingestion(
    source_root: &Path,
    staging_dir: &Path,
    store: &mut dyn EquipmentStore,
) -> Result<IngestionRun> {
    let converter = WebpConverter::new(staging_dir);
    run_ingestion_with(source_root, staging_dir, &converter, store)
}

pub(crate) fn run_ingestion_with(
    source_root: &Path,
    staging_dir: &Path,
    textures: &dyn TextureConverter,
    store: &mut dyn EquipmentStore,
) -> Result<IngestionRun> {
    let mut run = IngestionRun::default();

    if !source_root.exists() {
        info!(source_root = %source_root.display(), "game data directory absent; skipping equipment ingest");
        run.skipped = Some(SkipReason::SourceRootAbsent);
        return Ok(run);
    }

    // Presence of converted images is the only marker of a previous run.
    if directory_has_entries(staging_dir)? {
        info!(static_dir = %staging_dir.display(), "equipment already parsed; ignoring database population");
        run.skipped = Some(SkipReason::AlreadyIngested);
        return Ok(run);
    }

    for entry in WalkDir::new(source_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "failed to read directory entry; skipping");
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_xml_file(path) {
            continue;
        }

        let directory = path.parent().unwrap_or(source_root);
        let file_name = entry.file_name().to_string_lossy();

        if is_ignorable(directory, &file_name) {
            debug!(path = %path.display(), "ignoring invalid file");
            run.invalid_count += 1;
            continue;
        }

        debug!(path = %path.display(), "parsing valid file");
        run.valid_count += 1;

        match records_for_file(path, textures) {
            Ok(records) => {
                run.records_registered += records.len();
                for record in records {
                    store.add(record);
                }
            }
            Err(err @ IngestError::MissingStoreData { .. }) => {
                warn!(error = %err, "no equipment record produced");
            }
            Err(err) => {
                warn!(error = %err, "skipping equipment file");
            }
        }
    }

    run.records_committed = match store.commit() {
        Ok(committed) => committed,
        Err(err) => {
            store.rollback();
            return Err(err).context("failed to commit ingested equipment");
        }
    };

    info!(
        valid_files = run.valid_count,
        invalid_files = run.invalid_count,
        records = run.records_committed,
        "equipment ingest completed"
    );

    Ok(run)
}

fn records_for_file(
    path: &Path,
    textures: &dyn TextureConverter,
) -> Result<Vec<EquipmentRecord>, IngestError> {
    let document = Document::open(path)?;
    extract_records(&document, textures)
}
