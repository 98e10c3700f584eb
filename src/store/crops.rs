use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::model::CropEntry;

pub fn crop_exists(connection: &Connection, crop_type: &str) -> Result<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM crop WHERE crop_type = ?1",
            [crop_type],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

// Existing crop types are left untouched; everything new is committed at once.
pub fn insert_missing_crops(connection: &mut Connection, crops: &[CropEntry]) -> Result<usize> {
    let tx = connection.transaction()?;
    let mut inserted = 0;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO crop(crop_type, nitrogen_level, growth_stages, yield_per_ha, seeds_per_ha, price_per_tonne, root_crop)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )?;

        for crop in crops {
            if crop_exists(&tx, &crop.crop_type)? {
                info!(crop = %crop.crop_type, "crop already exists");
                continue;
            }

            statement
                .execute(params![
                    &crop.crop_type,
                    crop.nitrogen_level,
                    crop.growth_stages,
                    crop.yield_per_ha,
                    crop.seeds_per_ha,
                    crop.price_per_tonne,
                    crop.root_crop,
                ])
                .with_context(|| format!("failed to insert crop {}", crop.crop_type))?;
            info!(crop = %crop.crop_type, "added crop");
            inserted += 1;
        }
    }

    tx.commit().context("failed to commit crop catalogue")?;
    Ok(inserted)
}
