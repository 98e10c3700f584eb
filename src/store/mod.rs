use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::model::{EquipmentRecord, StoredVehicle};

pub mod crops;
pub mod fields;
pub mod schema;


/// Unit-of-work access to equipment rows.
///
/// `add` only stages a record; nothing reaches the database until `commit`,
/// which writes every staged record in one transaction. `rollback` drops
/// whatever is staged.
pub trait EquipmentStore {
    fn add(&mut self, record: EquipmentRecord);
    fn commit(&mut self) -> Result<usize>;
    fn rollback(&mut self) -> usize;
    fn query_all(&self) -> Result<Vec<StoredVehicle>>;
    fn query_by_key(&self, id: i64) -> Result<Option<StoredVehicle>>;
    fn delete(&mut self, id: i64) -> Result<bool>;
}

pub struct SqliteStore {
    connection: Connection,
    pending: Vec<EquipmentRecord>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        Self::from_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory().context("failed to open in-memory db")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        schema::configure_connection(&connection)?;
        schema::ensure_schema(&connection)?;
        Ok(Self {
            connection,
            pending: Vec::new(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl EquipmentStore for SqliteStore {
    fn add(&mut self, record: EquipmentRecord) {
        self.pending.push(record);
    }

    fn commit(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            debug!("nothing staged; commit is a no-op");
            return Ok(0);
        }

        let tx = self
            .connection
            .transaction()
            .context("failed to open equipment transaction")?;

        {
            let mut statement = tx.prepare(
                "
                INSERT INTO vehicle(model, brand, category, img_url, price, power)
                VALUES(?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )?;

            for record in &self.pending {
                statement
                    .execute(params![
                        &record.name,
                        &record.brand,
                        &record.category,
                        &record.image_ref,
                        record.price,
                        record.power,
                    ])
                    .with_context(|| format!("failed to insert vehicle {}", record.name))?;
            }
        }

        tx.commit().context("failed to commit equipment transaction")?;

        let committed = self.pending.len();
        self.pending.clear();
        info!(vehicles = committed, "committed equipment records");
        Ok(committed)
    }

    fn rollback(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        if discarded > 0 {
            info!(vehicles = discarded, "discarded staged equipment records");
        }
        discarded
    }

    fn query_all(&self) -> Result<Vec<StoredVehicle>> {
        let mut statement = self.connection.prepare(
            "
            SELECT id, model, brand, category, img_url, price, power
            FROM vehicle
            ORDER BY id ASC
            ",
        )?;

        let vehicles = statement
            .query_map([], vehicle_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    fn query_by_key(&self, id: i64) -> Result<Option<StoredVehicle>> {
        let vehicle = self
            .connection
            .query_row(
                "
                SELECT id, model, brand, category, img_url, price, power
                FROM vehicle
                WHERE id = ?1
                ",
                [id],
                vehicle_from_row,
            )
            .optional()?;
        Ok(vehicle)
    }

    fn delete(&mut self, id: i64) -> Result<bool> {
        let removed = self
            .connection
            .execute("DELETE FROM vehicle WHERE id = ?1", [id])
            .with_context(|| format!("failed to delete vehicle {id}"))?;
        Ok(removed > 0)
    }
}

fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<StoredVehicle> {
    Ok(StoredVehicle {
        id: row.get(0)?,
        model: row.get(1)?,
        brand: row.get(2)?,
        category: row.get(3)?,
        img_url: row.get(4)?,
        price: row.get(5)?,
        power: row.get(6)?,
    })
}
