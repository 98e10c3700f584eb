use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::FieldError;
use crate::model::{Field, FieldCropView, FieldView, GrowthTense};

const REQUIRED_ATTRIBUTES: [&str; 9] = [
    "field_number",
    "ground_type",
    "soil_type",
    "nitrogen_level",
    "ph_level",
    "plowed",
    "rolled",
    "weeded",
    "mulched",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub applied: Vec<String>,
    pub ignored: Vec<String>,
}

pub fn parse_new_field(body: &Value) -> Result<Field, FieldError> {
    let object = as_object(body)?;

    if !REQUIRED_ATTRIBUTES.iter().all(|key| object.contains_key(*key)) {
        return Err(FieldError::Validation(
            "Missing required JSON fields.".to_string(),
        ));
    }

    let empty: Vec<&str> = REQUIRED_ATTRIBUTES
        .iter()
        .copied()
        .filter(|key| match object.get(*key) {
            Some(Value::Null) | None => true,
            Some(Value::String(text)) => text.is_empty(),
            Some(_) => false,
        })
        .collect();
    if !empty.is_empty() {
        return Err(FieldError::Validation(format!(
            "The following values are empty: {}.",
            empty.join(", ")
        )));
    }

    let number = integer_value("field_number", &object["field_number"])?
        .ok_or_else(|| FieldError::Validation("field_number must be an integer".to_string()))?;

    let mut field = Field {
        number,
        ..Field::default()
    };
    apply_patch(&mut field, object)?;
    Ok(field)
}

/// Applies the allow-listed subset of `body` to `field`. Keys outside the
/// allow-list (including `number` and `id`) are reported back and otherwise
/// ignored.
pub fn apply_patch(field: &mut Field, body: &Map<String, Value>) -> Result<PatchOutcome, FieldError> {
    let mut outcome = PatchOutcome::default();

    for (key, value) in body {
        match key.as_str() {
            "ground_type" => field.ground_type = string_value(key, value)?,
            "soil_type" => field.soil_type = string_value(key, value)?,
            "nitrogen_level" => field.nitrogen_level = integer_value(key, value)?,
            "ph_level" => field.ph_level = float_value(key, value)?,
            "plowed" => field.plowed = bool_value(key, value)?,
            "rolled" => field.rolled = bool_value(key, value)?,
            "weeded" => field.weeded = bool_value(key, value)?,
            "mulched" => field.mulched = bool_value(key, value)?,
            _ => {
                outcome.ignored.push(key.clone());
                continue;
            }
        }
        outcome.applied.push(key.clone());
    }

    Ok(outcome)
}

pub fn create_field(connection: &mut Connection, body: &Value) -> Result<i64, FieldError> {
    let field = parse_new_field(body)?;
    let tx = connection.transaction()?;

    let inserted = tx.execute(
        "
        INSERT INTO field(number, ground_type, soil_type, nitrogen_level, ph_level, plowed, rolled, weeded, mulched)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ",
        params![
            field.number,
            field.ground_type,
            field.soil_type,
            field.nitrogen_level,
            field.ph_level,
            field.plowed,
            field.rolled,
            field.weeded,
            field.mulched,
        ],
    );

    // Dropping `tx` without commit rolls the unit of work back.
    match inserted {
        Ok(_) => {
            tx.commit()?;
            info!(field = field.number, "field created");
            Ok(field.number)
        }
        Err(err) if is_constraint_violation(&err) => Err(FieldError::IntegrityConflict(format!(
            "Field {} already exists.",
            field.number
        ))),
        Err(err) => Err(err.into()),
    }
}

pub fn update_field(
    connection: &mut Connection,
    number: i64,
    body: &Value,
) -> Result<PatchOutcome, FieldError> {
    let object = as_object(body)?;
    let mut field = load_field(connection, number)?
        .ok_or_else(|| FieldError::NotFound(format!("Field with ID {number} not found.")))?;

    let outcome = apply_patch(&mut field, object)?;
    if !outcome.ignored.is_empty() {
        debug!(field = number, ignored = ?outcome.ignored, "ignored non-updatable keys");
    }

    let tx = connection.transaction()?;
    let updated = tx.execute(
        "
        UPDATE field SET
          ground_type = ?2,
          soil_type = ?3,
          nitrogen_level = ?4,
          ph_level = ?5,
          plowed = ?6,
          rolled = ?7,
          weeded = ?8,
          mulched = ?9
        WHERE number = ?1
        ",
        params![
            field.number,
            field.ground_type,
            field.soil_type,
            field.nitrogen_level,
            field.ph_level,
            field.plowed,
            field.rolled,
            field.weeded,
            field.mulched,
        ],
    );

    match updated {
        Ok(_) => {
            tx.commit()?;
            info!(field = number, applied = ?outcome.applied, "field updated");
            Ok(outcome)
        }
        Err(err) if is_constraint_violation(&err) => Err(FieldError::IntegrityConflict(format!(
            "Failed to update field {number}."
        ))),
        Err(err) => Err(err.into()),
    }
}

pub fn add_crop(connection: &mut Connection, body: &Value) -> Result<(), FieldError> {
    let object = as_object(body)?;
    let number = integer_value("field_number", object.get("field_number").unwrap_or(&Value::Null))?
        .ok_or_else(|| FieldError::Validation("field_number is required".to_string()))?;
    let crop_type = string_value("type", object.get("type").unwrap_or(&Value::Null))?
        .ok_or_else(|| FieldError::Validation("type is required".to_string()))?;
    let growth_stage =
        integer_value("growth_stage", object.get("growth_stage").unwrap_or(&Value::Null))?
            .unwrap_or(1);
    let growth_tense = string_value(
        "growth_tense",
        object.get("growth_tense").unwrap_or(&Value::Null),
    )?
    .ok_or_else(|| FieldError::Validation("growth_tense is required".to_string()))?
    .parse::<GrowthTense>()
    .map_err(FieldError::Validation)?;

    if load_field(connection, number)?.is_none() {
        return Err(FieldError::NotFound(format!(
            "No field created for field {number}"
        )));
    }

    let tx = connection.transaction()?;
    let inserted = tx.execute(
        "
        INSERT INTO field_crop(type, growth_stage, growth_tense, field_id)
        VALUES(?1, ?2, ?3, ?4)
        ",
        params![crop_type, growth_stage, growth_tense.as_str(), number],
    );

    match inserted {
        Ok(_) => {
            tx.commit()?;
            info!(field = number, crop = %crop_type, tense = %growth_tense, "crop created");
            Ok(())
        }
        Err(err) if is_constraint_violation(&err) => Err(FieldError::IntegrityConflict(format!(
            "Unknown crop type {crop_type}."
        ))),
        Err(err) => Err(err.into()),
    }
}

pub fn load_field(connection: &Connection, number: i64) -> Result<Option<Field>, FieldError> {
    let field = connection
        .query_row(
            "
            SELECT number, ground_type, soil_type, nitrogen_level, ph_level, plowed, rolled, weeded, mulched
            FROM field
            WHERE number = ?1
            ",
            [number],
            field_from_row,
        )
        .optional()?;
    Ok(field)
}

pub fn get_field(connection: &Connection, number: i64) -> Result<Option<FieldView>, FieldError> {
    match load_field(connection, number)? {
        Some(field) => Ok(Some(field_view(connection, field)?)),
        None => Ok(None),
    }
}

pub fn list_fields(connection: &Connection) -> Result<Vec<FieldView>, FieldError> {
    let mut statement = connection.prepare(
        "
        SELECT number, ground_type, soil_type, nitrogen_level, ph_level, plowed, rolled, weeded, mulched
        FROM field
        ORDER BY number ASC
        ",
    )?;
    let fields = statement
        .query_map([], field_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    fields
        .into_iter()
        .map(|field| field_view(connection, field))
        .collect()
}

pub fn crops_by_tense(
    connection: &Connection,
    number: i64,
    tense: GrowthTense,
) -> Result<Vec<FieldCropView>, FieldError> {
    Ok(field_crops(connection, number)?
        .into_iter()
        .filter(|crop| crop.growth_tense == tense)
        .collect())
}

pub fn delete_field(connection: &mut Connection, number: i64) -> Result<bool, FieldError> {
    if load_field(connection, number)?.is_none() {
        return Ok(false);
    }

    let tx = connection.transaction()?;
    let crops = tx.execute("DELETE FROM field_crop WHERE field_id = ?1", [number])?;
    tx.execute("DELETE FROM field WHERE number = ?1", [number])?;
    tx.commit()?;

    info!(field = number, crops, "field deleted");
    Ok(true)
}

fn field_view(connection: &Connection, field: Field) -> Result<FieldView, FieldError> {
    let crops = field_crops(connection, field.number)?;
    Ok(FieldView {
        number: field.number,
        ground_type: field.ground_type,
        soil_type: field.soil_type,
        nitrogen_level: field.nitrogen_level,
        ph_level: field.ph_level,
        plowed: field.plowed,
        rolled: field.rolled,
        mulched: field.mulched,
        crops,
    })
}

fn field_crops(connection: &Connection, number: i64) -> Result<Vec<FieldCropView>, FieldError> {
    let mut statement = connection.prepare(
        "
        SELECT type, growth_stage, growth_tense, field_id
        FROM field_crop
        WHERE field_id = ?1
        ORDER BY id ASC
        ",
    )?;

    let mut rows = statement.query([number])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let tense: String = row.get(2)?;
        out.push(FieldCropView {
            crop_type: row.get(0)?,
            growth_stage: row.get(1)?,
            growth_tense: tense.parse().map_err(FieldError::Validation)?,
            field_id: row.get(3)?,
        });
    }

    Ok(out)
}

fn field_from_row(row: &Row<'_>) -> rusqlite::Result<Field> {
    Ok(Field {
        number: row.get(0)?,
        ground_type: row.get(1)?,
        soil_type: row.get(2)?,
        nitrogen_level: row.get(3)?,
        ph_level: row.get(4)?,
        plowed: row.get(5)?,
        rolled: row.get(6)?,
        weeded: row.get(7)?,
        mulched: row.get(8)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, FieldError> {
    body.as_object()
        .ok_or_else(|| FieldError::Validation("request body must be a JSON object".to_string()))
}

fn string_value(key: &str, value: &Value) -> Result<Option<String>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        _ => Err(type_error(key, "a string")),
    }
}

fn integer_value(key: &str, value: &Value) -> Result<Option<i64>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number.as_i64().map(Some).ok_or_else(|| type_error(key, "an integer")),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| type_error(key, "an integer")),
        _ => Err(type_error(key, "an integer")),
    }
}

fn float_value(key: &str, value: &Value) -> Result<Option<f64>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number.as_f64().map(Some).ok_or_else(|| type_error(key, "a number")),
        _ => Err(type_error(key, "a number")),
    }
}

fn bool_value(key: &str, value: &Value) -> Result<Option<bool>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(*flag)),
        _ => Err(type_error(key, "a boolean")),
    }
}

fn type_error(key: &str, expected: &str) -> FieldError {
    FieldError::Validation(format!("{key} must be {expected}"))
}
