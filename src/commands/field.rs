use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use crate::cli::FieldCommand;
use crate::store::SqliteStore;
use crate::store::fields;
use crate::util::print_json;

pub fn run(command: FieldCommand, db_path: &Path) -> Result<()> {
    let mut store = SqliteStore::open(db_path)?;

    match command {
        FieldCommand::Create { json } => {
            let number = fields::create_field(store.connection_mut(), &parse_body(&json)?)?;
            print_json(&json!({ "message": format!("Field {number} created successfully") }))
        }
        FieldCommand::AddCrop { json } => {
            fields::add_crop(store.connection_mut(), &parse_body(&json)?)?;
            print_json(&json!({ "message": "Crop created successfully" }))
        }
        FieldCommand::Update { number, json } => {
            let outcome = fields::update_field(store.connection_mut(), number, &parse_body(&json)?)?;
            print_json(&json!({
                "message": format!("Field {number} updated successfully."),
                "ignored": outcome.ignored,
            }))
        }
        FieldCommand::List => print_json(&fields::list_fields(store.connection())?),
        FieldCommand::Show { number } => match fields::get_field(store.connection(), number)? {
            Some(field) => print_json(&field),
            None => bail!("Field {number} not found"),
        },
        FieldCommand::Crops { number, tense } => {
            print_json(&fields::crops_by_tense(store.connection(), number, tense)?)
        }
        FieldCommand::Delete { number } => {
            if fields::delete_field(store.connection_mut(), number)? {
                print_json(&json!({ "message": format!("Field {number} has been deleted.") }))
            } else {
                bail!("Field {number} doesn't exist.")
            }
        }
    }
}

fn parse_body(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("request body is not valid JSON")
}
