use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::GrowthTense;

pub const DEFAULT_GAME_DATA: &str =
    r"C:\Program Files (x86)\Steam\steamapps\common\Farming Simulator 22\data\vehicles";

#[derive(Parser, Debug)]
#[command(
    name = "farmhand",
    version,
    about = "Field, crop and equipment tracking for Farming Simulator saves"
)]
pub struct Cli {
    #[arg(long, global = true, env = "FARMHAND_DB_PATH", default_value = "farmhand.sqlite")]
    pub db_path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Ingest(IngestArgs),
    Vehicles(VehiclesArgs),
    #[command(subcommand)]
    Crops(CropsCommand),
    #[command(subcommand)]
    Field(FieldCommand),
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, env = "FARMHAND_GAME_DATA", default_value = DEFAULT_GAME_DATA)]
    pub game_data: PathBuf,

    #[arg(long, env = "FARMHAND_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct VehiclesArgs {
    #[arg(long)]
    pub id: Option<i64>,

    #[arg(long, requires = "id")]
    pub delete: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CropsCommand {
    Load {
        #[arg(long, env = "FARMHAND_CROPS_FILE", default_value = "app/crops.json")]
        crops_file: PathBuf,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum FieldCommand {
    Create {
        #[arg(long)]
        json: String,
    },
    AddCrop {
        #[arg(long)]
        json: String,
    },
    Update {
        number: i64,

        #[arg(long)]
        json: String,
    },
    List,
    Show {
        number: i64,
    },
    Crops {
        number: i64,

        #[arg(long)]
        tense: GrowthTense,
    },
    Delete {
        number: i64,
    },
}
