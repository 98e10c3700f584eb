use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentRecord {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: i64,
    pub power: Option<i64>,
    pub image_ref: Option<String>,
}

/// An alternate purchasable trim of a base vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationVariant {
    pub name: Option<String>,
    pub price_delta: i64,
    pub power: Option<i64>,
}

impl ConfigurationVariant {
    // `None` when the price delta does not fit on top of the base price.
    pub fn apply_to(&self, base: &EquipmentRecord) -> Option<EquipmentRecord> {
        Some(EquipmentRecord {
            name: self.name.clone().unwrap_or_else(|| base.name.clone()),
            brand: base.brand.clone(),
            category: base.category.clone(),
            price: base.price.checked_add(self.price_delta)?,
            power: self.power.or(base.power),
            image_ref: base.image_ref.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    SourceRootAbsent,
    AlreadyIngested,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionRun {
    pub valid_count: usize,
    pub invalid_count: usize,
    pub records_registered: usize,
    pub records_committed: usize,
    pub skipped: Option<SkipReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestPaths {
    pub source_root: String,
    pub static_dir: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub paths: IngestPaths,
    pub counts: IngestionRun,
    pub vehicles_total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredVehicle {
    pub id: i64,
    pub model: String,
    pub brand: String,
    pub category: String,
    pub img_url: Option<String>,
    pub price: i64,
    pub power: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CropEntry {
    #[serde(rename = "type")]
    pub crop_type: String,
    #[serde(rename = "nitrogenLevel")]
    pub nitrogen_level: i64,
    #[serde(rename = "growthStages")]
    pub growth_stages: i64,
    #[serde(rename = "yieldPerHa")]
    pub yield_per_ha: i64,
    #[serde(rename = "seedsPerHa")]
    pub seeds_per_ha: i64,
    #[serde(rename = "price")]
    pub price_per_tonne: f64,
    #[serde(rename = "rootCrop", default)]
    pub root_crop: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CropCatalogue {
    pub crops: Vec<CropEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthTense {
    Past,
    Present,
    Future,
}

impl GrowthTense {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Past => "past",
            Self::Present => "present",
            Self::Future => "future",
        }
    }
}

impl fmt::Display for GrowthTense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrowthTense {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "past" => Ok(Self::Past),
            "present" => Ok(Self::Present),
            "future" => Ok(Self::Future),
            other => Err(format!("unknown growth tense: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Field {
    pub number: i64,
    pub ground_type: Option<String>,
    pub soil_type: Option<String>,
    pub nitrogen_level: Option<i64>,
    pub ph_level: Option<f64>,
    pub plowed: Option<bool>,
    pub rolled: Option<bool>,
    pub weeded: Option<bool>,
    pub mulched: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldCropView {
    #[serde(rename = "type")]
    pub crop_type: String,
    pub growth_stage: i64,
    pub growth_tense: GrowthTense,
    pub field_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub number: i64,
    pub ground_type: Option<String>,
    pub soil_type: Option<String>,
    pub nitrogen_level: Option<i64>,
    pub ph_level: Option<f64>,
    pub plowed: Option<bool>,
    pub rolled: Option<bool>,
    pub mulched: Option<bool>,
    pub crops: Vec<FieldCropView>,
}
