use std::path::{Path, PathBuf};

use crate::error::IngestError;
use crate::model::EquipmentRecord;

use super::document::{Document, Element};
use super::texture::{TEXTURE_EXTENSION, TextureConverter};
use super::variants::expand;

const STORE_DATA: &str = "storeData";
const DEFAULT_LANGUAGE: &str = "en";

const PUNCTUATION_REPLACEMENTS: [(char, char); 5] = [
    ('\u{2010}', '-'),
    ('\u{2011}', '-'),
    ('\u{2013}', '-'),
    ('\u{00a0}', ' '),
    ('\u{2019}', '\''),
];

pub(crate) fn normalize_name(value: &str) -> String {
    value
        .chars()
        .map(|character| {
            PUNCTUATION_REPLACEMENTS
                .iter()
                .find(|(from, _)| *from == character)
                .map(|(_, to)| *to)
                .unwrap_or(character)
        })
        .collect()
}

pub(crate) fn store_data(document: &Document) -> Result<&Element, IngestError> {
    document
        .root
        .find_first(STORE_DATA)
        .ok_or_else(|| IngestError::MissingStoreData {
            path: document.path.clone(),
        })
}

// Every store field except the image, which is only resolved once the whole
// file is known to produce records.
pub(crate) fn extract_record(document: &Document) -> Result<EquipmentRecord, IngestError> {
    let store_data = store_data(document)?;

    let name = localized_text(store_data, "name")
        .map(|name| normalize_name(&name))
        .ok_or_else(|| missing_field(document, "name"))?;
    let brand = required_text(document, store_data, "brand")?;
    let category = required_text(document, store_data, "category")?;
    let power = resolve_power(document, store_data)?;
    let price = match store_data.child("price") {
        Some(element) => parse_integer(&document.path, "price", &element.text)?,
        None => 0,
    };

    Ok(EquipmentRecord {
        name,
        brand,
        category,
        price,
        power,
        image_ref: None,
    })
}

pub(crate) fn store_texture(document: &Document) -> Option<PathBuf> {
    let reference = store_data(document).ok()?.child("image")?.trimmed_text()?;
    texture_path(document.directory(), reference)
}

// Conversion writes into the staging directory, so it runs last: a file that
// fails to extract or expand leaves nothing behind.
pub(crate) fn extract_records(
    document: &Document,
    textures: &dyn TextureConverter,
) -> Result<Vec<EquipmentRecord>, IngestError> {
    let base = extract_record(document)?;
    let mut records = expand(document, base)?;

    let image_ref = store_texture(document).and_then(|texture| textures.convert(&texture));
    for record in &mut records {
        record.image_ref.clone_from(&image_ref);
    }
    Ok(records)
}

// Vehicles declare their own power; towed implements declare what they need
// from the tractor pulling them.
pub(crate) fn resolve_power(
    document: &Document,
    store_data: &Element,
) -> Result<Option<i64>, IngestError> {
    if let Some(power) = store_data.path(&["specs", "power"]) {
        return parse_integer(&document.path, "specs/power", &power.text).map(Some);
    }

    if let Some(needed) = store_data.path(&["specs", "neededPower"]) {
        return parse_integer(&document.path, "specs/neededPower", &needed.text).map(Some);
    }

    Ok(None)
}

pub(crate) fn parse_integer(path: &Path, element: &str, raw: &str) -> Result<i64, IngestError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| IngestError::InvalidNumber {
            path: path.to_path_buf(),
            element: element.to_string(),
            value: raw.to_string(),
        })
}

// Store images are referenced as `$data/.../store_x.png`; the shipped texture
// sits next to the xml with the same stem.
fn texture_path(document_dir: &Path, reference: &str) -> Option<PathBuf> {
    let file_name = reference.rsplit(['/', '\\']).next()?;
    if file_name.is_empty() {
        return None;
    }
    Some(document_dir.join(Path::new(file_name).with_extension(TEXTURE_EXTENSION)))
}

// The text is kept verbatim, surrounding whitespace included.
fn localized_text(store_data: &Element, name: &str) -> Option<String> {
    let element = store_data.child(name)?;
    let localized = match element.trimmed_text() {
        Some(_) => element,
        None => element
            .child(DEFAULT_LANGUAGE)
            .filter(|english| english.trimmed_text().is_some())?,
    };
    Some(localized.text.clone())
}

fn required_text(
    document: &Document,
    store_data: &Element,
    name: &'static str,
) -> Result<String, IngestError> {
    store_data
        .child(name)
        .and_then(Element::trimmed_text)
        .map(ToOwned::to_owned)
        .ok_or_else(|| missing_field(document, name))
}

fn missing_field(document: &Document, element: &'static str) -> IngestError {
    IngestError::MissingField {
        path: document.path.clone(),
        element,
    }
}
