use tracing::debug;

use crate::error::IngestError;
use crate::model::{ConfigurationVariant, EquipmentRecord};

use super::document::{Document, Element};
use super::extract::{normalize_name, parse_integer};

const CONFIGURATIONS: &str = "motorConfigurations";
const CONFIGURATION: &str = "motorConfiguration";

pub(crate) fn configuration_entries(document: &Document) -> Vec<&Element> {
    let mut containers = Vec::new();
    document.root.find_all(CONFIGURATIONS, &mut containers);

    containers
        .into_iter()
        .flat_map(|container| container.children_named(CONFIGURATION))
        .collect()
}

#[cfg(test)]
pub(crate) fn has_configurations(document: &Document) -> bool {
    !configuration_entries(document).is_empty()
}

pub(crate) fn parse_variant(
    document: &Document,
    entry: &Element,
) -> Result<ConfigurationVariant, IngestError> {
    let price_delta = match entry.attribute("price") {
        Some(raw) if !raw.trim().is_empty() => {
            parse_integer(&document.path, "motorConfiguration@price", raw)?
        }
        _ => 0,
    };
    let power = entry
        .attribute("hp")
        .map(|raw| parse_integer(&document.path, "motorConfiguration@hp", raw))
        .transpose()?;

    Ok(ConfigurationVariant {
        name: entry.attribute("name").map(normalize_name),
        price_delta,
        power,
    })
}

// Either the base record alone, or one record per motor configuration in
// document order. The base record is never stored alongside its variants.
pub(crate) fn expand(
    document: &Document,
    base: EquipmentRecord,
) -> Result<Vec<EquipmentRecord>, IngestError> {
    let entries = configuration_entries(document);
    if entries.is_empty() {
        return Ok(vec![base]);
    }

    debug!(
        path = %document.path.display(),
        vehicle = %base.name,
        variants = entries.len(),
        "expanding motor configurations"
    );

    entries
        .into_iter()
        .map(|entry| {
            let variant = parse_variant(document, entry)?;
            variant
                .apply_to(&base)
                .ok_or_else(|| IngestError::InvalidNumber {
                    path: document.path.clone(),
                    element: "motorConfiguration@price".to_string(),
                    value: variant.price_delta.to_string(),
                })
        })
        .collect()
}
