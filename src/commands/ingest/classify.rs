use std::path::{Component, Path};

const IGNORED_DIRECTORIES: [&str; 2] = ["sounds", "cars"];
const IGNORED_FILE_KEYWORDS: [&str; 3] = ["Bundle", "store", "Light"];

pub(crate) fn is_xml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "xml")
        .unwrap_or(false)
}

// Sound banks, bundles, store-only stubs and light variants either duplicate
// other vehicle files or carry no storeData at all.
pub(crate) fn is_ignorable(directory_path: &Path, file_name: &str) -> bool {
    let ignored_directory = directory_path.components().any(|component| match component {
        Component::Normal(segment) => segment
            .to_str()
            .map(|segment| IGNORED_DIRECTORIES.contains(&segment))
            .unwrap_or(false),
        _ => false,
    });

    ignored_directory
        || IGNORED_FILE_KEYWORDS
            .iter()
            .any(|keyword| file_name.contains(keyword))
}
